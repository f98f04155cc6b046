use std::ffi::OsString;
use std::path::{Path, PathBuf};

use super::sanitize::{jump_cut_name, sanitize};

/// Suffix of the claim marker next to an output file
pub const CLAIM_SUFFIX: &str = ".lock";

/// Suffix of the raw download in the scratch directory
pub const TEMPORARY_SUFFIX: &str = ".original";

/// Every path derived from one display name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    /// Sanitized file name, e.g. `Lecture_1__Intro.mp4`
    pub file_name: String,
    /// `<output_dir>/<file_name>`
    pub output_path: PathBuf,
    /// `<output_dir>/<stem>_jc.mp4`, used when the original is kept as well
    pub jump_cut_path: PathBuf,
    /// `<output_path>.lock`
    pub claim_path: PathBuf,
    /// `<scratch_dir>/<file_name>.original`
    pub temporary_path: PathBuf,
}

impl OutputTarget {
    pub fn new(display_name: &str, output_dir: &Path, scratch_dir: &Path) -> Self {
        let file_name = sanitize(display_name);
        let output_path = output_dir.join(&file_name);
        let jump_cut_path = output_dir.join(jump_cut_name(&file_name));
        let claim_path = with_suffix(&output_path, CLAIM_SUFFIX);
        let temporary_path = scratch_dir.join(format!("{}{}", file_name, TEMPORARY_SUFFIX));

        Self {
            file_name,
            output_path,
            jump_cut_path,
            claim_path,
            temporary_path,
        }
    }

    /// Where the transcode writes: the jump-cut variant when the verbatim
    /// original also lands in the output folder, the output path otherwise
    pub fn cut_path(&self, keep_original: bool) -> &Path {
        if keep_original {
            &self.jump_cut_path
        } else {
            &self.output_path
        }
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut raw: OsString = path.as_os_str().to_owned();
    raw.push(suffix);
    PathBuf::from(raw)
}
