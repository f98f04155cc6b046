use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::target::OutputTarget;

/// Decides whether a target may be worked on, using `.lock` files next to
/// the outputs as a mutex shared with every other instance on the same
/// output folder.
///
/// A lock file can also be created by hand to keep a video from being
/// downloaded at all.
#[derive(Debug, Clone, Copy)]
pub struct ClaimManager {
    /// Also treat an existing `_jc` output as finished
    check_jump_cut: bool,
}

impl ClaimManager {
    pub fn new(check_jump_cut: bool) -> Self {
        Self { check_jump_cut }
    }

    /// Claim `target` for this process.
    ///
    /// Returns `Ok(None)` without touching the filesystem if a claim, the
    /// output, or (when enabled) the jump-cut output already exists. The
    /// claim file itself is created with `O_CREAT | O_EXCL`, so two callers
    /// racing past the existence checks still cannot both win.
    pub fn try_claim(&self, target: &OutputTarget) -> io::Result<Option<Claim>> {
        if target.claim_path.exists() {
            debug!("Already claimed: {}", target.claim_path.display());
            return Ok(None);
        }
        if target.output_path.exists()
            || (self.check_jump_cut && target.jump_cut_path.exists())
        {
            debug!("Already finished: {}", target.output_path.display());
            return Ok(None);
        }

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target.claim_path)
        {
            Ok(_) => Ok(Some(Claim {
                path: target.claim_path.clone(),
                released: false,
            })),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!("Lost claim race: {}", target.claim_path.display());
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// Ownership of one target, backed by its lock file.
///
/// Released explicitly with [`Claim::release`]; a claim dropped without
/// being released removes its lock file on drop.
#[derive(Debug)]
pub struct Claim {
    path: PathBuf,
    released: bool,
}

impl Claim {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the lock file.
    ///
    /// A lock file that is already gone (removed by an operator) is not an
    /// error.
    pub fn release(mut self) -> io::Result<()> {
        self.released = true;
        remove_lock(&self.path)
    }
}

impl Drop for Claim {
    fn drop(&mut self) {
        if !self.released {
            if let Err(e) = remove_lock(&self.path) {
                warn!("Failed to remove lock file {} on drop: {}", self.path.display(), e);
            }
        }
    }
}

fn remove_lock(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("Lock file vanished before release: {}", path.display());
            Ok(())
        }
        Err(e) => Err(e),
    }
}
