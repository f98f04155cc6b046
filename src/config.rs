use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::pipeline::{Gate, ToolsConfig, UnitOptions};

/// Prefix of environment overrides, e.g. `LECTURE_CUTTER__DOWNLOADS__MAX_PARALLEL=2`
pub const ENV_PREFIX: &str = "LECTURE_CUTTER";

/// Name of the scratch folder created in the system temp dir
pub const DEFAULT_SCRATCH_DIR_NAME: &str = "lecture-cutter";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub downloads: DownloadsConfig,
    pub tools: ToolsConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Finished videos land in `<output_folder>/<subject>/`
    pub output_folder: Option<String>,
    /// Scratch space for raw downloads
    pub temp_dir: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DownloadsConfig {
    /// Units downloading or cutting at the same time
    pub max_parallel: usize,
    pub keep_original: bool,
    pub jump_cut: bool,
}

impl Default for DownloadsConfig {
    fn default() -> Self {
        let options = UnitOptions::default();
        Self {
            max_parallel: Gate::DEFAULT_CAPACITY,
            keep_original: options.keep_original,
            jump_cut: options.jump_cut,
        }
    }
}

/// Values given on the command line; they win over file and environment
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub output_folder: Option<PathBuf>,
    pub temp_dir: Option<PathBuf>,
    pub max_parallel: Option<usize>,
    pub keep_original: bool,
    pub no_jump_cut: bool,
}

/// Fully resolved and validated settings for one run
#[derive(Debug, Clone)]
pub struct Settings {
    pub output_folder: PathBuf,
    pub temp_dir: PathBuf,
    pub max_parallel: usize,
    pub options: UnitOptions,
    pub tools: ToolsConfig,
}

impl Config {
    /// Load from an optional config file (TOML, YAML or JSON, by
    /// extension) and `LECTURE_CUTTER__*` environment variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            if !path.is_file() {
                bail!("Config file does not exist: {}", path.display());
            }
            builder = builder.add_source(config::File::from(path));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to load configuration")?;

        Ok(settings.try_deserialize()?)
    }

    /// Merge command-line overrides and check every path
    pub fn resolve(self, overrides: Overrides) -> Result<Settings> {
        let output_folder = match overrides.output_folder {
            Some(path) => path,
            None => match &self.paths.output_folder {
                Some(raw) => expand_path(raw)?,
                None => bail!("No output folder given (use --output-folder or paths.output_folder)"),
            },
        };
        if !output_folder.is_dir() {
            bail!("The supplied output folder is invalid: {}", output_folder.display());
        }

        let temp_dir = match overrides.temp_dir {
            Some(path) => Some(path),
            None => self.paths.temp_dir.as_deref().map(expand_path).transpose()?,
        };
        let temp_dir = match temp_dir {
            Some(path) => {
                if !path.is_dir() {
                    bail!("The supplied temp dir is invalid: {}", path.display());
                }
                path
            }
            None => {
                let path = std::env::temp_dir().join(DEFAULT_SCRATCH_DIR_NAME);
                fs::create_dir_all(&path).with_context(|| {
                    format!("Failed to create temp dir: {}", path.display())
                })?;
                path
            }
        };

        let max_parallel = overrides.max_parallel.unwrap_or(self.downloads.max_parallel);
        if max_parallel == 0 {
            bail!("Maximum parallel downloads must be at least 1");
        }

        let options = UnitOptions {
            keep_original: overrides.keep_original || self.downloads.keep_original,
            jump_cut: !overrides.no_jump_cut && self.downloads.jump_cut,
        };

        info!(
            "Output: {}, scratch: {}, parallel: {}, keep original: {}, jump cut: {}",
            output_folder.display(),
            temp_dir.display(),
            max_parallel,
            options.keep_original,
            options.jump_cut
        );

        Ok(Settings {
            output_folder,
            temp_dir,
            max_parallel,
            options,
            tools: self.tools,
        })
    }
}

/// Expand `~` and `$VAR` in a configured path
pub fn expand_path(raw: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(raw)
        .with_context(|| format!("Failed to expand path: {}", raw))?;
    Ok(PathBuf::from(expanded.as_ref()))
}
