use async_trait::async_trait;
use serde::Deserialize;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::debug;

/// Result of one external tool run, with both output streams captured
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// Whether the process exited with status zero
    pub success: bool,
    /// Exit code, `None` if the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn from_output(output: Output) -> Self {
        Self {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// The two heavyweight operations a unit delegates to other programs
///
/// Implementations:
/// - [`ExternalTools`]: `ffmpeg` for the download, `auto-editor` for the cut
/// - test doubles that script success, failure and timing
#[async_trait]
pub trait MediaTools: Send + Sync {
    /// Remux the stream at `source_url` into `destination` without
    /// re-encoding
    async fn download(&self, source_url: &str, destination: &Path) -> io::Result<ToolOutput>;

    /// Speed up the silent parts of `input` and write the result to `output`
    async fn cut(&self, input: &Path, output: &Path) -> io::Result<ToolOutput>;

    /// Name for failure diagnostics
    fn name(&self) -> &str;
}

/// Programs and fixed parameters for [`ExternalTools`]
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Download tool executable
    pub ffmpeg: PathBuf,
    /// Silence removal tool executable
    pub auto_editor: PathBuf,
    /// Playback speed multiplier for silent segments
    pub silent_speed: u32,
    /// Video codec of the cut output
    pub video_codec: String,
    /// Quality of the cut output (lower is better)
    pub constant_rate_factor: u32,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            auto_editor: PathBuf::from("auto-editor"),
            silent_speed: 8,
            video_codec: "h264".to_string(),
            constant_rate_factor: 30,
        }
    }
}

/// [`MediaTools`] backed by real subprocesses.
///
/// Commands are built as argument vectors; nothing goes through a shell.
#[derive(Debug, Clone, Default)]
pub struct ExternalTools {
    config: ToolsConfig,
}

impl ExternalTools {
    pub fn new(config: ToolsConfig) -> Self {
        Self { config }
    }

    /// Arguments for the download: stream copy into a forced mp4 container
    pub fn download_args(&self, source_url: &str, destination: &Path) -> Vec<OsString> {
        vec![
            "-y".into(), // overwrite a stale temporary file
            "-hwaccel".into(),
            "auto".into(),
            "-i".into(),
            source_url.into(),
            "-c".into(),
            "copy".into(),
            "-f".into(),
            "mp4".into(),
            destination.as_os_str().to_owned(),
        ]
    }

    /// Arguments for the silence removal pass
    pub fn cut_args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        vec![
            input.as_os_str().to_owned(),
            "--silent_speed".into(),
            self.config.silent_speed.to_string().into(),
            "--video_codec".into(),
            self.config.video_codec.clone().into(),
            "--constant_rate_factor".into(),
            self.config.constant_rate_factor.to_string().into(),
            "--no_open".into(),
            "-o".into(),
            output.as_os_str().to_owned(),
        ]
    }

    async fn run(program: &Path, args: Vec<OsString>) -> io::Result<ToolOutput> {
        debug!("Running {} {:?}", program.display(), args);

        let output = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await?;

        Ok(ToolOutput::from_output(output))
    }
}

#[async_trait]
impl MediaTools for ExternalTools {
    async fn download(&self, source_url: &str, destination: &Path) -> io::Result<ToolOutput> {
        let args = self.download_args(source_url, destination);
        Self::run(&self.config.ffmpeg, args).await
    }

    async fn cut(&self, input: &Path, output: &Path) -> io::Result<ToolOutput> {
        let args = self.cut_args(input, output);
        Self::run(&self.config.auto_editor, args).await
    }

    fn name(&self) -> &str {
        "ffmpeg+auto-editor"
    }
}
