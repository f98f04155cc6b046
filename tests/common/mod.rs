// Shared fixtures for the integration tests
//
// `FakeTools` stands in for ffmpeg and auto-editor: it writes small files
// instead of video, records every call, and can be told to fail or to take
// its time so the gate has something to bound.

#![allow(dead_code)]

use async_trait::async_trait;
use lecture_cutter::{MediaTools, ToolOutput};
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

#[derive(Default)]
pub struct FakeTools {
    /// Source URLs whose download exits nonzero
    fail_downloads: HashSet<String>,
    /// Make every cut write a partial file and exit nonzero
    fail_cuts: bool,
    /// How long each tool call takes
    delay: Duration,

    downloads: Mutex<Vec<String>>,
    cuts: Mutex<Vec<(PathBuf, PathBuf)>>,
    running: AtomicUsize,
    peak_running: AtomicUsize,
}

impl FakeTools {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing_download(mut self, url: &str) -> Self {
        self.fail_downloads.insert(url.to_string());
        self
    }

    pub fn failing_cuts(mut self) -> Self {
        self.fail_cuts = true;
        self
    }

    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }

    pub fn cuts(&self) -> Vec<(PathBuf, PathBuf)> {
        self.cuts.lock().unwrap().clone()
    }

    /// Total tool invocations so far
    pub fn invocations(&self) -> usize {
        self.downloads.lock().unwrap().len() + self.cuts.lock().unwrap().len()
    }

    /// Most tool calls that were in flight at the same time
    pub fn peak_running(&self) -> usize {
        self.peak_running.load(Ordering::SeqCst)
    }

    async fn busy(&self) {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_running.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.running.fetch_sub(1, Ordering::SeqCst);
    }
}

fn failure(stderr: &str) -> ToolOutput {
    ToolOutput {
        success: false,
        code: Some(1),
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}

fn success() -> ToolOutput {
    ToolOutput {
        success: true,
        code: Some(0),
        ..Default::default()
    }
}

#[async_trait]
impl MediaTools for FakeTools {
    async fn download(&self, source_url: &str, destination: &Path) -> io::Result<ToolOutput> {
        self.downloads.lock().unwrap().push(source_url.to_string());
        self.busy().await;

        if self.fail_downloads.contains(source_url) {
            // Leave a partial file behind like an interrupted remux would
            tokio::fs::write(destination, b"partial").await?;
            return Ok(failure("Server returned 404 Not Found"));
        }

        tokio::fs::write(destination, format!("video from {}", source_url)).await?;
        Ok(success())
    }

    async fn cut(&self, input: &Path, output: &Path) -> io::Result<ToolOutput> {
        self.cuts
            .lock()
            .unwrap()
            .push((input.to_path_buf(), output.to_path_buf()));
        self.busy().await;

        if self.fail_cuts {
            tokio::fs::write(output, b"partial").await?;
            return Ok(failure("Invalid data found when processing input"));
        }

        let raw = tokio::fs::read_to_string(input).await?;
        tokio::fs::write(output, format!("cut {}", raw)).await?;
        Ok(success())
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// Output and scratch directories that live as long as the test
pub struct Dirs {
    pub output: TempDir,
    pub scratch: TempDir,
}

impl Dirs {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            output: TempDir::new()?,
            scratch: TempDir::new()?,
        })
    }

    pub fn output(&self) -> &Path {
        self.output.path()
    }

    pub fn scratch(&self) -> &Path {
        self.scratch.path()
    }

    /// Number of entries in the scratch dir
    pub fn scratch_entries(&self) -> usize {
        std::fs::read_dir(self.scratch.path()).unwrap().count()
    }
}
