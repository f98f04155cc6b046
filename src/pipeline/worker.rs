use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::batch::WorkItem;
use super::claim::Claim;
use super::error::{ToolStage, UnitError};
use super::gate::{Gate, GatePermit};
use super::target::OutputTarget;
use super::tools::{MediaTools, ToolOutput};

/// What a unit produces besides the download itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitOptions {
    /// Copy the unmodified download into the output folder. Implied when
    /// `jump_cut` is off.
    pub keep_original: bool,
    /// Run the silence removal pass
    pub jump_cut: bool,
}

impl Default for UnitOptions {
    fn default() -> Self {
        Self {
            keep_original: false,
            jump_cut: true,
        }
    }
}

/// Lifecycle of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    Pending,
    Downloading,
    Copying,
    Transcoding,
    Done,
    Failed(ToolStage),
}

/// How a unit ended
#[derive(Debug)]
pub enum UnitOutcome {
    /// Output published; time since the download started
    Completed { elapsed: Duration },
    Failed(UnitError),
}

/// Result of one unit, handed back to whoever drains the dispatch
#[derive(Debug)]
pub struct UnitReport {
    pub item: WorkItem,
    pub target: OutputTarget,
    pub outcome: UnitOutcome,
}

impl UnitReport {
    pub fn is_completed(&self) -> bool {
        matches!(self.outcome, UnitOutcome::Completed { .. })
    }

    pub fn error(&self) -> Option<&UnitError> {
        match &self.outcome {
            UnitOutcome::Failed(e) => Some(e),
            UnitOutcome::Completed { .. } => None,
        }
    }
}

/// Downloads, optionally copies and cuts one claimed recording.
///
/// The worker owns the claim for its target and releases it on every exit
/// path. A failed stage leaves the temporary download in the scratch
/// directory for inspection and removes its own partial output.
pub struct UnitWorker {
    item: WorkItem,
    target: OutputTarget,
    claim: Option<Claim>,
    tools: Arc<dyn MediaTools>,
    gate: Gate,
    options: UnitOptions,
    state: UnitState,
}

impl UnitWorker {
    pub fn new(
        item: WorkItem,
        target: OutputTarget,
        claim: Claim,
        tools: Arc<dyn MediaTools>,
        gate: Gate,
        options: UnitOptions,
    ) -> Self {
        Self {
            item,
            target,
            claim: Some(claim),
            tools,
            gate,
            options,
            state: UnitState::Pending,
        }
    }

    pub fn state(&self) -> UnitState {
        self.state
    }

    /// Run the unit to completion or failure
    pub async fn run(mut self) -> UnitReport {
        debug!("Waiting for a work slot: {}", self.item.display_name);

        let outcome = match self.process().await {
            Ok((elapsed, permit)) => {
                self.transition(UnitState::Done);
                self.finish(Some(permit));
                info!(
                    "Completed {} after {:.0}s",
                    self.target.file_name,
                    elapsed.as_secs_f64()
                );
                UnitOutcome::Completed { elapsed }
            }
            Err(e) => {
                self.transition(UnitState::Failed(e.stage()));
                self.report_failure(&e);
                self.finish(None);
                UnitOutcome::Failed(e)
            }
        };

        UnitReport {
            item: self.item,
            target: self.target,
            outcome,
        }
    }

    /// Download, copy, cut. The gate slot is returned to the caller on
    /// success and dropped with the error otherwise.
    async fn process(&mut self) -> Result<(Duration, GatePermit), UnitError> {
        let permit = self.gate.acquire().await?;

        self.transition(UnitState::Downloading);
        info!("Download of {} started", self.target.file_name);
        let started = Instant::now();

        let output = self
            .tools
            .download(&self.item.source_url, &self.target.temporary_path)
            .await
            .map_err(|e| UnitError::io(ToolStage::Download, e))?;
        check_exit(ToolStage::Download, output)?;

        info!(
            "Download of {} completed after {:.0}s",
            self.target.file_name,
            started.elapsed().as_secs_f64()
        );

        // Without a cut the download itself is the result
        if self.options.keep_original || !self.options.jump_cut {
            self.transition(UnitState::Copying);
            if let Err(e) =
                tokio::fs::copy(&self.target.temporary_path, &self.target.output_path).await
            {
                discard_partial(&self.target.output_path).await;
                return Err(UnitError::io(ToolStage::Copy, e));
            }
        }

        if self.options.jump_cut {
            self.transition(UnitState::Transcoding);
            info!("Conversion of {} started", self.target.file_name);
            let conversion_started = Instant::now();

            let cut_path = self.target.cut_path(self.options.keep_original);
            let result = self
                .tools
                .cut(&self.target.temporary_path, cut_path)
                .await
                .map_err(|e| UnitError::io(ToolStage::Transcode, e))
                .and_then(|output| check_exit(ToolStage::Transcode, output));
            if let Err(e) = result {
                discard_partial(cut_path).await;
                return Err(e);
            }

            info!(
                "Conversion of {} completed after {:.0}s",
                self.target.file_name,
                conversion_started.elapsed().as_secs_f64()
            );
        }

        if let Err(e) = tokio::fs::remove_file(&self.target.temporary_path).await {
            warn!(
                "Failed to delete temporary file {}: {}",
                self.target.temporary_path.display(),
                e
            );
        }

        Ok((started.elapsed(), permit))
    }

    /// Remove the lock file, then give the gate slot back
    fn finish(&mut self, permit: Option<GatePermit>) {
        if let Some(claim) = self.claim.take() {
            if let Err(e) = claim.release() {
                error!(
                    "Failed to remove lock file {}: {}",
                    self.target.claim_path.display(),
                    e
                );
            }
        }
        drop(permit);
    }

    fn transition(&mut self, next: UnitState) {
        debug!(from = ?self.state, to = ?next, "{}", self.target.file_name);
        self.state = next;
    }

    fn report_failure(&self, err: &UnitError) {
        let stage = err.stage();
        let (input_label, output_path): (&str, &Path) = match stage {
            ToolStage::Download => (
                "Designated download location",
                self.target.output_path.as_path(),
            ),
            ToolStage::Copy => ("Reading from", self.target.output_path.as_path()),
            ToolStage::Transcode => (
                "Reading from",
                self.target.cut_path(self.options.keep_original),
            ),
        };

        error!(
            "Error during {} of \"{}\" with {}: {}",
            stage,
            self.item.display_name,
            self.tools.name(),
            err
        );
        error!("Source stream: {}", self.item.source_url);
        error!("{}: {}", input_label, self.target.temporary_path.display());
        error!("Designated output location: {}", output_path.display());

        if let UnitError::Tool { stdout, stderr, .. } = err {
            error!("Output of {} tool to stdout:\n{}", stage, stdout);
            error!("Output of {} tool to stderr:\n{}", stage, stderr);
        }
    }
}

/// Remove whatever a failed stage left at its own output path, so the
/// claim check of a later run does not take it for a finished recording
async fn discard_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("Removed partial output {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove partial output {}: {}", path.display(), e),
    }
}

fn check_exit(stage: ToolStage, output: ToolOutput) -> Result<(), UnitError> {
    if output.success {
        return Ok(());
    }

    Err(UnitError::Tool {
        stage,
        code: output.code,
        stdout: output.stdout,
        stderr: output.stderr,
    })
}
