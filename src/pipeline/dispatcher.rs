use chrono::Utc;
use futures::future::join_all;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

use super::batch::{Batch, WorkItem};
use super::claim::ClaimManager;
use super::gate::Gate;
use super::sanitize::sanitize_component;
use super::summary::RunSummary;
use super::target::OutputTarget;
use super::tools::MediaTools;
use super::worker::{UnitOptions, UnitReport, UnitWorker};

/// Turns batches into running units.
///
/// Every admitted item gets its own task; the shared [`Gate`] inside the
/// workers is what bounds the concurrency, not the dispatch loop.
pub struct Dispatcher {
    tools: Arc<dyn MediaTools>,
    gate: Gate,
    options: UnitOptions,
    claims: ClaimManager,
}

impl Dispatcher {
    pub fn new(tools: Arc<dyn MediaTools>, gate: Gate, options: UnitOptions) -> Self {
        Self {
            tools,
            gate,
            options,
            claims: ClaimManager::new(options.jump_cut),
        }
    }

    pub fn gate(&self) -> &Gate {
        &self.gate
    }

    pub fn options(&self) -> UnitOptions {
        self.options
    }

    /// Claim and spawn a unit for every item that is not claimed or
    /// finished yet. Never waits for the units.
    ///
    /// Items are claimed one after another, so a duplicate later in
    /// `items` is refused by the claim of the earlier one. Claims only guard
    /// `output_dir`, so `scratch_dir` must not be shared with units writing
    /// to another output directory. Must be called from within a tokio
    /// runtime.
    pub fn dispatch(&self, items: &[WorkItem], output_dir: &Path, scratch_dir: &Path) -> Dispatch {
        let mut dispatch = Dispatch::default();

        for item in items {
            dispatch.submitted += 1;
            let target = OutputTarget::new(&item.display_name, output_dir, scratch_dir);

            let claim = match self.claims.try_claim(&target) {
                Ok(Some(claim)) => claim,
                Ok(None) => {
                    debug!("Skipping {}", target.file_name);
                    dispatch.skipped += 1;
                    continue;
                }
                Err(e) => {
                    error!(
                        "Failed to create lock file {}: {}",
                        target.claim_path.display(),
                        e
                    );
                    dispatch.skipped += 1;
                    continue;
                }
            };

            let span = info_span!("unit", name = %target.file_name);
            let worker = UnitWorker::new(
                item.clone(),
                target,
                claim,
                Arc::clone(&self.tools),
                self.gate.clone(),
                self.options,
            );
            dispatch.handles.push(tokio::spawn(worker.run().instrument(span)));
        }

        dispatch
    }

    /// [`Dispatcher::dispatch`] every subject of `batch` into its own folder
    /// below `output_root`, with its own scratch folder below `scratch_dir`.
    ///
    /// A subject whose folders cannot be created is logged and skipped; the
    /// remaining subjects still run.
    pub fn dispatch_batch(&self, batch: &Batch, output_root: &Path, scratch_dir: &Path) -> Dispatch {
        let mut all = Dispatch::default();

        for (subject, items) in batch.subjects() {
            let name = subject_folder_name(subject);
            let folder = output_root.join(&name);
            let scratch = scratch_dir.join(&name);

            if let Err(e) = fs::create_dir_all(&folder).and_then(|_| fs::create_dir_all(&scratch)) {
                error!(
                    "Failed to create folders {} and {}: {}",
                    folder.display(),
                    scratch.display(),
                    e
                );
                all.submitted += items.len();
                all.skipped += items.len();
                continue;
            }

            let dispatch = self.dispatch(items, &folder, &scratch);
            info!(
                "{}: {} recordings, {} started, {} skipped",
                subject,
                dispatch.submitted,
                dispatch.spawned(),
                dispatch.skipped
            );
            all.merge(dispatch);
        }

        all
    }

    /// Dispatch `batch`, wait for every unit and total the results
    pub async fn run_batch(&self, batch: &Batch, output_root: &Path, scratch_dir: &Path) -> RunSummary {
        let run_id = Uuid::new_v4();
        let mut summary = RunSummary::new(run_id, Utc::now());

        async {
            info!("Starting run with {} recordings", batch.len());

            let dispatch = self.dispatch_batch(batch, output_root, scratch_dir);
            summary.submitted = dispatch.submitted;
            summary.skipped = dispatch.skipped;

            for report in dispatch.drain().await {
                summary.record(&report);
            }
            summary.finish();

            info!(
                "Run finished after {:.0}s: {} completed, {} failed, {} skipped",
                summary.duration_secs, summary.completed, summary.failed, summary.skipped
            );
        }
        .instrument(info_span!("run", %run_id))
        .await;

        summary
    }
}

/// Units spawned by one or more dispatch calls
#[derive(Debug, Default)]
pub struct Dispatch {
    handles: Vec<JoinHandle<UnitReport>>,
    submitted: usize,
    skipped: usize,
}

impl Dispatch {
    /// Items looked at
    pub fn submitted(&self) -> usize {
        self.submitted
    }

    /// Items refused by the claim check
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Units started
    pub fn spawned(&self) -> usize {
        self.handles.len()
    }

    pub fn merge(&mut self, other: Dispatch) {
        self.handles.extend(other.handles);
        self.submitted += other.submitted;
        self.skipped += other.skipped;
    }

    /// Wait for every spawned unit.
    ///
    /// Dropping a `Dispatch` instead leaves the units running detached.
    pub async fn drain(self) -> Vec<UnitReport> {
        let mut reports = Vec::with_capacity(self.handles.len());

        for result in join_all(self.handles).await {
            match result {
                Ok(report) => reports.push(report),
                Err(e) => error!("Unit task panicked: {}", e),
            }
        }

        reports
    }
}

fn subject_folder_name(subject: &str) -> String {
    let name = sanitize_component(subject);
    if name.is_empty() || name == "." || name == ".." {
        return name.replace('.', "_") + "_";
    }
    name
}
