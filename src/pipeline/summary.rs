use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use uuid::Uuid;

use super::error::ToolStage;
use super::worker::{UnitOutcome, UnitReport};

/// Totals of one run over a whole batch
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Identifies this run in the logs
    pub run_id: Uuid,

    /// When dispatching started
    pub started_at: DateTime<Utc>,

    /// Wall-clock duration until every unit was drained
    pub duration_secs: f64,

    /// Recordings offered by the batch
    pub submitted: usize,

    /// Recordings already claimed or finished, not started
    pub skipped: usize,

    /// Units that published their output
    pub completed: usize,

    /// Units that gave up
    pub failed: usize,

    pub failures: Vec<FailureRecord>,
}

/// One abandoned unit
#[derive(Debug, Clone, Serialize)]
pub struct FailureRecord {
    pub name: String,
    pub source_url: String,
    pub stage: ToolStage,
    pub message: String,
}

impl RunSummary {
    pub fn new(run_id: Uuid, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id,
            started_at,
            duration_secs: 0.0,
            submitted: 0,
            skipped: 0,
            completed: 0,
            failed: 0,
            failures: Vec::new(),
        }
    }

    pub fn record(&mut self, report: &UnitReport) {
        match &report.outcome {
            UnitOutcome::Completed { .. } => self.completed += 1,
            UnitOutcome::Failed(e) => {
                self.failed += 1;
                self.failures.push(FailureRecord {
                    name: report.item.display_name.clone(),
                    source_url: report.item.source_url.clone(),
                    stage: e.stage(),
                    message: e.to_string(),
                });
            }
        }
    }

    /// Stamp the duration from `started_at` to now
    pub fn finish(&mut self) {
        let duration = Utc::now().signed_duration_since(self.started_at);
        self.duration_secs = duration.num_milliseconds() as f64 / 1000.0;
    }

    /// Units that were actually started
    pub fn started(&self) -> usize {
        self.completed + self.failed
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write run summary: {}", path.display()))
    }
}
