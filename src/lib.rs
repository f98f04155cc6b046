pub mod config;
pub mod pipeline;

pub use config::{Config, Overrides, Settings};
pub use pipeline::{
    Batch, Claim, ClaimManager, Dispatch, Dispatcher, ExternalTools, Gate, MediaTools,
    OutputTarget, RunSummary, ToolOutput, ToolStage, ToolsConfig, UnitError, UnitOptions,
    UnitOutcome, UnitReport, UnitState, UnitWorker, WorkItem,
};
