//! Download-and-cut orchestration
//!
//! Turns batches of (name, stream URL) pairs into finished videos:
//! - `sanitize`: display name → output file name
//! - `claim`: `.lock` files shared with other instances on the same folder
//! - `gate`: bound on units running at the same time
//! - `tools`: `ffmpeg` / `auto-editor` subprocesses
//! - `worker`: per-recording state machine
//! - `dispatcher`: claims items and spawns workers

pub mod batch;
pub mod claim;
pub mod dispatcher;
pub mod error;
pub mod gate;
pub mod sanitize;
pub mod summary;
pub mod target;
pub mod tools;
pub mod worker;

pub use batch::{Batch, WorkItem};
pub use claim::{Claim, ClaimManager};
pub use dispatcher::{Dispatch, Dispatcher};
pub use error::{ToolStage, UnitError};
pub use gate::{Gate, GatePermit};
pub use sanitize::{jump_cut_name, sanitize, sanitize_component};
pub use summary::{FailureRecord, RunSummary};
pub use target::OutputTarget;
pub use tools::{ExternalTools, MediaTools, ToolOutput, ToolsConfig};
pub use worker::{UnitOptions, UnitOutcome, UnitReport, UnitState, UnitWorker};
