use serde::Serialize;
use std::fmt;
use std::io;
use thiserror::Error;
use tokio::sync::AcquireError;

/// Step of a unit that can fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStage {
    Download,
    Copy,
    Transcode,
}

impl fmt::Display for ToolStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ToolStage::Download => "download",
            ToolStage::Copy => "copy",
            ToolStage::Transcode => "transcode",
        };
        f.write_str(name)
    }
}

/// Why a unit was abandoned
#[derive(Debug, Error)]
pub enum UnitError {
    #[error("{stage} tool exited with {}", exit_code_label(.code))]
    Tool {
        stage: ToolStage,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("{stage} failed: {source}")]
    Io {
        stage: ToolStage,
        #[source]
        source: io::Error,
    },

    #[error("work gate closed")]
    GateClosed(#[from] AcquireError),
}

impl UnitError {
    pub fn io(stage: ToolStage, source: io::Error) -> Self {
        UnitError::Io { stage, source }
    }

    pub fn stage(&self) -> ToolStage {
        match self {
            UnitError::Tool { stage, .. } | UnitError::Io { stage, .. } => *stage,
            UnitError::GateClosed(_) => ToolStage::Download,
        }
    }
}

fn exit_code_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status (terminated by signal)".to_string(),
    }
}
