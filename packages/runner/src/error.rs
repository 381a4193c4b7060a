use std::path::PathBuf;
use std::time::Duration;

use common::LocationError;
use common::storage::StorageError;
use serde_json::{Value, json};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Location(#[from] LocationError),

    /// Caller-side problem: missing inputs or an analyzer "nothing to do" signal.
    #[error("{message}")]
    InvalidInput {
        message: String,
        details: Option<Value>,
    },

    #[error(
        "Processing failed (exit code {})",
        .exit_code.map_or_else(|| "none".to_string(), |c| c.to_string())
    )]
    ProcessFailed {
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("Processing timed out after {} seconds", .limit.as_secs_f64())]
    TimedOut { limit: Duration },

    #[error("Analyzer output exceeded {limit} bytes")]
    OutputTooLarge { limit: u64 },

    #[error("Processing completed but no result file was generated")]
    OutputMissing { path: PathBuf, stdout: String },

    #[error("Failed to start analyzer '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Analyzer I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl RunError {
    pub fn invalid_input(message: impl Into<String>, details: Option<Value>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            details,
        }
    }

    /// Whether the caller, not the server or analyzer, is at fault.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::Location(_) | Self::InvalidInput { .. })
    }

    /// Diagnostic payload for the error response.
    pub fn details(&self) -> Option<Value> {
        match self {
            Self::InvalidInput { details, .. } => details.clone(),
            Self::ProcessFailed { stderr, .. } => Some(Value::String(stderr.clone())),
            Self::OutputMissing { path, stdout } => Some(json!({
                "path": path.display().to_string(),
                "stdout": stdout,
            })),
            Self::Spawn { source, .. } => Some(Value::String(source.to_string())),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, RunError>;
