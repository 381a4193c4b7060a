pub mod process;

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::RunError;

pub use process::ProcessAnalyzer;

/// One analyzer run, fully resolved.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub program: String,
    /// Passed as an argument vector, never through a shell.
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub timeout: Duration,
    /// Combined stdout + stderr cap.
    pub max_output_bytes: u64,
}

impl Invocation {
    /// Program and arguments joined for logging.
    pub fn display_argv(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// What an analyzer run produced, regardless of exit status.
#[derive(Debug, Clone, Default)]
pub struct AnalyzerOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl AnalyzerOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// The external extraction program.
///
/// Implementations return `Ok` whenever the program ran to completion, even
/// with a non-zero exit; the job runner interprets the output.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> Result<AnalyzerOutput, RunError>;
}
