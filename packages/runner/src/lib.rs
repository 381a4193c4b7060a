pub mod analyzer;
pub mod config;
pub mod error;
pub mod job;
pub mod pipeline;

pub use analyzer::{Analyzer, AnalyzerOutput, Invocation, ProcessAnalyzer};
pub use config::{AnalyzerCommand, RunnerConfig};
pub use error::{Result, RunError};
pub use job::{JobOutcome, JobRunner};
pub use pipeline::{Pipeline, PipelineKind};
