use std::path::PathBuf;

use serde::Deserialize;

/// Command line used to start an analyzer.
///
/// The runner appends `--location`, `--output` and `--uploads_root` to `args`.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct AnalyzerCommand {
    /// Executable to spawn. Default: "python3".
    #[serde(default = "default_program")]
    pub program: String,
    /// Arguments placed before the runner's own flags, typically the script.
    #[serde(default)]
    pub args: Vec<String>,
    /// Working directory for the child. Default: inherit.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

impl AnalyzerCommand {
    pub fn new(
        program: impl Into<String>,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            working_dir: None,
        }
    }
}

fn default_program() -> String {
    "python3".into()
}
fn default_equipment_command() -> AnalyzerCommand {
    AnalyzerCommand::new(default_program(), ["python/process_equipment.py"])
}
fn default_jha_command() -> AnalyzerCommand {
    AnalyzerCommand::new(default_program(), ["python/process_jha.py"])
}
fn default_timeout_secs() -> u64 {
    300
}
fn default_max_output_bytes() -> u64 {
    10 * 1024 * 1024
}
fn default_serialize_runs() -> bool {
    true
}

/// Job runner configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct RunnerConfig {
    /// Wall-clock budget for one analyzer run, in seconds. Default: 300.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Combined stdout + stderr cap, in bytes. Default: 10 MiB.
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: u64,
    /// Hold one lease per pipeline from invocation until the result has been
    /// moved to its per-request delivery path. The analyzer's result path is
    /// shared by all locations. Default: true.
    #[serde(default = "default_serialize_runs")]
    pub serialize_runs: bool,
    /// Equipment inventory analyzer.
    #[serde(default = "default_equipment_command")]
    pub equipment: AnalyzerCommand,
    /// Job hazard analysis analyzer.
    #[serde(default = "default_jha_command")]
    pub jha: AnalyzerCommand,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_output_bytes: default_max_output_bytes(),
            serialize_runs: default_serialize_runs(),
            equipment: default_equipment_command(),
            jha: default_jha_command(),
        }
    }
}
