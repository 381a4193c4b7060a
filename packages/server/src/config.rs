use std::path::PathBuf;

use common::config::StorageConfig;
use config::{Config, ConfigError, Environment, File};
use runner::RunnerConfig;
use serde::Deserialize;

/// Environment prefix, e.g. `INTAKE__SERVER__PORT=8080`.
pub const ENV_PREFIX: &str = "INTAKE";
/// Overrides the config file location (without extension).
pub const CONFIG_PATH_VAR: &str = "INTAKE_CONFIG";

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    /// `"*"` allows any origin.
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
    /// Request body cap for upload routes.
    pub max_upload_bytes: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
    /// File receiving ERROR events as JSON lines. Empty disables it.
    pub error_log: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub runner: RunnerConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| "config/config".into());
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5002)?
            .set_default("server.cors.allow_origins", vec!["*"])?
            .set_default("server.cors.max_age", 3600)?
            .set_default("server.max_upload_bytes", 256 * 1024 * 1024)?
            .set_default("logging.filter", "info")?
            .set_default("logging.error_log", "server_errors.log")?
            .add_source(File::with_name(&path).required(false))
            // e.g. INTAKE__RUNNER__TIMEOUT_SECS=600
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors.allow_origins")
                    .with_list_parse_key("runner.equipment.args")
                    .with_list_parse_key("runner.jha.args")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: Self = s.try_deserialize()?;
        if config
            .logging
            .error_log
            .as_ref()
            .is_some_and(|p| p.as_os_str().is_empty())
        {
            config.logging.error_log = None;
        }
        Ok(config)
    }
}
