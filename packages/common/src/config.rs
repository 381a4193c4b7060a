use std::path::PathBuf;

use serde::Deserialize;

/// Where staged uploads and analyzer output live.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory holding `uploads/` and `output/`. Default: ".".
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
}

fn default_storage_root() -> PathBuf {
    PathBuf::from(".")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
        }
    }
}
