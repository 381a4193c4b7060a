use std::sync::Arc;

use common::Ingestor;
use common::storage::{FilesystemStore, StagingStore, StorageError};
use runner::{Analyzer, JobRunner, ProcessAnalyzer};

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn StagingStore>,
    pub ingestor: Ingestor,
    pub runner: Arc<JobRunner>,
    pub config: AppConfig,
}

impl AppState {
    /// Wire the service over an existing store and analyzer.
    pub fn new(
        config: AppConfig,
        store: Arc<dyn StagingStore>,
        analyzer: Arc<dyn Analyzer>,
    ) -> Self {
        let runner = JobRunner::new(store.clone(), analyzer, config.runner.clone());
        Self {
            ingestor: Ingestor::new(store.clone()),
            runner: Arc::new(runner),
            store,
            config,
        }
    }

    /// Filesystem store at `storage.root` and analyzers run as child processes.
    pub async fn from_config(config: AppConfig) -> Result<Self, StorageError> {
        let store = FilesystemStore::new(config.storage.root.clone()).await?;
        Ok(Self::new(config, Arc::new(store), Arc::new(ProcessAnalyzer)))
    }
}
