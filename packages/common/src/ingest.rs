use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::category::{Cardinality, UploadCategory};
use crate::filename::{extension_of, validate_flat_filename};
use crate::layout;
use crate::location::{Location, LocationError};
use crate::storage::{StagingStore, StorageError};

/// Errors raised while staging an upload batch.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Location(#[from] LocationError),

    #[error("{0}")]
    InvalidInput(String),

    #[error(
        "Unsupported file type for {category}: '{filename}' (allowed: {})",
        .allowed.join(", ")
    )]
    UnsupportedFileType {
        category: &'static str,
        filename: String,
        allowed: &'static [&'static str],
    },

    #[error("Failed to store upload: {0}")]
    Storage(#[from] StorageError),
}

impl IngestError {
    /// Whether the caller, not the server, is at fault.
    pub fn is_invalid_input(&self) -> bool {
        !matches!(self, Self::Storage(_))
    }
}

/// One file received in an upload request.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    /// Original filename as sent by the client.
    pub name: String,
    pub data: Vec<u8>,
}

impl IncomingFile {
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}

/// Outcome of staging one batch.
///
/// For multi-file categories `uploaded` and `skipped` partition the batch.
/// For single-file categories `filename` holds the normalized stored name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub location: Location,
    pub category: UploadCategory,
    pub uploaded: Vec<String>,
    pub skipped: Vec<String>,
    pub filename: Option<String>,
}

/// Writes upload batches into the staging layout.
#[derive(Clone)]
pub struct Ingestor {
    store: Arc<dyn StagingStore>,
}

impl Ingestor {
    pub fn new(store: Arc<dyn StagingStore>) -> Self {
        Self { store }
    }

    pub async fn ingest(
        &self,
        location: &str,
        category: UploadCategory,
        files: Vec<IncomingFile>,
    ) -> Result<IngestReport, IngestError> {
        let location = Location::parse(location)?;

        if files.is_empty() {
            return Err(IngestError::InvalidInput(format!(
                "No {} uploaded",
                category.label()
            )));
        }

        match category.cardinality() {
            Cardinality::Many => self.ingest_many(location, category, files).await,
            Cardinality::One => self.ingest_one(location, category, files).await,
        }
    }

    async fn ingest_many(
        &self,
        location: Location,
        category: UploadCategory,
        files: Vec<IncomingFile>,
    ) -> Result<IngestReport, IngestError> {
        // Validate every name up front so a bad name never leaves a partial batch.
        let mut named = Vec::with_capacity(files.len());
        for file in &files {
            let name = validate_flat_filename(&file.name).map_err(|e| {
                IngestError::InvalidInput(format!("{} ('{}')", e.message(), file.name))
            })?;
            named.push((name.to_string(), &file.data));
        }

        let dir = layout::category_dir(category, &location);
        self.store.ensure(&dir).await?;

        let mut uploaded = Vec::new();
        let mut skipped = Vec::new();
        for (name, data) in named {
            if self.store.write_new(&dir.join(&name), data).await? {
                uploaded.push(name);
            } else {
                debug!(location = %location, file = %name, "Skipping existing file");
                skipped.push(name);
            }
        }

        info!(
            location = %location,
            category = category.label(),
            uploaded = uploaded.len(),
            skipped = skipped.len(),
            "Upload batch staged"
        );

        Ok(IngestReport {
            location,
            category,
            uploaded,
            skipped,
            filename: None,
        })
    }

    async fn ingest_one(
        &self,
        location: Location,
        category: UploadCategory,
        files: Vec<IncomingFile>,
    ) -> Result<IngestReport, IngestError> {
        let allowed = category.accepted_extensions().unwrap_or(&[]);
        let Some(file) = files.into_iter().next() else {
            return Err(IngestError::InvalidInput(format!(
                "No {} uploaded",
                category.label()
            )));
        };

        let extension = extension_of(&file.name)
            .filter(|ext| allowed.contains(&ext.as_str()))
            .ok_or_else(|| IngestError::UnsupportedFileType {
                category: category.label(),
                filename: file.name.clone(),
                allowed,
            })?;

        let stored_name = category
            .stored_name(&location, &extension)
            .ok_or_else(|| IngestError::InvalidInput(format!("{category:?} is not a sheet")))?;

        let dir = layout::category_dir(category, &location);
        self.store.ensure(&dir).await?;
        self.store.write(&dir.join(&stored_name), &file.data).await?;
        self.remove_stale_sheets(&dir, &stored_name, &extension).await;

        info!(
            location = %location,
            category = category.label(),
            original = %file.name,
            stored = %stored_name,
            "Sheet staged"
        );

        Ok(IngestReport {
            location,
            category,
            uploaded: vec![stored_name.clone()],
            skipped: Vec::new(),
            filename: Some(stored_name),
        })
    }

    /// Drop a previously staged sheet with a different extension so the
    /// analyzer only ever sees one.
    async fn remove_stale_sheets(&self, dir: &Path, stored_name: &str, extension: &str) {
        let stem = &stored_name[..stored_name.len() - extension.len()];
        let names = match self.store.list(dir).await {
            Ok(names) => names,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Could not list sheet directory");
                return;
            }
        };

        for name in names {
            let stale = name != stored_name
                && name
                    .strip_prefix(stem)
                    .is_some_and(|rest| rest.starts_with('.'));
            if !stale {
                continue;
            }
            if let Err(e) = self.store.delete(&dir.join(&name)).await {
                warn!(file = %name, error = %e, "Failed to remove stale sheet");
            }
        }
    }
}
