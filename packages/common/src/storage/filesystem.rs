use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufReader};

use super::error::StorageError;
use super::traits::{BoxReader, StagingStore, check_relative};

/// Filesystem-backed staging store rooted at a single directory.
///
/// Replacing writes go through `{base_path}/.tmp` and a rename so readers
/// never observe a half-written file.
pub struct FilesystemStore {
    base_path: PathBuf,
}

impl FilesystemStore {
    /// Create a new filesystem store, creating the base directory if needed.
    pub async fn new(base_path: PathBuf) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        let base_path = fs::canonicalize(&base_path).await?;
        Ok(Self { base_path })
    }

    fn full_path(&self, path: &Path) -> Result<PathBuf, StorageError> {
        Ok(self.base_path.join(check_relative(path)?))
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

fn not_found_or(err: std::io::Error, path: &Path) -> StorageError {
    if err.kind() == ErrorKind::NotFound {
        StorageError::NotFound(path.to_path_buf())
    } else {
        err.into()
    }
}

#[async_trait]
impl StagingStore for FilesystemStore {
    fn root(&self) -> &Path {
        &self.base_path
    }

    async fn ensure(&self, dir: &Path) -> Result<PathBuf, StorageError> {
        let full = self.full_path(dir)?;
        fs::create_dir_all(&full).await?;
        Ok(full)
    }

    async fn list(&self, dir: &Path) -> Result<Vec<String>, StorageError> {
        let full = self.full_path(dir)?;
        let mut entries = fs::read_dir(&full)
            .await
            .map_err(|e| not_found_or(e, dir))?;

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    async fn list_recursive(&self, dir: &Path) -> Result<Vec<PathBuf>, StorageError> {
        let start = check_relative(dir)?.to_path_buf();
        if !fs::try_exists(self.base_path.join(&start)).await? {
            return Err(StorageError::NotFound(start));
        }

        let mut files = Vec::new();
        let mut pending = vec![start];
        while let Some(current) = pending.pop() {
            let mut entries = fs::read_dir(self.base_path.join(&current)).await?;
            while let Some(entry) = entries.next_entry().await? {
                let relative = current.join(entry.file_name());
                if entry.file_type().await?.is_dir() {
                    pending.push(relative);
                } else {
                    files.push(relative);
                }
            }
        }
        files.sort();
        Ok(files)
    }

    async fn exists(&self, path: &Path) -> Result<bool, StorageError> {
        let full = self.full_path(path)?;
        Ok(fs::try_exists(&full).await?)
    }

    async fn write_new(&self, path: &Path, data: &[u8]) -> Result<bool, StorageError> {
        let full = self.full_path(path)?;
        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(not_found_or(e, path)),
        };

        let written = async {
            file.write_all(data).await?;
            file.flush().await
        }
        .await;

        if let Err(e) = written {
            drop(file);
            let _ = fs::remove_file(&full).await;
            return Err(e.into());
        }
        Ok(true)
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<(), StorageError> {
        let full = self.full_path(path)?;
        let temp_path = self.temp_path();

        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Err(e) = fs::rename(&temp_path, &full).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(not_found_or(e, path));
        }

        Ok(())
    }

    async fn open(&self, path: &Path) -> Result<BoxReader, StorageError> {
        let full = self.full_path(path)?;
        match fs::File::open(&full).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) => Err(not_found_or(e, path)),
        }
    }

    async fn delete(&self, path: &Path) -> Result<bool, StorageError> {
        let full = self.full_path(path)?;
        match fs::remove_file(&full).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<(), StorageError> {
        let source = self.full_path(from)?;
        let target = self.full_path(to)?;
        if let Err(e) = fs::metadata(&source).await {
            return Err(not_found_or(e, from));
        }
        fs::rename(&source, &target)
            .await
            .map_err(|e| not_found_or(e, to))
    }
}
