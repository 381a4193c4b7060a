use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Directory-tree storage for staged uploads and analyzer output.
///
/// All paths are relative to the store root. Implementations must reject
/// absolute paths and `..` components.
#[async_trait]
pub trait StagingStore: Send + Sync {
    /// Absolute base directory that external programs see.
    fn root(&self) -> &Path;

    /// Resolve a relative path against [`StagingStore::root`].
    fn resolve(&self, path: &Path) -> Result<PathBuf, StorageError> {
        Ok(self.root().join(check_relative(path)?))
    }

    /// Create `dir` and all of its parents. Succeeds if it already exists.
    async fn ensure(&self, dir: &Path) -> Result<PathBuf, StorageError>;

    /// File names directly inside `dir`, sorted.
    ///
    /// Fails with [`StorageError::NotFound`] if `dir` does not exist.
    async fn list(&self, dir: &Path) -> Result<Vec<String>, StorageError>;

    /// Every file below `dir`, relative to the store root, sorted.
    async fn list_recursive(&self, dir: &Path) -> Result<Vec<PathBuf>, StorageError>;

    /// Check whether a file or directory exists.
    async fn exists(&self, path: &Path) -> Result<bool, StorageError>;

    /// Write `data` only if nothing exists at `path` yet.
    ///
    /// Returns `false` without touching the existing file when it does.
    async fn write_new(&self, path: &Path, data: &[u8]) -> Result<bool, StorageError>;

    /// Write `data`, replacing any existing file.
    async fn write(&self, path: &Path, data: &[u8]) -> Result<(), StorageError>;

    /// Open a file as a streaming async reader.
    async fn open(&self, path: &Path) -> Result<BoxReader, StorageError>;

    /// Read a whole file.
    async fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        let mut reader = self.open(path).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Delete a file.
    ///
    /// Returns `true` if the file was deleted, `false` if it did not exist.
    async fn delete(&self, path: &Path) -> Result<bool, StorageError>;

    /// Move a file, replacing anything at `to`. The parent of `to` must exist.
    async fn rename(&self, from: &Path, to: &Path) -> Result<(), StorageError>;
}

/// Ensure a path is relative and stays below the root.
pub fn check_relative(path: &Path) -> Result<&Path, StorageError> {
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            _ => {
                return Err(StorageError::InvalidPath(format!(
                    "'{}' must be relative and must not contain '..'",
                    path.display()
                )));
            }
        }
    }
    Ok(path)
}
