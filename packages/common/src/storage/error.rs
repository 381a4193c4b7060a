use std::fmt;
use std::path::PathBuf;

/// Errors that can occur during staging storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// The requested file or directory was not found.
    NotFound(PathBuf),
    /// An I/O error occurred.
    Io(std::io::Error),
    /// The relative path escapes the store root or is otherwise unusable.
    InvalidPath(String),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "path not found: {}", path.display()),
            Self::Io(err) => write!(f, "storage IO error: {err}"),
            Self::InvalidPath(msg) => write!(f, "invalid storage path: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
