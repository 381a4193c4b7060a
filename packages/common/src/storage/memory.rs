use std::collections::{BTreeMap, BTreeSet};
use std::io::Cursor;
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::error::StorageError;
use super::traits::{BoxReader, StagingStore, check_relative};

#[derive(Default)]
struct Tree {
    dirs: BTreeSet<PathBuf>,
    files: BTreeMap<PathBuf, Vec<u8>>,
}

impl Tree {
    fn dir_exists(&self, dir: &Path) -> bool {
        dir.as_os_str().is_empty() || self.dirs.contains(dir)
    }
}

/// In-memory staging store for tests.
///
/// `root()` is a virtual path; nothing is ever written to disk, so it is only
/// useful with analyzers that do not read the tree themselves.
pub struct MemoryStore {
    root: PathBuf,
    tree: Mutex<Tree>,
}

impl MemoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            tree: Mutex::new(Tree::default()),
        }
    }

    fn tree(&self) -> MutexGuard<'_, Tree> {
        self.tree.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new("/memory")
    }
}

fn normalize(path: &Path) -> Result<PathBuf, StorageError> {
    Ok(check_relative(path)?
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect())
}

fn parent_of(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

#[async_trait]
impl StagingStore for MemoryStore {
    fn root(&self) -> &Path {
        &self.root
    }

    async fn ensure(&self, dir: &Path) -> Result<PathBuf, StorageError> {
        let dir = normalize(dir)?;
        let mut tree = self.tree();
        for ancestor in dir.ancestors() {
            if !ancestor.as_os_str().is_empty() {
                tree.dirs.insert(ancestor.to_path_buf());
            }
        }
        Ok(self.root.join(dir))
    }

    async fn list(&self, dir: &Path) -> Result<Vec<String>, StorageError> {
        let dir = normalize(dir)?;
        let tree = self.tree();
        if !tree.dir_exists(&dir) {
            return Err(StorageError::NotFound(dir));
        }

        let children = tree
            .dirs
            .iter()
            .chain(tree.files.keys())
            .filter(|p| parent_of(p) == dir)
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned());
        let mut names: Vec<String> = children.collect();
        names.sort();
        Ok(names)
    }

    async fn list_recursive(&self, dir: &Path) -> Result<Vec<PathBuf>, StorageError> {
        let dir = normalize(dir)?;
        let tree = self.tree();
        if !tree.dir_exists(&dir) {
            return Err(StorageError::NotFound(dir));
        }
        Ok(tree
            .files
            .keys()
            .filter(|p| p.starts_with(&dir))
            .cloned()
            .collect())
    }

    async fn exists(&self, path: &Path) -> Result<bool, StorageError> {
        let path = normalize(path)?;
        let tree = self.tree();
        Ok(tree.files.contains_key(&path) || tree.dir_exists(&path))
    }

    async fn write_new(&self, path: &Path, data: &[u8]) -> Result<bool, StorageError> {
        let path = normalize(path)?;
        let mut tree = self.tree();
        if !tree.dir_exists(&parent_of(&path)) {
            return Err(StorageError::NotFound(path));
        }
        if tree.files.contains_key(&path) {
            return Ok(false);
        }
        tree.files.insert(path, data.to_vec());
        Ok(true)
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<(), StorageError> {
        let path = normalize(path)?;
        let mut tree = self.tree();
        if !tree.dir_exists(&parent_of(&path)) {
            return Err(StorageError::NotFound(path));
        }
        tree.files.insert(path, data.to_vec());
        Ok(())
    }

    async fn open(&self, path: &Path) -> Result<BoxReader, StorageError> {
        let path = normalize(path)?;
        let tree = self.tree();
        match tree.files.get(&path) {
            Some(data) => Ok(Box::new(Cursor::new(data.clone()))),
            None => Err(StorageError::NotFound(path)),
        }
    }

    async fn delete(&self, path: &Path) -> Result<bool, StorageError> {
        let path = normalize(path)?;
        Ok(self.tree().files.remove(&path).is_some())
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<(), StorageError> {
        let from = normalize(from)?;
        let to = normalize(to)?;
        let mut tree = self.tree();
        if !tree.dir_exists(&parent_of(&to)) {
            return Err(StorageError::NotFound(to));
        }
        let data = tree
            .files
            .remove(&from)
            .ok_or(StorageError::NotFound(from))?;
        tree.files.insert(to, data);
        Ok(())
    }
}
