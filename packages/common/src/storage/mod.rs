mod error;
mod traits;

pub mod filesystem;
pub mod memory;

pub use error::StorageError;
pub use filesystem::FilesystemStore;
pub use memory::MemoryStore;
pub use traits::{BoxReader, StagingStore, check_relative};
