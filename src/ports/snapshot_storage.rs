use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to read snapshot: {0}")]
    Read(String),

    #[error("Failed to write snapshot: {0}")]
    Write(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// A single named slot holding the serialized project collection.
///
/// Every write replaces the whole snapshot; there are no partial writes.
#[cfg_attr(test, mockall::automock)]
pub trait SnapshotStorage {
    /// `None` when nothing has been written yet.
    fn read(&self) -> StorageResult<Option<String>>;
    fn write(&self, snapshot: &str) -> StorageResult<()>;
}
