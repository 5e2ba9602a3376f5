use crate::ports::{SnapshotStorage, StorageError, StorageResult};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Keeps the snapshot in one JSON file on disk.
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| "projects.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SnapshotStorage for JsonFileStorage {
    fn read(&self) -> StorageResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Read(format!("{}: {e}", self.path.display()))),
        }
    }

    fn write(&self, snapshot: &str) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| StorageError::Unavailable(format!("{}: {e}", parent.display())))?;
            }
        }

        // Readers never see a half-written snapshot.
        let temp_path = self.temp_path();
        fs::write(&temp_path, snapshot)
            .map_err(|e| StorageError::Write(format!("{}: {e}", temp_path.display())))?;
        fs::rename(&temp_path, &self.path)
            .map_err(|e| StorageError::Write(format!("{}: {e}", self.path.display())))?;

        tracing::debug!("Wrote {} bytes to {}", snapshot.len(), self.path.display());
        Ok(())
    }
}
