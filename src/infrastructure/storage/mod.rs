//! File-based channel log storage

use std::fs::OpenOptions;
use std::path::Path;

use crate::application::errors::StorageError;
use crate::domain::traits::{LogStore, LogWriter};

/// Append-mode plain text files on the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct FileLogStore;

impl FileLogStore {
    pub fn new() -> Self {
        Self
    }
}

impl LogStore for FileLogStore {
    fn open_append(&self, path: &Path) -> Result<LogWriter, StorageError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| StorageError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Box::new(file))
    }
}
