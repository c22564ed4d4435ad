use std::io::Write;
use std::path::Path;
use crate::application::errors::StorageError;

/// Writer handed out by a [`LogStore`]
pub type LogWriter = Box<dyn Write + Send + Sync>;

/// LogStore trait - abstraction for append-only channel log files
pub trait LogStore: Send + Sync {
    /// Open `path` for appending, creating it when absent
    fn open_append(&self, path: &Path) -> Result<LogWriter, StorageError>;
}
