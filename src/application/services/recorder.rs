//! Channel recorder - Owns per-channel log files and writes log lines

use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::application::errors::StorageError;
use crate::domain::entities::EntryKind;
use crate::domain::traits::{Clock, LogStore, LogWriter};

const TIME_FORMAT: &str = "%H:%M";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Open log file for one channel
///
/// Dropping the handle flushes and closes the file, so every exit path
/// releases it.
pub struct RecordingHandle {
    path: PathBuf,
    writer: LogWriter,
    failing: bool,
}

impl RecordingHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_line(&mut self, line: &str) -> Result<(), StorageError> {
        writeln!(self.writer, "{}", line)
            .and_then(|_| self.writer.flush())
            .map_err(|source| StorageError::Write {
                path: self.path.clone(),
                source,
            })
    }
}

impl Drop for RecordingHandle {
    fn drop(&mut self) {
        if let Err(e) = self.writer.flush() {
            tracing::warn!(path = %self.path.display(), "Failed to flush log on close: {}", e);
        }
    }
}

/// Result of a start/stop request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordingStatus {
    Started { channel: String, path: PathBuf },
    AlreadyRecording { channel: String, path: PathBuf },
    Stopped { channel: String, path: PathBuf },
    NotRecording { channel: String },
}

impl fmt::Display for RecordingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordingStatus::Started { channel, path } => {
                write!(f, "Start logging {} to {}", channel, path.display())
            }
            RecordingStatus::AlreadyRecording { channel, path } => {
                write!(f, "Already logging {} to {}", channel, path.display())
            }
            RecordingStatus::Stopped { channel, path } => {
                write!(f, "Stopped logging {} to {}", channel, path.display())
            }
            RecordingStatus::NotRecording { channel } => write!(f, "Not logging {}", channel),
        }
    }
}

/// Result of recording one channel event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Written,
    /// The channel is not being recorded
    Skipped,
    /// Write failed again while already failing; not worth another report
    Suppressed,
}

/// Per-channel recording state
pub struct ChannelRecorder {
    directory: PathBuf,
    store: Arc<dyn LogStore>,
    clock: Arc<dyn Clock>,
    sessions: HashMap<String, RecordingHandle>,
}

impl ChannelRecorder {
    pub fn new(
        directory: impl Into<PathBuf>,
        store: Arc<dyn LogStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            directory: directory.into(),
            store,
            clock,
            sessions: HashMap::new(),
        }
    }

    /// Log file path for `channel` on today's date
    pub fn log_path(&self, channel: &str) -> PathBuf {
        let today = self.clock.now().format(DATE_FORMAT);
        let name: String = channel
            .chars()
            .map(|c| if c == '/' || c == '\\' { '_' } else { c })
            .collect();
        self.directory.join(format!("{}-{}.log", today, name))
    }

    fn timestamp(&self) -> String {
        self.clock.now().format(TIME_FORMAT).to_string()
    }

    /// Start recording a channel
    ///
    /// Starting a channel that is already recording changes nothing. On an
    /// open failure no handle is registered.
    pub fn start(&mut self, channel: &str) -> Result<RecordingStatus, StorageError> {
        if let Some(handle) = self.sessions.get(channel) {
            return Ok(RecordingStatus::AlreadyRecording {
                channel: channel.to_string(),
                path: handle.path.clone(),
            });
        }

        let path = self.log_path(channel);
        let writer = self.store.open_append(&path)?;
        let mut handle = RecordingHandle {
            path: path.clone(),
            writer,
            failing: false,
        };
        handle.write_line(&format!("----- Started logging at {} -----", self.timestamp()))?;

        tracing::info!(channel, path = %path.display(), "Recording started");
        self.sessions.insert(channel.to_string(), handle);

        Ok(RecordingStatus::Started {
            channel: channel.to_string(),
            path,
        })
    }

    /// Stop recording a channel, closing its file
    ///
    /// The handle is removed even when the stop marker cannot be written;
    /// that failure comes back alongside the status.
    pub fn stop(&mut self, channel: &str) -> (RecordingStatus, Option<StorageError>) {
        let Some(mut handle) = self.sessions.remove(channel) else {
            let status = RecordingStatus::NotRecording {
                channel: channel.to_string(),
            };
            return (status, None);
        };

        let marker = format!("----- Stopped logging at {} -----", self.timestamp());
        let failure = handle.write_line(&marker).err();
        if let Some(e) = &failure {
            tracing::warn!(channel, "Failed to write stop marker: {}", e);
        }

        tracing::info!(channel, path = %handle.path.display(), "Recording stopped");
        let status = RecordingStatus::Stopped {
            channel: channel.to_string(),
            path: handle.path.clone(),
        };
        (status, failure)
    }

    /// Stop every active recording, in channel name order
    pub fn stop_all(&mut self) -> Vec<(RecordingStatus, Option<StorageError>)> {
        self.recording_channels()
            .into_iter()
            .map(|channel| self.stop(&channel))
            .collect()
    }

    pub fn is_recording(&self, channel: &str) -> bool {
        self.sessions.contains_key(channel)
    }

    /// Channels currently being recorded, sorted
    pub fn recording_channels(&self) -> Vec<String> {
        let mut channels: Vec<String> = self.sessions.keys().cloned().collect();
        channels.sort();
        channels
    }

    /// Append one channel event to its log, if the channel is recording
    ///
    /// Only the first failure of a run of failed writes is returned as an
    /// error; the handle stays registered so later writes are retried.
    pub fn record(
        &mut self,
        channel: &str,
        kind: EntryKind,
        sender: &str,
        body: &str,
    ) -> Result<RecordOutcome, StorageError> {
        if !self.sessions.contains_key(channel) {
            return Ok(RecordOutcome::Skipped);
        }

        let line = kind.format(&self.timestamp(), sender, body);
        let Some(handle) = self.sessions.get_mut(channel) else {
            return Ok(RecordOutcome::Skipped);
        };

        match handle.write_line(&line) {
            Ok(()) => {
                handle.failing = false;
                Ok(RecordOutcome::Written)
            }
            Err(e) if handle.failing => {
                tracing::debug!(channel, "Log write still failing: {}", e);
                Ok(RecordOutcome::Suppressed)
            }
            Err(e) => {
                handle.failing = true;
                tracing::warn!(channel, "Log write failed: {}", e);
                Err(e)
            }
        }
    }
}
