//! Application layer errors

use std::path::PathBuf;
use thiserror::Error;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Operator command errors
///
/// The `Display` text of each variant is what gets reported back on the wire.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("I'm not allowed to talk with you")]
    AuthorizationDenied,

    #[error("You must indicate at least one channel for this action.")]
    MissingChannels,

    #[error("Unknown action for channels command")]
    UnknownChannelAction(String),

    #[error("Unknown action for log command")]
    UnknownLogAction(String),

    #[error("Not understood: {0}")]
    NotUnderstood(String),
}

impl CommandError {
    /// Usage line sent after the error, if any
    pub fn usage(&self) -> Option<&'static str> {
        match self {
            CommandError::UnknownChannelAction(_) => {
                Some("Usage: channel <join|leave> <channel> ...")
            }
            CommandError::UnknownLogAction(_) => {
                Some("Usage: log <start|stop|pause|resume> <channel> ...")
            }
            _ => None,
        }
    }
}

/// Channel log storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("cannot open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Network transport errors
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Connection closed")]
    Disconnected,

    #[error("Codec error: {0}")]
    Codec(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
