//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use crate::application::errors::ConfigError;
use crate::domain::entities::Operator;

pub const DEFAULT_PORT: u16 = 6667;

/// Bot configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub bot: BotConfig,
    pub server: ServerConfig,
    pub operator: Option<String>,
    pub recording: RecordingConfig,
    pub runtime: RuntimeConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BotConfig {
    /// Fixed nickname; derived from the operator when unset
    pub nickname: Option<String>,
    pub nick_suffix: String,
    pub realname: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RecordingConfig {
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RuntimeConfig {
    /// Capacity of the inbound event queue
    pub event_queue: usize,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            nickname: None,
            nick_suffix: "_sec".to_string(),
            realname: "IRC secretary".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("/tmp"),
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { event_queue: 256 }
    }
}

/// `host[:port]` as given on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddress {
    pub host: String,
    pub port: u16,
}

impl FromStr for ServerAddress {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = match s.split_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| ConfigError::InvalidValue(format!("Erroneous port: {}", port)))?;
                (host, port)
            }
            None => (s, DEFAULT_PORT),
        };
        if host.is_empty() {
            return Err(ConfigError::MissingField("server host".to_string()));
        }
        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))
    }

    /// Override fields from `SECRETARY_*` environment variables
    pub fn apply_env(&mut self) {
        if let Ok(server) = std::env::var("SECRETARY_SERVER") {
            match server.parse::<ServerAddress>() {
                Ok(address) => self.set_server(address),
                Err(e) => tracing::warn!("Ignoring SECRETARY_SERVER: {}", e),
            }
        }

        if let Ok(operator) = std::env::var("SECRETARY_OPERATOR") {
            self.operator = Some(operator);
        }

        if let Ok(dir) = std::env::var("SECRETARY_LOG_DIR") {
            self.recording.directory = PathBuf::from(dir);
        }
    }

    pub fn set_server(&mut self, address: ServerAddress) {
        self.server.host = address.host;
        self.server.port = address.port;
    }

    pub fn operator(&self) -> Result<Operator, ConfigError> {
        match self.operator.as_deref() {
            Some(op) if !op.trim().is_empty() => Ok(Operator::new(op.trim())),
            _ => Err(ConfigError::MissingField("operator".to_string())),
        }
    }

    /// Nickname to register with
    pub fn nickname(&self, operator: &Operator) -> String {
        self.bot
            .nickname
            .clone()
            .unwrap_or_else(|| operator.default_nickname(&self.bot.nick_suffix))
    }
}
