use std::fmt;

/// Sub-action of the `channel` verb
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelAction {
    Join,
    Leave,
}

impl ChannelAction {
    pub fn from_word(word: &str) -> Option<Self> {
        match word {
            "join" => Some(ChannelAction::Join),
            "leave" => Some(ChannelAction::Leave),
            _ => None,
        }
    }
}

/// Sub-action of the `log` verb
///
/// `Pause` and `Resume` are part of the grammar but have no effect yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogAction {
    Start,
    Stop,
    Pause,
    Resume,
}

impl LogAction {
    pub fn from_word(word: &str) -> Option<Self> {
        match word {
            "start" => Some(LogAction::Start),
            "stop" => Some(LogAction::Stop),
            "pause" => Some(LogAction::Pause),
            "resume" => Some(LogAction::Resume),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogAction::Start => "start",
            LogAction::Stop => "stop",
            LogAction::Pause => "pause",
            LogAction::Resume => "resume",
        }
    }
}

/// A parsed operator command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Info,
    Channel {
        action: ChannelAction,
        channels: Vec<String>,
    },
    Log {
        action: LogAction,
        channels: Vec<String>,
    },
    Bye,
    /// Anything whose verb is not recognized, kept verbatim
    Unknown(String),
}

impl Command {
    pub fn verb(&self) -> &str {
        match self {
            Command::Help => "help",
            Command::Info => "info",
            Command::Channel { .. } => "channel",
            Command::Log { .. } => "log",
            Command::Bye => "bye",
            Command::Unknown(_) => "unknown",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Channel { action, channels } => {
                let action = match action {
                    ChannelAction::Join => "join",
                    ChannelAction::Leave => "leave",
                };
                write!(f, "channel {} {}", action, channels.join(" "))
            }
            Command::Log { action, channels } => {
                write!(f, "log {} {}", action.as_str(), channels.join(" "))
            }
            Command::Unknown(raw) => write!(f, "{}", raw),
            other => write!(f, "{}", other.verb()),
        }
    }
}
