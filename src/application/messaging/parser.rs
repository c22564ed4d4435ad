//! Command parser - Turns operator text into structured commands

use crate::application::errors::CommandError;
use crate::domain::entities::{ChannelAction, Command, LogAction};

/// Parses operator text into [`Command`] values
///
/// The grammar is case-sensitive and whitespace-delimited; the first token
/// is the verb.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandParser;

impl CommandParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse raw operator text
    ///
    /// Unrecognized verbs are not an error: they come back as
    /// [`Command::Unknown`] carrying the raw text.
    pub fn parse(&self, text: &str) -> Result<Command, CommandError> {
        let parts: Vec<&str> = text.split_whitespace().collect();

        match parts.as_slice() {
            ["help"] => Ok(Command::Help),
            ["info"] => Ok(Command::Info),
            ["bye"] => Ok(Command::Bye),
            ["channel", rest @ ..] => {
                let (word, channels) = Self::split_action(rest)?;
                let action = ChannelAction::from_word(word)
                    .ok_or_else(|| CommandError::UnknownChannelAction(word.to_string()))?;
                Ok(Command::Channel { action, channels })
            }
            ["log", rest @ ..] => {
                let (word, channels) = Self::split_action(rest)?;
                let action = LogAction::from_word(word)
                    .ok_or_else(|| CommandError::UnknownLogAction(word.to_string()))?;
                Ok(Command::Log { action, channels })
            }
            _ => Ok(Command::Unknown(text.to_string())),
        }
    }

    /// Split `<action> <channel> [<channel> ...]`, requiring at least one channel
    fn split_action<'a>(rest: &[&'a str]) -> Result<(&'a str, Vec<String>), CommandError> {
        match rest {
            [action, channels @ ..] if !channels.is_empty() => {
                Ok((*action, channels.iter().map(|c| c.to_string()).collect()))
            }
            _ => Err(CommandError::MissingChannels),
        }
    }
}
