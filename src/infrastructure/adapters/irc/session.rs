//! Connection-level IRC state and event normalization

use irc_proto::{ChannelExt, Command, Message, Prefix, Response};
use std::collections::BTreeSet;

use crate::domain::entities::InboundEvent;

const CTCP_MARK: char = '\u{1}';

/// What one inbound line produced
#[derive(Debug, Default, PartialEq)]
pub struct LineEffect {
    pub event: Option<InboundEvent>,
    pub reply: Option<Message>,
    pub closed: bool,
}

impl LineEffect {
    fn event(event: InboundEvent) -> Self {
        Self {
            event: Some(event),
            ..Self::default()
        }
    }

    fn reply(command: Command) -> Self {
        Self {
            reply: Some(Message::from(command)),
            ..Self::default()
        }
    }
}

/// Body of a CTCP ACTION (`/me`), if `text` is one
pub fn ctcp_action(text: &str) -> Option<&str> {
    text.strip_prefix(CTCP_MARK)?
        .strip_prefix("ACTION ")
        .map(|body| body.trim_end_matches(CTCP_MARK))
}

/// Whether `text` is any CTCP request
fn is_ctcp(text: &str) -> bool {
    text.starts_with(CTCP_MARK)
}

/// Nickname and channel membership as seen by the server
#[derive(Debug, Clone)]
pub struct Session {
    nickname: String,
    channels: BTreeSet<String>,
}

impl Session {
    pub fn new(nickname: impl Into<String>) -> Self {
        Self {
            nickname: nickname.into(),
            channels: BTreeSet::new(),
        }
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    pub fn channels(&self) -> &BTreeSet<String> {
        &self.channels
    }

    fn is_me(&self, nick: Option<&str>) -> bool {
        nick.is_some_and(|n| n.eq_ignore_ascii_case(&self.nickname))
    }

    /// Apply one raw line, updating membership and normalizing events
    pub fn handle_line(&mut self, raw: &str) -> LineEffect {
        match raw.parse::<Message>() {
            Ok(message) => self.handle_message(&message),
            Err(e) => {
                tracing::debug!("Unparseable line {:?}: {}", raw, e);
                LineEffect::default()
            }
        }
    }

    pub fn handle_message(&mut self, message: &Message) -> LineEffect {
        let from_me = self.is_me(message.source_nickname());

        match &message.command {
            Command::PING(server, _) => LineEffect::reply(Command::PONG(server.clone(), None)),
            Command::Response(Response::RPL_WELCOME, _) => LineEffect::event(InboundEvent::Welcome),
            Command::Response(Response::ERR_NICKNAMEINUSE, args) => {
                let taken = args.get(1).cloned().unwrap_or_else(|| self.nickname.clone());
                self.nickname = format!("{}_", taken);
                tracing::info!(taken = %taken, retry = %self.nickname, "Nickname in use");
                LineEffect {
                    event: Some(InboundEvent::NickInUse { nickname: taken }),
                    reply: Some(Message::from(Command::NICK(self.nickname.clone()))),
                    closed: false,
                }
            }
            Command::NICK(new) if from_me => {
                self.nickname = new.clone();
                LineEffect::default()
            }
            Command::JOIN(chanlist, _, _) if from_me => {
                for channel in chanlist.split(',') {
                    tracing::info!(channel, "Joined");
                    self.channels.insert(channel.to_string());
                }
                LineEffect::default()
            }
            Command::PART(chanlist, _) if from_me => {
                for channel in chanlist.split(',') {
                    tracing::info!(channel, "Left");
                    self.channels.remove(channel);
                }
                LineEffect::default()
            }
            Command::KICK(channel, user, _) if self.is_me(Some(user)) => {
                tracing::warn!(channel = %channel, "Kicked");
                self.channels.remove(channel);
                LineEffect::default()
            }
            Command::PRIVMSG(target, text) => self.message(message, target, text, false),
            Command::NOTICE(target, text) => self.message(message, target, text, true),
            Command::ERROR(reason) => {
                tracing::warn!("Server closed the link: {}", reason);
                LineEffect {
                    closed: true,
                    ..LineEffect::default()
                }
            }
            _ => LineEffect::default(),
        }
    }

    fn message(&self, message: &Message, target: &str, text: &str, notice: bool) -> LineEffect {
        // Only users carry a nick!user@host prefix; server notices are skipped
        let sender = match &message.prefix {
            Some(Prefix::Nickname(nick, user, host)) if !user.is_empty() || !host.is_empty() => {
                nick.clone()
            }
            _ => return LineEffect::default(),
        };

        if target.is_channel_name() {
            if notice {
                return LineEffect::default();
            }
            let channel = target.to_string();
            if let Some(action) = ctcp_action(text) {
                return LineEffect::event(InboundEvent::ChannelAction {
                    channel,
                    sender,
                    body: action.to_string(),
                });
            }
            if is_ctcp(text) {
                return LineEffect::default();
            }
            return LineEffect::event(InboundEvent::ChannelMessage {
                channel,
                sender,
                body: text.to_string(),
            });
        }

        if !self.is_me(Some(target)) || is_ctcp(text) {
            return LineEffect::default();
        }
        LineEffect::event(InboundEvent::PrivateMessage {
            sender,
            body: text.to_string(),
        })
    }
}
