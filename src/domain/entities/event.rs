/// Normalized inbound event delivered by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// Registration with the server completed
    Welcome,
    /// The requested nickname was taken; the transport retries on its own
    NickInUse { nickname: String },
    /// Private message or notice addressed to the bot
    PrivateMessage { sender: String, body: String },
    /// Plain message sent to a channel
    ChannelMessage {
        channel: String,
        sender: String,
        body: String,
    },
    /// Emote (`/me`) sent to a channel
    ChannelAction {
        channel: String,
        sender: String,
        body: String,
    },
}

/// Kind of a recorded channel line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Message,
    Action,
}

impl EntryKind {
    /// Format one log line (without trailing newline)
    pub fn format(&self, time: &str, sender: &str, body: &str) -> String {
        match self {
            EntryKind::Message => format!("[{}] <{}> {}", time, sender, body),
            EntryKind::Action => format!("[{}] \t* {} {}", time, sender, body),
        }
    }
}
