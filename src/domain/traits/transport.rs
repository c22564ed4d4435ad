use async_trait::async_trait;
use std::collections::BTreeSet;
use crate::application::errors::TransportError;

/// Transport trait - outbound side of the chat network connection
#[async_trait]
pub trait Transport: Send + Sync {
    /// Join a channel
    async fn join(&self, channel: &str) -> Result<(), TransportError>;

    /// Leave a channel
    async fn part(&self, channel: &str) -> Result<(), TransportError>;

    /// Send a private message
    async fn send_private(&self, target: &str, text: &str) -> Result<(), TransportError>;

    /// Send a notice
    async fn send_notice(&self, target: &str, text: &str) -> Result<(), TransportError>;

    /// Send an action-style message to a channel
    async fn emote(&self, channel: &str, text: &str) -> Result<(), TransportError>;

    /// Disconnect from the server
    async fn quit(&self, reason: &str) -> Result<(), TransportError>;

    /// Channels the bot is currently a member of
    fn current_channels(&self) -> BTreeSet<String>;
}
