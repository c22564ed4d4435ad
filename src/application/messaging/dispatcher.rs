//! Command dispatcher - Authorizes operator commands and routes them

use crate::application::errors::{CommandError, StorageError};
use crate::application::services::recorder::{ChannelRecorder, RecordingStatus};
use crate::domain::entities::{ChannelAction, Command, LogAction, Operator};
use crate::domain::traits::Transport;
use super::parser::CommandParser;

pub const STARTED_EMOTE: &str = "started recording activity in this channel";
pub const STOPPED_EMOTE: &str = "stopped recording activity in this channel";

const HELP: &[&str] = &[
    "Available commands:",
    "help -- A list of available commands",
    "info -- Tell what I'm doing",
    "channel join <channel> [<channel> ...] -- Join channels",
    "channel leave <channel> [<channel> ...] -- Leave channels",
    "log start <channel> [<channel> ...] -- Start recording channels",
    "log stop <channel> [<channel> ...] -- Stop recording channels",
    "log pause|resume <channel> ... -- Accepted, not implemented yet",
    "bye -- Let the secretary cease to exist.",
];

/// What the controller should do after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Continue,
    Shutdown,
}

/// Executes commands from the operator and refuses everyone else
pub struct CommandDispatcher {
    operator: Operator,
    parser: CommandParser,
}

impl CommandDispatcher {
    pub fn new(operator: Operator) -> Self {
        Self {
            operator,
            parser: CommandParser::new(),
        }
    }

    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    /// Handle text addressed to the bot by `sender`
    ///
    /// Never fails: every problem is reported back as text.
    pub async fn handle<T: Transport + ?Sized>(
        &self,
        transport: &T,
        recorder: &mut ChannelRecorder,
        sender: &str,
        text: &str,
    ) -> DispatchOutcome {
        if !self.operator.is(sender) {
            tracing::warn!(sender, "Refused command from non-operator");
            let refusal = CommandError::AuthorizationDenied.to_string();
            if let Err(e) = transport.send_notice(sender, &refusal).await {
                tracing::warn!(sender, "Failed to send refusal: {}", e);
            }
            return DispatchOutcome::Continue;
        }

        let command = match self.parser.parse(text) {
            Ok(command) => command,
            Err(e) => {
                tracing::debug!("Malformed command {:?}: {:?}", text, e);
                self.report(transport, &e.to_string()).await;
                if let Some(usage) = e.usage() {
                    self.report(transport, usage).await;
                }
                return DispatchOutcome::Continue;
            }
        };

        tracing::debug!(verb = command.verb(), "Dispatching command: {}", command);

        match command {
            Command::Help => {
                for line in HELP {
                    self.report(transport, line).await;
                }
            }
            Command::Info => self.info(transport, recorder).await,
            Command::Channel { action, channels } => {
                self.channel(transport, action, &channels).await;
            }
            Command::Log { action, channels } => {
                self.log(transport, recorder, action, &channels).await;
            }
            Command::Bye => {
                self.release_all(transport, recorder).await;
                return DispatchOutcome::Shutdown;
            }
            Command::Unknown(raw) => {
                self.report(transport, &CommandError::NotUnderstood(raw).to_string()).await;
            }
        }

        DispatchOutcome::Continue
    }

    /// Send a line to the operator
    pub async fn report<T: Transport + ?Sized>(&self, transport: &T, text: &str) {
        if let Err(e) = transport.send_private(self.operator.identity(), text).await {
            tracing::warn!("Failed to report to operator: {}", e);
        }
    }

    async fn channel<T: Transport + ?Sized>(
        &self,
        transport: &T,
        action: ChannelAction,
        channels: &[String],
    ) {
        for channel in channels {
            let result = match action {
                ChannelAction::Join => {
                    self.report(transport, &format!("Joining channel {}...", channel)).await;
                    transport.join(channel).await
                }
                ChannelAction::Leave => {
                    self.report(transport, &format!("Leaving channel {}...", channel)).await;
                    transport.part(channel).await
                }
            };
            if let Err(e) = result {
                tracing::warn!(channel = %channel, "Channel request failed: {}", e);
                let report = format!("Could not reach channel {}: {}", channel, e);
                self.report(transport, &report).await;
            }
        }
    }

    async fn log<T: Transport + ?Sized>(
        &self,
        transport: &T,
        recorder: &mut ChannelRecorder,
        action: LogAction,
        channels: &[String],
    ) {
        for channel in channels {
            match action {
                LogAction::Start => match recorder.start(channel) {
                    Ok(status) => self.announce(transport, status).await,
                    Err(e) => {
                        tracing::error!(channel = %channel, "Failed to start recording: {}", e);
                        let report = format!("Could not start logging {}: {}", channel, e);
                        self.report(transport, &report).await;
                    }
                },
                LogAction::Stop => {
                    let (status, failure) = recorder.stop(channel);
                    self.closed(transport, status, failure).await;
                }
                LogAction::Pause | LogAction::Resume => {
                    tracing::debug!(
                        channel = %channel,
                        action = action.as_str(),
                        "Inert log action ignored"
                    );
                }
            }
        }
    }

    /// Emote a state change in the channel and report the status line
    async fn announce<T: Transport + ?Sized>(&self, transport: &T, status: RecordingStatus) {
        let emote = match &status {
            RecordingStatus::Started { channel, .. } => Some((channel, STARTED_EMOTE)),
            RecordingStatus::Stopped { channel, .. } => Some((channel, STOPPED_EMOTE)),
            _ => None,
        };
        if let Some((channel, text)) = emote {
            if let Err(e) = transport.emote(channel, text).await {
                tracing::warn!(channel = %channel, "Failed to emote: {}", e);
                self.report(transport, &format!("Could not notify {}: {}", channel, e)).await;
            }
        }
        self.report(transport, &status.to_string()).await;
    }

    /// Announce a stop, then report a stop marker that could not be written
    async fn closed<T: Transport + ?Sized>(
        &self,
        transport: &T,
        status: RecordingStatus,
        failure: Option<StorageError>,
    ) {
        let channel = match &status {
            RecordingStatus::Stopped { channel, .. } => Some(channel.clone()),
            _ => None,
        };
        self.announce(transport, status).await;
        if let (Some(channel), Some(e)) = (channel, failure) {
            let report = format!("Could not write log for {}: {}", channel, e);
            self.report(transport, &report).await;
        }
    }

    async fn info<T: Transport + ?Sized>(&self, transport: &T, recorder: &ChannelRecorder) {
        self.report(transport, "------").await;
        self.report(transport, "Working in the following channels:").await;
        for channel in transport.current_channels() {
            let line = format!("{}\t Log: {}", channel, recorder.is_recording(&channel));
            self.report(transport, &line).await;
        }
        self.report(transport, "------").await;
    }

    /// Close every recording before the connection goes away
    pub async fn release_all<T: Transport + ?Sized>(
        &self,
        transport: &T,
        recorder: &mut ChannelRecorder,
    ) {
        for (status, failure) in recorder.stop_all() {
            self.closed(transport, status, failure).await;
        }
    }
}
