//! Bot controller - Routes inbound events to the dispatcher or the recorder

use std::future::Future;
use tokio::sync::mpsc;

use crate::application::errors::BotError;
use crate::application::messaging::{CommandDispatcher, DispatchOutcome};
use crate::application::services::recorder::ChannelRecorder;
use crate::domain::entities::{EntryKind, InboundEvent, Operator};
use crate::domain::traits::Transport;

pub const GREETING: &str =
    "Hi boss, I'm here to assist you. Type 'help' to view available commands.";
const QUIT_MESSAGE: &str = "Bye";

/// Single owner of the recording state; processes events one at a time
pub struct BotController<T: Transport> {
    transport: T,
    dispatcher: CommandDispatcher,
    recorder: ChannelRecorder,
}

impl<T: Transport> BotController<T> {
    pub fn new(transport: T, operator: Operator, recorder: ChannelRecorder) -> Self {
        Self {
            transport,
            dispatcher: CommandDispatcher::new(operator),
            recorder,
        }
    }

    /// Process one inbound event
    pub async fn handle_event(&mut self, event: InboundEvent) -> DispatchOutcome {
        match event {
            InboundEvent::Welcome => {
                let operator = self.dispatcher.operator();
                tracing::info!(operator = %operator, "Connected, greeting operator");
                self.dispatcher.report(&self.transport, GREETING).await;
            }
            InboundEvent::NickInUse { nickname } => {
                tracing::info!(nickname = %nickname, "Nickname in use, retrying with another");
            }
            InboundEvent::PrivateMessage { sender, body } => {
                return self
                    .dispatcher
                    .handle(&self.transport, &mut self.recorder, &sender, &body)
                    .await;
            }
            InboundEvent::ChannelMessage { channel, sender, body } => {
                self.record(&channel, EntryKind::Message, &sender, &body).await;
            }
            InboundEvent::ChannelAction { channel, sender, body } => {
                self.record(&channel, EntryKind::Action, &sender, &body).await;
            }
        }
        DispatchOutcome::Continue
    }

    async fn record(&mut self, channel: &str, kind: EntryKind, sender: &str, body: &str) {
        if let Err(e) = self.recorder.record(channel, kind, sender, body) {
            let report = format!("Could not write log for {}: {}", channel, e);
            self.dispatcher.report(&self.transport, &report).await;
        }
    }

    /// Drain the event queue until `bye`, `shutdown` resolving, or the stream ending
    ///
    /// Recordings are always closed before the connection is dropped.
    pub async fn run<S>(
        mut self,
        mut events: mpsc::Receiver<InboundEvent>,
        shutdown: S,
    ) -> Result<(), BotError>
    where
        S: Future<Output = ()>,
    {
        tracing::info!("Starting event loop...");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else { break };
                    if self.handle_event(event).await == DispatchOutcome::Shutdown {
                        tracing::info!("Shutdown requested by operator");
                        self.transport.quit(QUIT_MESSAGE).await?;
                        return Ok(());
                    }
                }
                _ = &mut shutdown => {
                    tracing::info!("Shutdown signal received");
                    self.dispatcher.release_all(&self.transport, &mut self.recorder).await;
                    self.transport.quit(QUIT_MESSAGE).await?;
                    return Ok(());
                }
            }
        }

        tracing::warn!("Event stream closed, releasing recordings");
        for (status, failure) in self.recorder.stop_all() {
            match failure {
                Some(e) => tracing::warn!("{} ({})", status, e),
                None => tracing::info!("{}", status),
            }
        }
        Ok(())
    }
}
