//! IRC adapter
//!
//! Reader and writer tasks move lines between the socket and the
//! controller; the controller receives normalized events through a bounded
//! queue so file writes never stall the socket reader indefinitely.

pub mod session;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use irc_proto::line::LineCodec;
use irc_proto::{Command, Message};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::codec::Framed;

use crate::application::errors::TransportError;
use crate::domain::entities::InboundEvent;
use crate::domain::traits::Transport;
use session::Session;

/// Bytes that would end an IRC line early
pub fn sanitize(text: &str) -> String {
    text.chars().filter(|c| *c != '\r' && *c != '\n').collect()
}

/// Connection parameters for [`IrcAdapter::connect`]
#[derive(Debug, Clone)]
pub struct IrcOptions {
    pub host: String,
    pub port: u16,
    pub nickname: String,
    pub realname: String,
    pub event_queue: usize,
}

/// IRC connection implementing [`Transport`]
pub struct IrcAdapter {
    outbound: mpsc::UnboundedSender<Message>,
    session: Arc<Mutex<Session>>,
    writer: Mutex<Option<JoinHandle<()>>>,
}

impl IrcAdapter {
    /// Connect, register, and start the reader/writer tasks
    pub async fn connect(
        options: IrcOptions,
    ) -> Result<(Self, mpsc::Receiver<InboundEvent>), TransportError> {
        tracing::info!(
            host = %options.host,
            port = options.port,
            nickname = %options.nickname,
            "Connecting"
        );
        let stream = TcpStream::connect((options.host.as_str(), options.port)).await?;
        // Undecodable bytes become U+FFFD instead of failing the stream
        let codec = LineCodec::new("utf-8").map_err(|e| TransportError::Codec(e.to_string()))?;
        let (mut sink, mut lines) = Framed::new(stream, codec).split();

        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();
        let (event_tx, event_rx) = mpsc::channel(options.event_queue.max(1));
        let session = Arc::new(Mutex::new(Session::new(options.nickname.clone())));

        let writer = tokio::spawn(async move {
            while let Some(message) = out_rx.recv().await {
                let quitting = matches!(message.command, Command::QUIT(_));
                let line = message.to_string();
                tracing::trace!(">> {}", line.trim_end());
                if let Err(e) = sink.send(line).await {
                    tracing::error!("Failed to write to server: {}", e);
                    break;
                }
                if quitting {
                    break;
                }
            }
        });

        let reader_session = session.clone();
        let reply_tx = out_tx.clone();
        tokio::spawn(async move {
            while let Some(result) = lines.next().await {
                let raw = match result {
                    Ok(raw) => raw,
                    Err(e) => {
                        tracing::warn!("Skipping unreadable line: {}", e);
                        continue;
                    }
                };
                tracing::trace!("<< {}", raw.trim_end());

                let effect = lock(&reader_session).handle_line(&raw);
                if let Some(reply) = effect.reply {
                    let _ = reply_tx.send(reply);
                }
                if let Some(event) = effect.event {
                    if event_tx.send(event).await.is_err() {
                        break;
                    }
                }
                if effect.closed {
                    break;
                }
            }
            tracing::info!("Connection closed by server");
        });

        let adapter = Self {
            outbound: out_tx,
            session,
            writer: Mutex::new(Some(writer)),
        };
        adapter.send(Command::NICK(options.nickname.clone()))?;
        adapter.send(Command::USER(
            options.nickname.clone(),
            "0".to_string(),
            sanitize(&options.realname),
        ))?;

        Ok((adapter, event_rx))
    }

    fn send(&self, command: Command) -> Result<(), TransportError> {
        self.outbound
            .send(Message::from(command))
            .map_err(|_| TransportError::Disconnected)
    }
}

fn lock(session: &Mutex<Session>) -> MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl Transport for IrcAdapter {
    async fn join(&self, channel: &str) -> Result<(), TransportError> {
        self.send(Command::JOIN(sanitize(channel), None, None))
    }

    async fn part(&self, channel: &str) -> Result<(), TransportError> {
        self.send(Command::PART(sanitize(channel), None))
    }

    async fn send_private(&self, target: &str, text: &str) -> Result<(), TransportError> {
        self.send(Command::PRIVMSG(sanitize(target), sanitize(text)))
    }

    async fn send_notice(&self, target: &str, text: &str) -> Result<(), TransportError> {
        self.send(Command::NOTICE(sanitize(target), sanitize(text)))
    }

    async fn emote(&self, channel: &str, text: &str) -> Result<(), TransportError> {
        self.send(Command::PRIVMSG(
            sanitize(channel),
            format!("\u{1}ACTION {}\u{1}", sanitize(text)),
        ))
    }

    async fn quit(&self, reason: &str) -> Result<(), TransportError> {
        self.send(Command::QUIT(Some(sanitize(reason))))?;
        let writer = self
            .writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(writer) = writer {
            writer
                .await
                .map_err(|e| TransportError::Codec(format!("writer task failed: {}", e)))?;
        }
        Ok(())
    }

    fn current_channels(&self) -> BTreeSet<String> {
        lock(&self.session).channels().clone()
    }
}
