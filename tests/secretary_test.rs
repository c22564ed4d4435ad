//! Operator command and channel recording scenarios
//! Run with: cargo test --test secretary_test

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeSet;
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use irc_secretary::application::errors::{StorageError, TransportError};
use irc_secretary::application::messaging::{CommandDispatcher, DispatchOutcome};
use irc_secretary::application::services::controller::GREETING;
use irc_secretary::application::services::{BotController, ChannelRecorder};
use irc_secretary::domain::entities::{InboundEvent, Operator};
use irc_secretary::domain::traits::{Clock, LogStore, LogWriter, Transport};
use irc_secretary::infrastructure::storage::FileLogStore;

const BOSS: &str = "boss";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Join(String),
    Part(String),
    Private(String, String),
    Notice(String, String),
    Emote(String, String),
    Quit(String),
}

/// In-memory transport; joins take effect immediately
///
/// Operations named with [`MockTransport::fail`] are recorded and then
/// rejected as if the connection had dropped.
#[derive(Default, Clone)]
struct MockTransport {
    calls: Arc<Mutex<Vec<Call>>>,
    channels: Arc<Mutex<BTreeSet<String>>>,
    failing: Arc<Mutex<BTreeSet<&'static str>>>,
}

impl MockTransport {
    fn fail(&self, operation: &'static str) {
        self.failing.lock().unwrap().insert(operation);
    }

    fn check(&self, operation: &'static str) -> Result<(), TransportError> {
        if self.failing.lock().unwrap().contains(operation) {
            Err(TransportError::Disconnected)
        } else {
            Ok(())
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn reports(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Private(target, text) if target == BOSS => Some(text),
                _ => None,
            })
            .collect()
    }

    fn emotes(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Emote(..)))
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn join(&self, channel: &str) -> Result<(), TransportError> {
        self.push(Call::Join(channel.to_string()));
        self.check("join")?;
        self.channels.lock().unwrap().insert(channel.to_string());
        Ok(())
    }

    async fn part(&self, channel: &str) -> Result<(), TransportError> {
        self.push(Call::Part(channel.to_string()));
        self.check("part")?;
        self.channels.lock().unwrap().remove(channel);
        Ok(())
    }

    async fn send_private(&self, target: &str, text: &str) -> Result<(), TransportError> {
        self.push(Call::Private(target.to_string(), text.to_string()));
        Ok(())
    }

    async fn send_notice(&self, target: &str, text: &str) -> Result<(), TransportError> {
        self.push(Call::Notice(target.to_string(), text.to_string()));
        Ok(())
    }

    async fn emote(&self, channel: &str, text: &str) -> Result<(), TransportError> {
        self.push(Call::Emote(channel.to_string(), text.to_string()));
        self.check("emote")
    }

    async fn quit(&self, reason: &str) -> Result<(), TransportError> {
        self.push(Call::Quit(reason.to_string()));
        Ok(())
    }

    fn current_channels(&self) -> BTreeSet<String> {
        self.channels.lock().unwrap().clone()
    }
}

struct FixedClock(NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

fn at(h: u32, m: u32) -> Arc<dyn Clock> {
    let when = NaiveDate::from_ymd_opt(2024, 3, 9)
        .and_then(|d| d.and_hms_opt(h, m, 0))
        .unwrap();
    Arc::new(FixedClock(when))
}

/// Log store whose files fail to write while `broken` is set
#[derive(Default)]
struct FlakyStore {
    broken: Arc<AtomicBool>,
}

struct FlakyWriter(Arc<AtomicBool>);

impl Write for FlakyWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.0.load(Ordering::SeqCst) {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        } else {
            Ok(buf.len())
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl LogStore for FlakyStore {
    fn open_append(&self, _path: &Path) -> Result<LogWriter, StorageError> {
        Ok(Box::new(FlakyWriter(self.broken.clone())))
    }
}

fn flaky_recorder() -> (ChannelRecorder, Arc<AtomicBool>) {
    let store = FlakyStore::default();
    let broken = store.broken.clone();
    (ChannelRecorder::new("/logs", Arc::new(store), at(10, 5)), broken)
}

fn recorder(dir: &Path) -> ChannelRecorder {
    ChannelRecorder::new(dir, Arc::new(FileLogStore::new()), at(10, 5))
}

fn log_file(dir: &Path, channel: &str) -> std::path::PathBuf {
    dir.join(format!("2024-03-09-{}.log", channel))
}

fn private(sender: &str, body: &str) -> InboundEvent {
    InboundEvent::PrivateMessage {
        sender: sender.to_string(),
        body: body.to_string(),
    }
}

fn said(channel: &str, sender: &str, body: &str) -> InboundEvent {
    InboundEvent::ChannelMessage {
        channel: channel.to_string(),
        sender: sender.to_string(),
        body: body.to_string(),
    }
}

fn files_in(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

#[tokio::test]
async fn test_non_operator_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let transport = MockTransport::default();
    let mut recorder = recorder(dir.path());
    let dispatcher = CommandDispatcher::new(Operator::new(BOSS));

    for text in ["bye", "log start #proj", "channel join #proj", "help", "whatever", ""] {
        transport.clear();
        let outcome = dispatcher.handle(&transport, &mut recorder, "mallory", text).await;

        assert_eq!(outcome, DispatchOutcome::Continue);
        assert_eq!(
            transport.calls(),
            vec![Call::Notice("mallory".to_string(), "I'm not allowed to talk with you".to_string())]
        );
    }
    assert!(recorder.recording_channels().is_empty());
    assert_eq!(files_in(dir.path()), 0);
}

#[tokio::test]
async fn test_identity_match_is_exact() {
    let dir = tempfile::tempdir().unwrap();
    let transport = MockTransport::default();
    let mut recorder = recorder(dir.path());
    let dispatcher = CommandDispatcher::new(Operator::new(BOSS));

    dispatcher.handle(&transport, &mut recorder, "Boss", "channel join #proj").await;
    assert!(transport.current_channels().is_empty());
    assert!(matches!(transport.calls().as_slice(), [Call::Notice(..)]));
}

#[tokio::test]
async fn test_channel_join_in_argument_order() {
    let dir = tempfile::tempdir().unwrap();
    let transport = MockTransport::default();
    let mut recorder = recorder(dir.path());
    let dispatcher = CommandDispatcher::new(Operator::new(BOSS));

    dispatcher.handle(&transport, &mut recorder, BOSS, "channel join #proj #dev").await;

    assert_eq!(
        transport.calls(),
        vec![
            Call::Private(BOSS.to_string(), "Joining channel #proj...".to_string()),
            Call::Join("#proj".to_string()),
            Call::Private(BOSS.to_string(), "Joining channel #dev...".to_string()),
            Call::Join("#dev".to_string()),
        ]
    );

    transport.clear();
    dispatcher.handle(&transport, &mut recorder, BOSS, "channel leave #dev").await;
    assert_eq!(
        transport.calls(),
        vec![
            Call::Private(BOSS.to_string(), "Leaving channel #dev...".to_string()),
            Call::Part("#dev".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_malformed_channel_commands() {
    let dir = tempfile::tempdir().unwrap();
    let transport = MockTransport::default();
    let mut recorder = recorder(dir.path());
    let dispatcher = CommandDispatcher::new(Operator::new(BOSS));

    dispatcher.handle(&transport, &mut recorder, BOSS, "channel join").await;
    assert_eq!(
        transport.reports(),
        vec!["You must indicate at least one channel for this action."]
    );

    transport.clear();
    dispatcher.handle(&transport, &mut recorder, BOSS, "channel hop #proj #dev").await;
    assert_eq!(
        transport.reports(),
        vec![
            "Unknown action for channels command",
            "Usage: channel <join|leave> <channel> ...",
        ]
    );
    assert!(transport.current_channels().is_empty());
}

#[tokio::test]
async fn test_log_start_twice_opens_one_file() {
    let dir = tempfile::tempdir().unwrap();
    let transport = MockTransport::default();
    let mut recorder = recorder(dir.path());
    let dispatcher = CommandDispatcher::new(Operator::new(BOSS));

    dispatcher.handle(&transport, &mut recorder, BOSS, "channel join #proj #dev").await;
    transport.clear();

    dispatcher.handle(&transport, &mut recorder, BOSS, "log start #proj").await;
    dispatcher.handle(&transport, &mut recorder, BOSS, "log start #proj").await;

    assert_eq!(files_in(dir.path()), 1);
    assert_eq!(
        transport.emotes(),
        vec![Call::Emote(
            "#proj".to_string(),
            "started recording activity in this channel".to_string()
        )]
    );
    let content = std::fs::read_to_string(log_file(dir.path(), "#proj")).unwrap();
    assert_eq!(content, "----- Started logging at 10:05 -----\n");

    let path = log_file(dir.path(), "#proj");
    assert_eq!(
        transport.reports(),
        vec![
            format!("Start logging #proj to {}", path.display()),
            format!("Already logging #proj to {}", path.display()),
        ]
    );

    transport.clear();
    dispatcher.handle(&transport, &mut recorder, BOSS, "info").await;
    assert_eq!(
        transport.reports(),
        vec![
            "------",
            "Working in the following channels:",
            "#dev\t Log: false",
            "#proj\t Log: true",
            "------",
        ]
    );
}

#[tokio::test]
async fn test_log_stop_without_start_is_noop() {
    let dir = tempfile::tempdir().unwrap();
    let transport = MockTransport::default();
    let mut recorder = recorder(dir.path());
    let dispatcher = CommandDispatcher::new(Operator::new(BOSS));

    dispatcher.handle(&transport, &mut recorder, BOSS, "log stop #proj").await;

    assert!(transport.emotes().is_empty());
    assert_eq!(transport.reports(), vec!["Not logging #proj"]);
    assert_eq!(files_in(dir.path()), 0);
}

#[tokio::test]
async fn test_pause_and_resume_are_inert() {
    let dir = tempfile::tempdir().unwrap();
    let transport = MockTransport::default();
    let mut recorder = recorder(dir.path());
    let dispatcher = CommandDispatcher::new(Operator::new(BOSS));

    dispatcher.handle(&transport, &mut recorder, BOSS, "log pause #proj").await;
    dispatcher.handle(&transport, &mut recorder, BOSS, "log resume #proj").await;

    assert!(transport.calls().is_empty());
    assert!(!recorder.is_recording("#proj"));
}

#[tokio::test]
async fn test_unknown_log_action_reports_usage() {
    let dir = tempfile::tempdir().unwrap();
    let transport = MockTransport::default();
    let mut recorder = recorder(dir.path());
    let dispatcher = CommandDispatcher::new(Operator::new(BOSS));

    dispatcher.handle(&transport, &mut recorder, BOSS, "log rotate #proj").await;

    assert_eq!(
        transport.reports(),
        vec![
            "Unknown action for log command",
            "Usage: log <start|stop|pause|resume> <channel> ...",
        ]
    );
    assert_eq!(files_in(dir.path()), 0);
}

#[tokio::test]
async fn test_open_failure_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let transport = MockTransport::default();
    let mut recorder = recorder(&dir.path().join("missing"));
    let dispatcher = CommandDispatcher::new(Operator::new(BOSS));

    dispatcher.handle(&transport, &mut recorder, BOSS, "log start #proj").await;

    let reports = transport.reports();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].starts_with("Could not start logging #proj: cannot open"));
    assert!(transport.emotes().is_empty());
    assert!(!recorder.is_recording("#proj"));
}

#[tokio::test]
async fn test_help_and_unknown_commands() {
    let dir = tempfile::tempdir().unwrap();
    let transport = MockTransport::default();
    let mut recorder = recorder(dir.path());
    let dispatcher = CommandDispatcher::new(Operator::new(BOSS));

    dispatcher.handle(&transport, &mut recorder, BOSS, "help").await;
    let help = transport.reports();
    assert!(help.iter().any(|l| l.starts_with("channel join")));
    assert!(help.iter().any(|l| l.starts_with("log start")));
    assert!(help.iter().any(|l| l.starts_with("bye")));

    transport.clear();
    dispatcher.handle(&transport, &mut recorder, BOSS, "make  minutes").await;
    assert_eq!(transport.reports(), vec!["Not understood: make  minutes"]);
}

#[tokio::test]
async fn test_round_trip_through_controller() {
    let dir = tempfile::tempdir().unwrap();
    let transport = MockTransport::default();
    let mut controller = BotController::new(transport.clone(), Operator::new(BOSS), recorder(dir.path()));

    controller.handle_event(private(BOSS, "log start #proj")).await;
    controller.handle_event(said("#proj", "alice", "hi")).await;
    controller.handle_event(said("#elsewhere", "carol", "not recorded")).await;
    controller.handle_event(private(BOSS, "log stop #proj")).await;
    controller.handle_event(said("#proj", "alice", "after stop")).await;

    let content = std::fs::read_to_string(log_file(dir.path(), "#proj")).unwrap();
    assert_eq!(
        content,
        "----- Started logging at 10:05 -----\n[10:05] <alice> hi\n----- Stopped logging at 10:05 -----\n"
    );
    assert_eq!(files_in(dir.path()), 1);
}

#[tokio::test]
async fn test_actions_use_emote_template() {
    let dir = tempfile::tempdir().unwrap();
    let transport = MockTransport::default();
    let mut controller = BotController::new(transport.clone(), Operator::new(BOSS), recorder(dir.path()));

    controller.handle_event(private(BOSS, "log start #proj")).await;
    controller
        .handle_event(InboundEvent::ChannelAction {
            channel: "#proj".to_string(),
            sender: "bob".to_string(),
            body: "waves".to_string(),
        })
        .await;

    let content = std::fs::read_to_string(log_file(dir.path(), "#proj")).unwrap();
    assert!(content.ends_with("[10:05] \t* bob waves\n"));
}

#[tokio::test]
async fn test_welcome_greets_operator() {
    let dir = tempfile::tempdir().unwrap();
    let transport = MockTransport::default();
    let mut controller = BotController::new(transport.clone(), Operator::new(BOSS), recorder(dir.path()));

    controller.handle_event(InboundEvent::Welcome).await;
    controller
        .handle_event(InboundEvent::NickInUse { nickname: "boss_sec".to_string() })
        .await;

    assert_eq!(transport.calls(), vec![Call::Private(BOSS.to_string(), GREETING.to_string())]);
}

#[tokio::test]
async fn test_bye_closes_recordings_before_quit() {
    let dir = tempfile::tempdir().unwrap();
    let transport = MockTransport::default();
    let controller = BotController::new(transport.clone(), Operator::new(BOSS), recorder(dir.path()));

    let (tx, rx) = mpsc::channel(16);
    tx.send(private(BOSS, "log start #proj #dev")).await.unwrap();
    tx.send(private("mallory", "bye")).await.unwrap();
    tx.send(said("#proj", "alice", "still here")).await.unwrap();
    tx.send(private(BOSS, "bye")).await.unwrap();
    tx.send(said("#proj", "alice", "too late")).await.unwrap();

    controller.run(rx, std::future::pending()).await.unwrap();

    let proj = std::fs::read_to_string(log_file(dir.path(), "#proj")).unwrap();
    assert_eq!(
        proj,
        "----- Started logging at 10:05 -----\n[10:05] <alice> still here\n----- Stopped logging at 10:05 -----\n"
    );
    let dev = std::fs::read_to_string(log_file(dir.path(), "#dev")).unwrap();
    assert!(dev.ends_with("----- Stopped logging at 10:05 -----\n"));

    let calls = transport.calls();
    let quit = calls.iter().position(|c| matches!(c, Call::Quit(_))).unwrap();
    assert_eq!(quit, calls.len() - 1);
    let last_stop = calls
        .iter()
        .rposition(|c| matches!(c, Call::Emote(_, text) if text.starts_with("stopped")))
        .unwrap();
    assert!(last_stop < quit);
    assert_eq!(calls.iter().filter(|c| matches!(c, Call::Quit(_))).count(), 1);
}

#[tokio::test]
async fn test_stream_end_releases_recordings() {
    let dir = tempfile::tempdir().unwrap();
    let transport = MockTransport::default();
    let controller = BotController::new(transport.clone(), Operator::new(BOSS), recorder(dir.path()));

    let (tx, rx) = mpsc::channel(4);
    tx.send(private(BOSS, "log start #proj")).await.unwrap();
    drop(tx);

    controller.run(rx, std::future::pending()).await.unwrap();

    let content = std::fs::read_to_string(log_file(dir.path(), "#proj")).unwrap();
    assert!(content.ends_with("----- Stopped logging at 10:05 -----\n"));
    assert!(!transport.calls().iter().any(|c| matches!(c, Call::Quit(_))));
}

#[tokio::test]
async fn test_shutdown_signal_releases_and_quits() {
    let dir = tempfile::tempdir().unwrap();
    let transport = MockTransport::default();
    let mut controller = BotController::new(transport.clone(), Operator::new(BOSS), recorder(dir.path()));
    controller.handle_event(private(BOSS, "log start #proj")).await;

    // Keep the sender alive so only the signal can end the loop
    let (_tx, rx) = mpsc::channel::<InboundEvent>(4);
    controller.run(rx, async {}).await.unwrap();

    let content = std::fs::read_to_string(log_file(dir.path(), "#proj")).unwrap();
    assert!(content.ends_with("----- Stopped logging at 10:05 -----\n"));
    assert!(matches!(transport.calls().last(), Some(Call::Quit(_))));
}

#[tokio::test]
async fn test_failed_channel_requests_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    let transport = MockTransport::default();
    transport.fail("join");
    let mut recorder = recorder(dir.path());
    let dispatcher = CommandDispatcher::new(Operator::new(BOSS));

    dispatcher.handle(&transport, &mut recorder, BOSS, "channel join #a #b").await;

    assert_eq!(
        transport.calls(),
        vec![
            Call::Private(BOSS.to_string(), "Joining channel #a...".to_string()),
            Call::Join("#a".to_string()),
            Call::Private(BOSS.to_string(), "Could not reach channel #a: Connection closed".to_string()),
            Call::Private(BOSS.to_string(), "Joining channel #b...".to_string()),
            Call::Join("#b".to_string()),
            Call::Private(BOSS.to_string(), "Could not reach channel #b: Connection closed".to_string()),
        ]
    );
    assert!(transport.current_channels().is_empty());

    transport.clear();
    transport.fail("part");
    dispatcher.handle(&transport, &mut recorder, BOSS, "channel leave #a").await;
    assert_eq!(
        transport.reports(),
        vec!["Leaving channel #a...", "Could not reach channel #a: Connection closed"]
    );
}

#[tokio::test]
async fn test_failed_emote_still_records() {
    let dir = tempfile::tempdir().unwrap();
    let transport = MockTransport::default();
    transport.fail("emote");
    let mut recorder = recorder(dir.path());
    let dispatcher = CommandDispatcher::new(Operator::new(BOSS));

    dispatcher.handle(&transport, &mut recorder, BOSS, "log start #proj").await;

    let path = log_file(dir.path(), "#proj");
    assert_eq!(
        transport.reports(),
        vec![
            "Could not notify #proj: Connection closed".to_string(),
            format!("Start logging #proj to {}", path.display()),
        ]
    );
    assert!(recorder.is_recording("#proj"));
}

#[tokio::test]
async fn test_write_failure_reported_once_per_run() {
    let transport = MockTransport::default();
    let (recorder, broken) = flaky_recorder();
    let mut controller = BotController::new(transport.clone(), Operator::new(BOSS), recorder);
    let failures = || {
        transport
            .reports()
            .iter()
            .filter(|r| r.starts_with("Could not write log for #proj: cannot write"))
            .count()
    };

    controller.handle_event(private(BOSS, "log start #proj")).await;
    broken.store(true, Ordering::SeqCst);
    controller.handle_event(said("#proj", "alice", "one")).await;
    controller.handle_event(said("#proj", "alice", "two")).await;
    controller.handle_event(said("#proj", "alice", "three")).await;
    assert_eq!(failures(), 1);

    broken.store(false, Ordering::SeqCst);
    controller.handle_event(said("#proj", "alice", "four")).await;
    assert_eq!(failures(), 1);

    broken.store(true, Ordering::SeqCst);
    controller.handle_event(said("#proj", "alice", "five")).await;
    assert_eq!(failures(), 2);
}

#[tokio::test]
async fn test_stop_marker_failure_is_reported() {
    let transport = MockTransport::default();
    let (mut recorder, broken) = flaky_recorder();
    let dispatcher = CommandDispatcher::new(Operator::new(BOSS));

    dispatcher.handle(&transport, &mut recorder, BOSS, "log start #proj").await;
    transport.clear();
    broken.store(true, Ordering::SeqCst);
    dispatcher.handle(&transport, &mut recorder, BOSS, "log stop #proj").await;

    let reports = transport.reports();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0], "Stopped logging #proj to /logs/2024-03-09-#proj.log");
    assert!(reports[1].starts_with("Could not write log for #proj: cannot write"));
    assert!(reports[1].ends_with("disk full"));
    assert!(!recorder.is_recording("#proj"));
}
