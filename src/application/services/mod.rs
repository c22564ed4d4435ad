//! Application services - Recording state and event routing

pub mod controller;
pub mod recorder;

pub use controller::BotController;
pub use recorder::{ChannelRecorder, RecordOutcome, RecordingStatus};
