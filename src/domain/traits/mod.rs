//! Domain traits - Abstractions for infrastructure implementations

pub mod clock;
pub mod store;
pub mod transport;

pub use clock::{Clock, SystemClock};
pub use store::{LogStore, LogWriter};
pub use transport::Transport;
