//! Domain entities - Core business objects with no external dependencies

pub mod command;
pub mod event;
pub mod operator;

pub use command::{ChannelAction, Command, LogAction};
pub use event::{EntryKind, InboundEvent};
pub use operator::Operator;
