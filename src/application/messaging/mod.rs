//! Operator command handling - parsing and dispatching

pub mod dispatcher;
pub mod parser;

pub use dispatcher::{CommandDispatcher, DispatchOutcome};
pub use parser::CommandParser;
