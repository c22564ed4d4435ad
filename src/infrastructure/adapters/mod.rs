//! Platform adapters

pub mod irc;
