//! Domain layer - Core types of the secretary with no I/O
//! 
//! This layer contains:
//! - Entities: Inbound events, operator commands, log entry kinds
//! - Traits: Abstractions for infrastructure (Transport, LogStore, Clock)

pub mod entities;
pub mod traits;
