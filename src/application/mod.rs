//! Application layer - Use cases and business logic
//! 
//! This layer contains:
//! - Services: Channel recording and event routing
//! - Messaging: Command parsing and dispatching
//! - Errors: Domain-specific errors

pub mod errors;
pub mod services;
pub mod messaging;
