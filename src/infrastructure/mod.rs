//! Infrastructure layer - External concerns
//! 
//! This layer contains:
//! - Config: Configuration loading
//! - Storage: Channel log files
//! - Adapters: Network integrations (IRC)

pub mod config;
pub mod storage;
pub mod adapters;
