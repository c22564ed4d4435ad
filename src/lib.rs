//! IRC secretary - a bot that records channel activity on its operator's request

pub mod domain;
pub mod application;
pub mod infrastructure;
