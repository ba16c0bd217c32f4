//! Shared configuration and error types for DataAgent.

pub mod config;
pub mod error;

pub use config::{ApiFlavor, DataAgentConfig, ViolationPolicy};
pub use error::{DataAgentError, Result};
