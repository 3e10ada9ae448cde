//! Platform-agnostic types shared between the call coordinator and its
//! collaborators. Nothing here depends on an async runtime.

pub mod config;
pub mod types;

pub use config::{ConfigError, ProviderConfiguration};
