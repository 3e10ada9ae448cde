//! Coordination between a telephony provider and the calls it manages.
//!
//! The provider reports incoming calls and requests actions (answer, end,
//! hold, start); [`ProviderCoordinator`] validates each one against the
//! [`CallRegistry`](calls::CallRegistry), drives the [`Call`](calls::Call)
//! state machine and keeps the audio session in step.

pub use hotline_core::types;
pub use hotline_core::{ConfigError, ProviderConfiguration};

pub mod audio;
pub mod calls;
pub mod config;
pub mod coordinator;
pub mod provider;

#[cfg(test)]
mod test_utils;

pub use audio::AudioController;
pub use config::HotlineConfig;
pub use coordinator::ProviderCoordinator;
pub use provider::{Action, CallProvider};
