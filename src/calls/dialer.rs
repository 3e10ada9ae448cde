//! Placement of outgoing calls.

use async_trait::async_trait;
use hotline_core::types::{CallId, Handle};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct DialError(pub String);

/// Performs the network side of an outgoing call.
///
/// Both methods may take an unpredictable amount of time and must not block
/// the executor.
#[async_trait]
pub trait Dialer: Send + Sync {
    /// Place the call. Resolves once the far end is being alerted.
    async fn dial(&self, call_id: CallId, handle: &Handle) -> Result<(), DialError>;

    /// Wait for the far end to pick up.
    async fn await_answer(&self, call_id: CallId, handle: &Handle) -> Result<(), DialError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialerConfig {
    pub dial_delay_ms: u64,
    pub answer_delay_ms: u64,
    /// Handles that fail to dial.
    pub unreachable: Vec<String>,
}

impl Default for DialerConfig {
    fn default() -> Self {
        Self {
            dial_delay_ms: 3000,
            answer_delay_ms: 1500,
            unreachable: Vec::new(),
        }
    }
}

/// Dialer that only waits, for demos and tests.
#[derive(Debug, Clone)]
pub struct SimulatedDialer {
    dial_delay: Duration,
    answer_delay: Duration,
    unreachable: HashSet<String>,
}

impl SimulatedDialer {
    pub fn new(config: &DialerConfig) -> Self {
        Self {
            dial_delay: Duration::from_millis(config.dial_delay_ms),
            answer_delay: Duration::from_millis(config.answer_delay_ms),
            unreachable: config.unreachable.iter().cloned().collect(),
        }
    }

    pub fn instant() -> Self {
        Self::new(&DialerConfig {
            dial_delay_ms: 0,
            answer_delay_ms: 0,
            unreachable: Vec::new(),
        })
    }
}

#[async_trait]
impl Dialer for SimulatedDialer {
    async fn dial(&self, call_id: CallId, handle: &Handle) -> Result<(), DialError> {
        debug!("Dialing {} for call {}", handle, call_id);
        tokio::time::sleep(self.dial_delay).await;
        if self.unreachable.contains(handle.value()) {
            return Err(DialError(format!("{} is unreachable", handle)));
        }
        Ok(())
    }

    async fn await_answer(&self, call_id: CallId, handle: &Handle) -> Result<(), DialError> {
        tokio::time::sleep(self.answer_delay).await;
        debug!("{} picked up call {}", handle, call_id);
        Ok(())
    }
}
