//! Action requests delivered by the provider.

use serde::{Deserialize, Serialize};

use super::call::CallId;
use super::handle::Handle;

/// A provider-originated request against a single call identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CallAction {
    Answer {
        call_id: CallId,
    },
    End {
        call_id: CallId,
    },
    SetHeld {
        call_id: CallId,
        on_hold: bool,
    },
    Start {
        call_id: CallId,
        handle: Handle,
        #[serde(default)]
        video: bool,
    },
}

impl CallAction {
    pub fn call_id(&self) -> CallId {
        match self {
            Self::Answer { call_id }
            | Self::End { call_id }
            | Self::SetHeld { call_id, .. }
            | Self::Start { call_id, .. } => *call_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Answer { .. } => "answer",
            Self::End { .. } => "end",
            Self::SetHeld { .. } => "set_held",
            Self::Start { .. } => "start",
        }
    }
}

/// How an action was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionOutcome {
    Fulfilled,
    Failed,
}

impl ActionOutcome {
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Self::Fulfilled)
    }
}
