//! Call state machine implementation.

use chrono::{DateTime, Utc};
use hotline_core::types::CallDirection;
use serde::Serialize;

/// Progress of an outgoing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub enum ConnectedState {
    /// Constructed, `start` not yet called.
    #[default]
    Idle,
    /// Dialing.
    Pending,
    /// Placed, waiting for the far end.
    Connecting,
    /// Far end answered.
    Complete,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub enum HoldState {
    #[default]
    Active,
    Held,
}

/// Why a call reached `Ended`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EndCause {
    /// Ended on request (provider action or reset).
    Requested,
    /// Placement or connection failed.
    Failed,
}

/// State transitions for calls.
#[derive(Debug, Clone, Copy)]
pub enum CallTransition {
    BeginDialing,
    Dialed,
    Connected,
    Answer,
    SetHeld(bool),
    End(EndCause),
}

#[derive(Debug, Clone, Serialize)]
pub struct CallState {
    pub direction: CallDirection,
    pub connected: ConnectedState,
    pub hold: HoldState,
    pub answered_at: Option<DateTime<Utc>>,
    pub connected_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub end_cause: Option<EndCause>,
}

impl CallState {
    pub fn new(direction: CallDirection) -> Self {
        Self {
            direction,
            connected: ConnectedState::Idle,
            hold: HoldState::Active,
            answered_at: None,
            connected_at: None,
            ended_at: None,
            end_cause: None,
        }
    }

    pub fn is_ended(&self) -> bool {
        self.connected == ConnectedState::Ended
    }

    pub fn is_answered(&self) -> bool {
        self.answered_at.is_some()
    }

    pub fn is_held(&self) -> bool {
        self.hold == HoldState::Held
    }

    /// Apply a transition. Returns the new connected state when it changed,
    /// `None` when only other fields moved or the transition was a no-op.
    pub fn apply_transition(
        &mut self,
        transition: CallTransition,
    ) -> Result<Option<ConnectedState>, InvalidTransition> {
        let now = Utc::now();
        match (self.connected, transition) {
            // Terminal state absorbs repeated ends.
            (ConnectedState::Ended, CallTransition::End(_)) => Ok(None),
            (ConnectedState::Ended, attempted) => Err(self.invalid(attempted)),
            (ConnectedState::Idle, CallTransition::BeginDialing)
                if self.direction == CallDirection::Outgoing =>
            {
                Ok(Some(self.enter(ConnectedState::Pending)))
            }
            (ConnectedState::Pending, CallTransition::Dialed) => {
                Ok(Some(self.enter(ConnectedState::Connecting)))
            }
            (ConnectedState::Connecting, CallTransition::Connected) => {
                self.connected_at = Some(now);
                self.answered_at.get_or_insert(now);
                Ok(Some(self.enter(ConnectedState::Complete)))
            }
            (_, CallTransition::Answer) => {
                self.answered_at.get_or_insert(now);
                Ok(None)
            }
            (_, CallTransition::SetHeld(on_hold)) => {
                self.hold = if on_hold {
                    HoldState::Held
                } else {
                    HoldState::Active
                };
                Ok(None)
            }
            (_, CallTransition::End(cause)) => {
                self.ended_at = Some(now);
                self.end_cause = Some(cause);
                Ok(Some(self.enter(ConnectedState::Ended)))
            }
            (_, attempted) => Err(self.invalid(attempted)),
        }
    }

    fn enter(&mut self, next: ConnectedState) -> ConnectedState {
        self.connected = next;
        next
    }

    fn invalid(&self, attempted: CallTransition) -> InvalidTransition {
        InvalidTransition {
            current_state: format!("{:?}", self.connected),
            attempted: format!("{:?}", attempted),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InvalidTransition {
    pub current_state: String,
    pub attempted: String,
}

impl std::fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid transition {} in state {}",
            self.attempted, self.current_state
        )
    }
}

impl std::error::Error for InvalidTransition {}
