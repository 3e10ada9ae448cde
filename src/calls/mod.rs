//! Call sessions and their registry.
//!
//! # Architecture
//!
//! - [`CallState`] & [`CallTransition`]: state machine for one call
//! - [`Call`]: a call session with its connected-state observer and async start
//! - [`CallRegistry`]: live calls keyed by identity
//! - [`Dialer`]: placement of outgoing calls

mod call;
mod dialer;
mod error;
mod registry;
mod state;

pub use call::{Call, ConnectedStateObserver};
pub use dialer::{DialError, Dialer, DialerConfig, SimulatedDialer};
pub use error::CallError;
pub use registry::CallRegistry;
pub use state::{
    CallState, CallTransition, ConnectedState, EndCause, HoldState, InvalidTransition,
};
