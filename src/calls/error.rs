//! Call-related error types.

use hotline_core::types::{CallId, HandleType, ProviderError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CallError {
    #[error("call not found: {0}")]
    NotFound(CallId),

    #[error("call already registered: {0}")]
    DuplicateIdentity(CallId),

    #[error("failed to start call {id}: {reason}")]
    StartFailed { id: CallId, reason: String },

    #[error("invalid call state transition: {0}")]
    InvalidTransition(#[from] super::state::InvalidTransition),

    #[error("unsupported handle type: {0}")]
    UnsupportedHandle(HandleType),

    #[error("video calls are not supported")]
    VideoUnsupported,

    #[error("provider rejected call: {0}")]
    Provider(#[from] ProviderError),
}
