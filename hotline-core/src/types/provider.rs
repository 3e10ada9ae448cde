//! Errors the provider may return when a new incoming call is reported.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderError {
    #[error("unknown provider error")]
    Unknown,

    #[error("application is not entitled to report calls")]
    Unentitled,

    #[error("a call with this identity already exists")]
    CallIdAlreadyExists,

    #[error("call filtered by do-not-disturb")]
    FilteredByDoNotDisturb,

    #[error("call filtered by block list")]
    FilteredByBlockList,
}
