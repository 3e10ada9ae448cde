use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::HandleType;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("localized name must not be empty")]
    EmptyName,

    #[error("maximum calls per call group must be at least 1")]
    NoCallsPerGroup,

    #[error("at least one supported handle type is required")]
    NoHandleTypes,
}

/// Static description of the provider, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfiguration {
    pub localized_name: String,
    pub supports_video: bool,
    /// 1 means no call waiting within a group.
    pub maximum_calls_per_call_group: usize,
    pub supported_handle_types: Vec<HandleType>,
}

impl Default for ProviderConfiguration {
    fn default() -> Self {
        Self {
            localized_name: "Hotline".to_string(),
            supports_video: true,
            maximum_calls_per_call_group: 1,
            supported_handle_types: vec![HandleType::PhoneNumber],
        }
    }
}

impl ProviderConfiguration {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.localized_name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if self.maximum_calls_per_call_group == 0 {
            return Err(ConfigError::NoCallsPerGroup);
        }
        if self.supported_handle_types.is_empty() {
            return Err(ConfigError::NoHandleTypes);
        }
        Ok(())
    }

    pub fn supports_handle(&self, kind: HandleType) -> bool {
        self.supported_handle_types.contains(&kind)
    }
}
