use anyhow::Context;
use hotline_core::ProviderConfiguration;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::calls::DialerConfig;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotlineConfig {
    pub provider: ProviderConfiguration,
    pub dialer: DialerConfig,
}

impl HotlineConfig {
    pub fn from_json(json: &str) -> Result<Self, anyhow::Error> {
        let config: Self = serde_json::from_str(json).context("invalid configuration JSON")?;
        config.provider.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, anyhow::Error> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("failed to load {}", path.display()))
    }
}
