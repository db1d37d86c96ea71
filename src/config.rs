//! Unified configuration loading: TX/RX shape plus the test-only channel
//! simulator, parsed from one TOML document, in the style of the corpus's
//! `AppConfig`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::rx::RxConfig;
use crate::tx::TxConfig;

/// Deterministic channel/loss simulator parameters, present in the config
/// surface for convenience but only ever consumed by test code (see
/// `tests/common`). Never read outside `#[cfg(test)]` builds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub loss_percent: u8,
    pub jitter_ms: u32,
    pub gilbert_elliott: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            loss_percent: 0,
            jitter_ms: 0,
            gilbert_elliott: false,
        }
    }
}

/// Unified configuration structure parsed from a TOML file.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub tx: TxConfig,
    pub rx: RxConfig,
    pub sim: SimConfig,
}

impl AppConfig {
    /// Loads configuration from a TOML string. Sections absent from the
    /// document fall back to their defaults.
    pub fn from_toml(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| {
            crate::error::FecError::InvalidConfig(format!("invalid TOML config: {e}"))
        })
    }

    /// Loads configuration from a file path.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            crate::error::FecError::InvalidConfig(format!(
                "cannot read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml(&contents)
    }

    /// Validates every sub-configuration.
    pub fn validate(&self) -> Result<()> {
        self.tx.validate()?;
        self.rx.validate()?;
        Ok(())
    }
}
