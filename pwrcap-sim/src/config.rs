//! Simulation config file
//!
//! The capture sections are the same ones the firmware embeds; `[sim]` adds
//! the knobs that only exist on the host.

use std::fs;
use std::path::Path;

use pwrcap_core::config::CaptureConfig;
use serde::Deserialize;

use crate::error::SimError;

/// Host-only settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SimSettings {
    /// Simulated run time
    pub seconds: u32,
    /// Reference ticks one transfer takes
    pub transfer_ticks: u32,
    /// Report a FIFO overflow with every Nth completion
    pub overflow_every: Option<u32>,
    /// Fail the Nth driver restart
    pub fail_restart_at: Option<u32>,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            seconds: 10,
            transfer_ticks: 358,
            overflow_every: None,
            fail_restart_at: None,
        }
    }
}

/// Parsed simulation config file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SimFile {
    #[serde(flatten)]
    pub capture: CaptureConfig,
    pub sim: SimSettings,
}

impl SimFile {
    /// Parse from TOML text
    pub fn from_toml(text: &str) -> Result<Self, SimError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a file
    pub fn load(path: &Path) -> Result<Self, SimError> {
        let text = fs::read_to_string(path).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }
}
