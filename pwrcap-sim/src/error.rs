//! Simulation errors

use std::io;
use std::path::PathBuf;

use pwrcap_core::config::{ConfigError, PinSetupError};
use pwrcap_core::sequencer::SequencerError;
use pwrcap_core::timer::TimerError;
use thiserror::Error;

/// Errors from loading or running a simulation
#[derive(Debug, Error)]
pub enum SimError {
    /// Config file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Config file is not valid TOML for this schema
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
    /// Configuration rejected
    #[error("config rejected: {0:?}")]
    Config(ConfigError),
    /// IOM pins could not be parked
    #[error("iom pin setup failed: {0:?}")]
    PinSetup(PinSetupError),
    /// Timer setup failed
    #[error("timer init failed: {0:?}")]
    Timer(TimerError),
    /// Setup of pins or driver failed before the loop started
    #[error("setup failed: {0:?}")]
    Setup(SequencerError),
    /// Main loop stopped on a fatal error
    #[error("capture loop halted at tick {tick}: {error:?}")]
    Halted { tick: u64, error: SequencerError },
}

impl From<ConfigError> for SimError {
    fn from(e: ConfigError) -> Self {
        SimError::Config(e)
    }
}

impl From<PinSetupError> for SimError {
    fn from(e: PinSetupError) -> Self {
        SimError::PinSetup(e)
    }
}

impl From<TimerError> for SimError {
    fn from(e: TimerError) -> Self {
        SimError::Timer(e)
    }
}

impl From<SequencerError> for SimError {
    fn from(e: SequencerError) -> Self {
        match e {
            SequencerError::Config(e) => SimError::Config(e),
            e => SimError::Setup(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;
    use pwrcap_hal::DriverError;

    #[test]
    fn test_sequencer_config_errors_stay_config_errors() {
        let err = SimError::from(SequencerError::Config(ConfigError::InvalidBurstSize(0)));
        assert!(matches!(err, SimError::Config(ConfigError::InvalidBurstSize(0))));

        let err = SimError::from(SequencerError::Driver(DriverError::Busy));
        assert!(matches!(err, SimError::Setup(_)));
    }

    #[test]
    fn test_io_error_keeps_source() {
        let err = SimError::Io {
            path: PathBuf::from("missing.toml"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert!(err.to_string().starts_with("failed to read missing.toml"));
        assert!(err.source().is_some());
    }
}
