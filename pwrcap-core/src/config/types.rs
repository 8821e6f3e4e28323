//! Configuration type definitions
//!
//! Runtime replacements for the compile-time switches of a capture build:
//! capture mode and timing, transfer layout, printing and debug pins.

use pwrcap_hal::TransferDescriptor;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::timer::{MIN_PERIOD_TICKS, TICKS_PER_SECOND};

use super::pins::{self, DebugPinMap};

/// Largest burst the sequencer accepts
pub const MAX_BURST_SIZE: u32 = 1024;

/// What the capture loop does after setup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CaptureMode {
    /// Peripheral left unconfigured, core only sleeps
    Disabled,
    /// Peripheral configured but never started
    InitOnly,
    /// Free-running transfers, auto-restart always set
    Continuous,
    /// Timed bursts of `burst_size` transfers
    #[default]
    Burst,
}

impl CaptureMode {
    /// Check if this mode configures the capture peripheral
    pub fn configures_driver(&self) -> bool {
        !matches!(self, CaptureMode::Disabled)
    }
}

/// Capture sequencing settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CaptureSettings {
    /// Capture mode
    pub mode: CaptureMode,
    /// Transfers per burst (burst mode only)
    pub burst_size: u32,
    /// Timer period in reference ticks
    pub timer_period_ticks: u32,
    /// IOM instance whose debug pins to use instead of `[debug]` pins
    pub iom: Option<u8>,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            mode: CaptureMode::Burst,
            burst_size: 4,
            timer_period_ticks: TICKS_PER_SECOND,
            iom: None,
        }
    }
}

/// Transfer layout settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TransferSettings {
    /// Bytes per transfer
    pub total_bytes: u32,
    /// FIFO threshold
    pub fifo_threshold: u32,
    /// Ping-pong buffering
    pub double_buffered: bool,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            total_bytes: 16 * 1024,
            fifo_threshold: 16,
            double_buffered: true,
        }
    }
}

/// Printing and debug pin settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DebugSettings {
    /// Log startup messages
    pub print_enabled: bool,
    /// Log once per main loop iteration (requires `print_enabled`)
    pub print_in_loop: bool,
    /// Drive debug pins
    pub pins_enabled: bool,
    /// Toggled on every transfer start and completion
    pub transfer_pin: u32,
    /// High while a burst is running
    pub burst_pin: u32,
    /// Low while the core sleeps
    pub sleep_pin: u32,
}

impl Default for DebugSettings {
    fn default() -> Self {
        Self {
            print_enabled: true,
            print_in_loop: false,
            pins_enabled: true,
            transfer_pin: 5,
            burst_pin: 6,
            sleep_pin: 7,
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Timer period below the minimum
    InvalidTimerPeriod(u32),
    /// Burst size of zero or above [`MAX_BURST_SIZE`]
    InvalidBurstSize(u32),
    /// No pin table for this IOM instance
    UnknownIom(u8),
    /// Zero-byte transfer or threshold larger than the transfer
    InvalidTransferSize,
}

/// Complete capture configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CaptureConfig {
    /// Sequencing
    pub capture: CaptureSettings,
    /// Transfer layout
    pub transfer: TransferSettings,
    /// Printing and debug pins
    pub debug: DebugSettings,
}

impl CaptureConfig {
    /// Check the configuration for values the sequencer cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let capture = &self.capture;

        // The timer runs in every mode: it gates bursts and paces stats output
        if capture.timer_period_ticks < MIN_PERIOD_TICKS {
            return Err(ConfigError::InvalidTimerPeriod(capture.timer_period_ticks));
        }

        if capture.mode == CaptureMode::Burst
            && (capture.burst_size == 0 || capture.burst_size > MAX_BURST_SIZE)
        {
            return Err(ConfigError::InvalidBurstSize(capture.burst_size));
        }

        if capture.mode.configures_driver() {
            let transfer = &self.transfer;
            if transfer.total_bytes == 0 || transfer.fifo_threshold > transfer.total_bytes {
                return Err(ConfigError::InvalidTransferSize);
            }
        }

        if let Some(iom) = capture.iom {
            pins::iom_pins(iom).ok_or(ConfigError::UnknownIom(iom))?;
        }

        Ok(())
    }

    /// Resolve dependent flags
    ///
    /// Returns `true` if `print_in_loop` had to be cleared because printing
    /// is disabled.
    pub fn normalize(&mut self) -> bool {
        if self.debug.print_in_loop && !self.debug.print_enabled {
            self.debug.print_in_loop = false;
            return true;
        }
        false
    }

    /// Transfer descriptor handed to the driver
    pub fn descriptor(&self) -> TransferDescriptor {
        TransferDescriptor {
            total_bytes: self.transfer.total_bytes,
            fifo_threshold: self.transfer.fifo_threshold,
            double_buffered: self.transfer.double_buffered,
            auto_restart: self.capture.mode == CaptureMode::Continuous,
        }
    }

    /// Debug pins to drive
    ///
    /// All pins resolve to the unused sentinel when debug pins are disabled.
    /// An IOM instance, if set, overrides the individual pins.
    pub fn debug_pin_map(&self) -> DebugPinMap {
        if !self.debug.pins_enabled {
            return DebugPinMap::UNUSED;
        }

        if let Some(map) = self.capture.iom.and_then(pins::debug_pins_for) {
            return map;
        }

        DebugPinMap {
            transfer: self.debug.transfer_pin,
            burst: self.debug.burst_pin,
            sleep: self.debug.sleep_pin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = CaptureConfig::default();
        assert_eq!(config.capture.mode, CaptureMode::Burst);
        assert_eq!(config.capture.timer_period_ticks, 512);
        assert_eq!(config.capture.burst_size, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_short_period_in_any_mode() {
        let mut config = CaptureConfig::default();
        config.capture.timer_period_ticks = 1;
        assert_eq!(config.validate(), Err(ConfigError::InvalidTimerPeriod(1)));

        config.capture.mode = CaptureMode::Continuous;
        assert_eq!(config.validate(), Err(ConfigError::InvalidTimerPeriod(1)));
    }

    #[test]
    fn test_burst_size_checked_in_burst_mode_only() {
        let mut config = CaptureConfig::default();
        config.capture.burst_size = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidBurstSize(0)));

        config.capture.mode = CaptureMode::Continuous;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_transfer_size_checked_only_when_configured() {
        let mut config = CaptureConfig::default();
        config.transfer.fifo_threshold = config.transfer.total_bytes + 1;
        assert_eq!(config.validate(), Err(ConfigError::InvalidTransferSize));

        config.capture.mode = CaptureMode::Disabled;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_iom() {
        let mut config = CaptureConfig::default();
        config.capture.iom = Some(2);
        assert_eq!(config.validate(), Err(ConfigError::UnknownIom(2)));
        config.capture.iom = Some(9);
        assert_eq!(config.validate(), Err(ConfigError::UnknownIom(9)));
    }

    #[test]
    fn test_normalize_print_in_loop() {
        let mut config = CaptureConfig::default();
        config.debug.print_enabled = false;
        config.debug.print_in_loop = true;

        assert!(config.normalize());
        assert!(!config.debug.print_in_loop);
        assert!(!config.normalize());
    }

    #[test]
    fn test_debug_pin_map_sources() {
        let mut config = CaptureConfig::default();
        assert_eq!(
            config.debug_pin_map(),
            DebugPinMap {
                transfer: 5,
                burst: 6,
                sleep: 7
            }
        );

        config.capture.iom = Some(1);
        assert_eq!(config.debug_pin_map(), DebugPinMap { transfer: 0, burst: 3, sleep: 2 });

        config.debug.pins_enabled = false;
        assert_eq!(config.debug_pin_map(), DebugPinMap::UNUSED);
    }

    #[test]
    fn test_descriptor_auto_restart_follows_mode() {
        let mut config = CaptureConfig::default();
        assert!(!config.descriptor().auto_restart);
        config.capture.mode = CaptureMode::Continuous;
        assert!(config.descriptor().auto_restart);
    }
}
