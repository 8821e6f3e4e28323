//! Capture configuration
//!
//! Plain-data configuration, its validation, the IOM pin table, and a
//! small allocation-free TOML reader for embedded use.

pub mod parse;
pub mod pins;
pub mod types;

pub use parse::{parse_config, ParseError};
pub use pins::{
    apply_iom_pin_setup, debug_pins_for, iom_pins, DebugPinMap, IomPinSetup, IomPins,
    PinMode, PinSetupError,
};
pub use types::*;
