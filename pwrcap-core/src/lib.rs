//! Board-agnostic core logic for the low-power capture examples
//!
//! This crate contains everything that does not depend on a specific chip:
//!
//! - Periodic timer lifecycle and callback dispatch
//! - Interrupt-shared transfer flags and statistics
//! - Acquisition sequencer (continuous and timed-burst capture)
//! - Debug pin markers
//! - Configuration types, validation and the embedded config parser

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod debug;
pub mod sequencer;
pub mod timer;
pub mod transfer;
