//! pwrcap Hardware Abstraction Layer
//!
//! This crate defines the narrow hardware interface the capture sequencer
//! talks to. Chip-specific code (or the host simulation) implements these
//! traits; nothing in here touches registers.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  pwrcap-firmware / pwrcap-sim           │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  pwrcap-core (timer, sequencer)         │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  pwrcap-hal (this crate - traits)       │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::GpioBank`] - Pin-number addressed digital outputs
//! - [`timer::TickTimer`] - Periodic hardware countdown timer
//! - [`transfer::TransferDriver`] - DMA capture peripheral

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod timer;
pub mod transfer;

// Re-export key traits at crate root for convenience
pub use gpio::{GpioBank, GpioError, PinFunction};
pub use timer::{ReferenceClock, TickTimer};
pub use transfer::{BufferId, DriverError, InterruptMask, TransferDescriptor, TransferDriver};
