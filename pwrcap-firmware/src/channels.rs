//! Interrupt-shared state and inter-task signals
//!
//! The tick and capture tasks stand in for interrupt handlers: they only
//! touch [`SHARED`] and [`CAPTURE`] and then raise [`WAKE`]. The sequencer
//! task sleeps on [`WAKE`] between interrupts.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use pwrcap_core::transfer::{CaptureControl, TransferState};
use pwrcap_hal::TransferDescriptor;

/// Flags and statistics written from interrupt context
pub static SHARED: TransferState = TransferState::new();

/// Capture peripheral control bits
pub static CAPTURE: CaptureControl = CaptureControl::new();

/// Raised by every interrupt source; the sequencer task polls once per wake
pub static WAKE: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Start a transfer with this descriptor (sent by the capture driver)
pub static START: Signal<CriticalSectionRawMutex, TransferDescriptor> = Signal::new();

/// Stop the tick timer after a fatal sequencer error
pub static HALT: Signal<CriticalSectionRawMutex, ()> = Signal::new();
