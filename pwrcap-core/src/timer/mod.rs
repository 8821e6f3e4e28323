//! Periodic tick timer
//!
//! Wraps a hardware [`TickTimer`](pwrcap_hal::TickTimer) with the
//! init/disable lifecycle and a single interrupt callback slot.

pub mod periodic;

pub use periodic::{
    seconds_to_ticks, ticks_to_micros, PeriodicTimer, TimerCallback, TimerError,
    MIN_PERIOD_TICKS, TICKS_PER_SECOND,
};
