//! Embassy async tasks
//!
//! The tick and capture tasks play the part of interrupt handlers; the
//! sequencer task is the main loop.

pub mod capture;
pub mod sequencer;
pub mod tick;

pub use capture::capture_task;
pub use sequencer::{sequencer_task, FirmwareSequencer};
pub use tick::tick_task;
