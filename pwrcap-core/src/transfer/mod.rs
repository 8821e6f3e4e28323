//! Interrupt-shared transfer state
//!
//! Flags, the completed-buffer marker and statistics counters written from
//! interrupt context and consumed by the main loop, plus the control bits
//! the main loop hands back to the capture hardware.

pub mod control;
pub mod state;

pub use control::CaptureControl;
pub use state::{StatsSnapshot, TransferState};
