//! Acquisition sequencer
//!
//! Consumes the interrupt flags once per main loop iteration and decides
//! when capture bursts start and stop.

pub mod events;
pub mod executor;
pub mod machine;

pub use events::{Event, Events, MAX_EVENTS_PER_POLL};
pub use executor::{Sequencer, SequencerError, RESTART_DELAY_TICKS};
pub use machine::{State, Trigger};
