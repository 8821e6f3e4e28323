//! Host simulation of the pwrcap capture loop
//!
//! Runs the same [`Sequencer`](pwrcap_core::sequencer::Sequencer) the
//! firmware runs, against a fake periodic timer, a fake DMA capture driver
//! and a GPIO bank that records debug pin edges. Time advances one reference
//! tick at a time; the core "sleeps" until either fake peripheral raises an
//! interrupt.

pub mod clock;
pub mod config;
pub mod driver;
pub mod error;
pub mod gpio;
pub mod logger;
pub mod runner;

pub use config::{SimFile, SimSettings};
pub use error::SimError;
pub use runner::{run, Report, Simulation, TimedEvent};
