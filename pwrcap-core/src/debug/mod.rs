//! Oscilloscope debug pins

pub mod pins;

pub use pins::{DebugPins, DebugRole};
