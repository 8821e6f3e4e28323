//! Recording GPIO bank
//!
//! Keeps pin levels in memory and counts edges per pin, so tests and the
//! report can see what a logic analyzer would.

use std::collections::BTreeMap;

use pwrcap_hal::{GpioBank, GpioError, PinFunction};

/// Pins the simulated part has
pub const SIM_PIN_COUNT: u32 = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PinRecord {
    function: PinFunction,
    high: bool,
    edges: u32,
}

/// In-memory GPIO bank
#[derive(Debug, Default)]
pub struct RecordingGpio {
    pins: BTreeMap<u32, PinRecord>,
}

impl RecordingGpio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Function a pin was configured for
    pub fn function(&self, pin: u32) -> Option<PinFunction> {
        self.pins.get(&pin).map(|p| p.function)
    }

    /// Level changes seen on a pin since it was configured
    pub fn edges(&self, pin: u32) -> u32 {
        self.pins.get(&pin).map_or(0, |p| p.edges)
    }

    /// Configured pins
    pub fn configured_pins(&self) -> impl Iterator<Item = u32> + '_ {
        self.pins.keys().copied()
    }

    fn drive(&mut self, pin: u32, high: bool) {
        if let Some(record) = self.pins.get_mut(&pin) {
            if record.high != high {
                record.edges += 1;
            }
            record.high = high;
        } else {
            log::warn!("gpio {pin} driven before configuration");
        }
    }
}

impl GpioBank for RecordingGpio {
    fn configure(&mut self, pin: u32, function: PinFunction) -> Result<(), GpioError> {
        if pin >= SIM_PIN_COUNT {
            return Err(GpioError::InvalidPin(pin));
        }
        self.pins.insert(
            pin,
            PinRecord {
                function,
                high: false,
                edges: 0,
            },
        );
        Ok(())
    }

    fn set_high(&mut self, pin: u32) {
        self.drive(pin, true);
    }

    fn set_low(&mut self, pin: u32) {
        self.drive(pin, false);
    }

    fn toggle(&mut self, pin: u32) {
        let high = self.is_set_high(pin);
        self.drive(pin, !high);
    }

    fn is_set_high(&self, pin: u32) -> bool {
        self.pins.get(&pin).is_some_and(|p| p.high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges_counted() {
        let mut gpio = RecordingGpio::new();
        gpio.configure(5, PinFunction::Output).unwrap();
        gpio.toggle(5);
        gpio.toggle(5);
        gpio.set_low(5);
        gpio.set_high(5);

        assert_eq!(gpio.edges(5), 3);
        assert!(gpio.is_set_high(5));
        assert_eq!(gpio.function(5), Some(PinFunction::Output));
    }

    #[test]
    fn test_out_of_range_pin() {
        let mut gpio = RecordingGpio::new();
        assert_eq!(
            gpio.configure(SIM_PIN_COUNT, PinFunction::Output),
            Err(GpioError::InvalidPin(SIM_PIN_COUNT))
        );
        assert_eq!(gpio.configured_pins().count(), 0);
    }
}
