//! Board resources
//!
//! Debug pins are picked from configuration at runtime, so they are held as
//! a small pin-number addressed bank over `embedded-hal` outputs.

use embedded_hal::digital::StatefulOutputPin;
use pwrcap_hal::{GpioBank, GpioError, PinFunction};

/// GPIO0..=7 can be handed to the debug pin bank
pub const DEBUG_PIN_CANDIDATES: usize = 8;

/// Samples per capture buffer (16 KiB of 16-bit ADC samples)
pub const MAX_SAMPLES: usize = 8192;

/// ADC clock divider: 48 MHz / (959 + 1) = 50 kS/s
pub const ADC_CLOCK_DIV: u16 = 959;

struct Slot<P> {
    number: u32,
    pin: P,
    configured: bool,
    high: bool,
}

/// Debug pin bank
pub struct BoardGpio<P> {
    slots: heapless::Vec<Slot<P>, DEBUG_PIN_CANDIDATES>,
}

impl<P: StatefulOutputPin> BoardGpio<P> {
    pub fn new() -> Self {
        Self {
            slots: heapless::Vec::new(),
        }
    }

    /// Hand an output pin to the bank under its GPIO number
    pub fn add(&mut self, number: u32, pin: P) -> Result<(), GpioError> {
        if self.slots.iter().any(|s| s.number == number) {
            return Err(GpioError::PinUnavailable(number));
        }
        self.slots
            .push(Slot {
                number,
                pin,
                configured: false,
                high: false,
            })
            .map_err(|_| GpioError::PinUnavailable(number))
    }

    fn output(&mut self, pin: u32) -> Option<&mut Slot<P>> {
        self.slots
            .iter_mut()
            .find(|s| s.number == pin && s.configured)
    }

    fn drive(&mut self, pin: u32, high: bool) {
        if let Some(slot) = self.output(pin) {
            let result = if high {
                slot.pin.set_high()
            } else {
                slot.pin.set_low()
            };
            if result.is_ok() {
                slot.high = high;
            }
        }
    }
}

impl<P: StatefulOutputPin> GpioBank for BoardGpio<P> {
    fn configure(&mut self, pin: u32, function: PinFunction) -> Result<(), GpioError> {
        let slot = self
            .slots
            .iter_mut()
            .find(|s| s.number == pin)
            .ok_or(GpioError::InvalidPin(pin))?;

        match function {
            PinFunction::Output => slot.configured = true,
            PinFunction::Disabled => {
                let _ = slot.pin.set_low();
                slot.configured = false;
                slot.high = false;
            }
            PinFunction::Peripheral => return Err(GpioError::UnsupportedFunction(pin)),
        }
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
        self.slots
            .iter()
            .any(|s| s.number == pin && s.configured && s.high)
    }
}
