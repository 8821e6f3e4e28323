//! GPIO pin abstractions
//!
//! Pins are addressed by number rather than by type, because the capture
//! examples pick their debug and peripheral pins from runtime configuration.

/// Pin numbers at or above this value mean "no pin assigned".
///
/// Board tables use a high sentinel (often `0xFFFF`) for unused pins, so any
/// value between the largest real pin and the sentinel must also be treated
/// as unused.
pub const MAX_VALID_PIN_NUMBER: u32 = 500;

/// Check whether a pin number refers to a real pin
pub const fn is_assigned(pin: u32) -> bool {
    pin < MAX_VALID_PIN_NUMBER
}

/// Errors reported by a GPIO bank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GpioError {
    /// Pin number is below the sentinel but does not exist on this part
    InvalidPin(u32),
    /// Pin is owned by something else
    PinUnavailable(u32),
    /// Requested function is not supported on this pin
    UnsupportedFunction(u32),
}

/// Electrical function of a configured pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinFunction {
    /// Input buffer and output driver disabled (lowest power)
    Disabled,
    /// Pin handed to its peripheral function (SPI, I2C, PDM, ...)
    Peripheral,
    /// Push-pull digital output, 2mA drive
    Output,
}

/// Bank of digital pins addressed by number
///
/// Implementations handle the actual pad configuration for the specific
/// chip. Output operations on a pin that was never configured as an output
/// are implementation defined.
pub trait GpioBank {
    /// Configure a pin for the given function
    fn configure(&mut self, pin: u32, function: PinFunction) -> Result<(), GpioError>;

    /// Set the pin high (logic 1)
    fn set_high(&mut self, pin: u32);

    /// Set the pin low (logic 0)
    fn set_low(&mut self, pin: u32);

    /// Toggle the pin state
    fn toggle(&mut self, pin: u32);

    /// Set the pin to a specific state
    fn set_state(&mut self, pin: u32, high: bool) {
        if high {
            self.set_high(pin);
        } else {
            self.set_low(pin);
        }
    }

    /// Check if the pin is currently driven high
    fn is_set_high(&self, pin: u32) -> bool;

    /// Check if the pin is currently driven low
    fn is_set_low(&self, pin: u32) -> bool {
        !self.is_set_high(pin)
    }
}

/// Configure a pin as a push-pull output, ignoring unassigned pins
///
/// Returns `Ok(())` without touching the bank when `pin` is at or above
/// [`MAX_VALID_PIN_NUMBER`]: an unassigned pin is not an error.
pub fn configure_output<G: GpioBank + ?Sized>(gpio: &mut G, pin: u32) -> Result<(), GpioError> {
    if !is_assigned(pin) {
        return Ok(());
    }
    gpio.configure(pin, PinFunction::Output)?;
    gpio.set_low(pin);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bank {
        configured: [Option<PinFunction>; 8],
        levels: [bool; 8],
    }

    impl Bank {
        fn new() -> Self {
            Self {
                configured: [None; 8],
                levels: [true; 8],
            }
        }
    }

    impl GpioBank for Bank {
        fn configure(&mut self, pin: u32, function: PinFunction) -> Result<(), GpioError> {
            let slot = self
                .configured
                .get_mut(pin as usize)
                .ok_or(GpioError::InvalidPin(pin))?;
            *slot = Some(function);
            Ok(())
        }

        fn set_high(&mut self, pin: u32) {
            self.levels[pin as usize] = true;
        }

        fn set_low(&mut self, pin: u32) {
            self.levels[pin as usize] = false;
        }

        fn toggle(&mut self, pin: u32) {
            self.levels[pin as usize] = !self.levels[pin as usize];
        }

        fn is_set_high(&self, pin: u32) -> bool {
            self.levels[pin as usize]
        }
    }

    #[test]
    fn test_configure_output_drives_low() {
        let mut bank = Bank::new();
        configure_output(&mut bank, 3).unwrap();
        assert_eq!(bank.configured[3], Some(PinFunction::Output));
        assert!(bank.is_set_low(3));
    }

    #[test]
    fn test_sentinel_pin_is_noop() {
        let mut bank = Bank::new();
        assert_eq!(configure_output(&mut bank, MAX_VALID_PIN_NUMBER), Ok(()));
        assert_eq!(configure_output(&mut bank, 0xFFFF), Ok(()));
        assert!(bank.configured.iter().all(|c| c.is_none()));
    }

    #[test]
    fn test_invalid_real_pin_is_error() {
        let mut bank = Bank::new();
        assert_eq!(
            configure_output(&mut bank, 42),
            Err(GpioError::InvalidPin(42))
        );
    }

    #[test]
    fn test_set_state_and_toggle() {
        let mut bank = Bank::new();
        bank.set_state(1, false);
        assert!(bank.is_set_low(1));
        bank.toggle(1);
        assert!(bank.is_set_high(1));
    }
}
