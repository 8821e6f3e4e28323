//! IOM pin table
//!
//! Pin numbers for each I/O master instance, and the debug pins that go with
//! it. Instance 2 is not routed on the evaluation board.

use pwrcap_hal::gpio::MAX_VALID_PIN_NUMBER;
use pwrcap_hal::{GpioBank, GpioError, PinFunction};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of IOM instances
pub const IOM_COUNT: usize = 6;

/// Debug pin assignment by role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DebugPinMap {
    /// Toggled on transfer start and completion
    pub transfer: u32,
    /// High while a burst runs
    pub burst: u32,
    /// Low while asleep
    pub sleep: u32,
}

impl DebugPinMap {
    /// Every role unassigned
    pub const UNUSED: Self = Self {
        transfer: MAX_VALID_PIN_NUMBER,
        burst: MAX_VALID_PIN_NUMBER,
        sleep: MAX_VALID_PIN_NUMBER,
    };
}

/// Pins of one IOM instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IomPins {
    pub sck: u32,
    pub miso: u32,
    pub mosi: u32,
    pub cs: u32,
    /// Debug pins used when testing this instance
    pub debug: DebugPinMap,
}

const BOARD_DEBUG_PINS: DebugPinMap = DebugPinMap {
    transfer: 0,
    burst: 3,
    sleep: 2,
};

const fn iom(sck: u32, miso: u32, mosi: u32, cs: u32) -> Option<IomPins> {
    Some(IomPins {
        sck,
        miso,
        mosi,
        cs,
        debug: BOARD_DEBUG_PINS,
    })
}

static IOM_TABLE: [Option<IomPins>; IOM_COUNT] = [
    iom(5, 7, 6, 50),
    iom(8, 10, 9, 51),
    None,
    iom(31, 33, 32, 90),
    iom(34, 36, 35, 54),
    iom(47, 49, 48, 92),
];

/// Pins of an IOM instance, `None` if the instance is not available
pub fn iom_pins(instance: u8) -> Option<&'static IomPins> {
    IOM_TABLE.get(instance as usize)?.as_ref()
}

/// Debug pins of an IOM instance
pub fn debug_pins_for(instance: u8) -> Option<DebugPinMap> {
    iom_pins(instance).map(|pins| pins.debug)
}

/// How one IOM pin is set up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PinMode {
    /// Disconnected
    Off,
    /// Controlled by the IOM
    #[default]
    Normal,
    /// GPIO output driven low
    GpioLow,
    /// GPIO output driven high
    GpioHigh,
}

/// Requested pin setup for one IOM instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IomPinSetup {
    pub instance: u8,
    pub sck: PinMode,
    pub miso: PinMode,
    pub mosi: PinMode,
    pub cs: PinMode,
}

impl IomPinSetup {
    /// Every pin of an instance disconnected, for an IOM the capture
    /// loop does not use
    pub const fn parked(instance: u8) -> Self {
        Self {
            instance,
            sck: PinMode::Off,
            miso: PinMode::Off,
            mosi: PinMode::Off,
            cs: PinMode::Off,
        }
    }
}

/// Errors from [`apply_iom_pin_setup`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinSetupError {
    /// Instance not in the table
    UnknownInstance(u8),
    /// GPIO rejected a pin
    Gpio(GpioError),
}

impl From<GpioError> for PinSetupError {
    fn from(e: GpioError) -> Self {
        PinSetupError::Gpio(e)
    }
}

fn setup_pin<G: GpioBank + ?Sized>(gpio: &mut G, pin: u32, mode: PinMode) -> Result<(), GpioError> {
    match mode {
        PinMode::Off => gpio.configure(pin, PinFunction::Disabled),
        PinMode::Normal => gpio.configure(pin, PinFunction::Peripheral),
        PinMode::GpioLow => {
            gpio.configure(pin, PinFunction::Output)?;
            gpio.set_low(pin);
            Ok(())
        }
        PinMode::GpioHigh => {
            gpio.configure(pin, PinFunction::Output)?;
            gpio.set_high(pin);
            Ok(())
        }
    }
}

/// Configure the four pins of an IOM instance
///
/// Stops at the first pin the GPIO layer rejects.
pub fn apply_iom_pin_setup<G: GpioBank + ?Sized>(
    gpio: &mut G,
    setup: &IomPinSetup,
) -> Result<(), PinSetupError> {
    let pins = iom_pins(setup.instance).ok_or(PinSetupError::UnknownInstance(setup.instance))?;

    setup_pin(gpio, pins.sck, setup.sck)?;
    setup_pin(gpio, pins.miso, setup.miso)?;
    setup_pin(gpio, pins.mosi, setup.mosi)?;
    setup_pin(gpio, pins.cs, setup.cs)?;
    Ok(())
}
