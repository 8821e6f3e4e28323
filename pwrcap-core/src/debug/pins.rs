//! Debug pin driver
//!
//! Three GPIOs mark sequencer activity for a logic analyzer: a toggle per
//! transfer start and completion, a level for "burst running", and a level
//! that is low while the core sleeps. Unassigned pins are skipped.

use pwrcap_hal::gpio::{configure_output, is_assigned};
use pwrcap_hal::{GpioBank, GpioError};

use crate::config::DebugPinMap;

/// What a debug pin shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DebugRole {
    /// Toggled on transfer start and completion
    Transfer,
    /// High while a burst runs
    Burst,
    /// Low while asleep, high while awake
    Sleep,
}

/// Debug pins over a GPIO bank
pub struct DebugPins<G> {
    gpio: G,
    map: DebugPinMap,
}

impl<G: GpioBank> DebugPins<G> {
    /// Wrap a GPIO bank
    ///
    /// Pass [`DebugPinMap::UNUSED`] to run without debug pins.
    pub fn new(gpio: G, map: DebugPinMap) -> Self {
        Self { gpio, map }
    }

    /// Configure all assigned pins as outputs, driven low
    ///
    /// The sleep pin is then raised, since the core is awake.
    pub fn init(&mut self) -> Result<(), GpioError> {
        configure_output(&mut self.gpio, self.map.transfer)?;
        configure_output(&mut self.gpio, self.map.burst)?;
        configure_output(&mut self.gpio, self.map.sleep)?;
        self.set(DebugRole::Sleep, true);
        Ok(())
    }

    /// Pin number for a role
    pub fn pin(&self, role: DebugRole) -> u32 {
        match role {
            DebugRole::Transfer => self.map.transfer,
            DebugRole::Burst => self.map.burst,
            DebugRole::Sleep => self.map.sleep,
        }
    }

    /// Drive a role's pin
    pub fn set(&mut self, role: DebugRole, high: bool) {
        let pin = self.pin(role);
        if is_assigned(pin) {
            self.gpio.set_state(pin, high);
        }
    }

    /// Toggle a role's pin
    pub fn toggle(&mut self, role: DebugRole) {
        let pin = self.pin(role);
        if is_assigned(pin) {
            self.gpio.toggle(pin);
        }
    }

    /// Sleep pin low, about to wait for an interrupt
    pub fn mark_asleep(&mut self) {
        self.set(DebugRole::Sleep, false);
    }

    /// Sleep pin high, woken by an interrupt
    pub fn mark_awake(&mut self) {
        self.set(DebugRole::Sleep, true);
    }

    /// Pin map in use
    pub fn map(&self) -> DebugPinMap {
        self.map
    }

    /// Access the GPIO bank
    pub fn gpio(&self) -> &G {
        &self.gpio
    }
}
