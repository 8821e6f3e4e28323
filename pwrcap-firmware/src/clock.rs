//! Tick timer backed by the embassy time driver
//!
//! The RP2040 has no low-frequency countdown timer of its own, so the
//! reload value is kept here and turned into an embassy `Duration` for the
//! tick task's `Ticker`.

use embassy_time::Duration;
use pwrcap_core::timer::ticks_to_micros;
use pwrcap_hal::{ReferenceClock, TickTimer};

pub struct EmbassyTickTimer {
    reference: ReferenceClock,
    reload: Option<u32>,
}

impl EmbassyTickTimer {
    pub const fn new(reference: ReferenceClock) -> Self {
        Self {
            reference,
            reload: None,
        }
    }

    /// Interrupt period, if started
    pub fn period(&self) -> Option<Duration> {
        self.reload.map(|reload| {
            Duration::from_micros(ticks_to_micros(reload.saturating_add(1), self.reference))
        })
    }
}

impl TickTimer for EmbassyTickTimer {
    fn reference(&self) -> ReferenceClock {
        self.reference
    }

    fn start_periodic(&mut self, reload: u32) {
        self.reload = Some(reload);
    }

    fn stop(&mut self) {
        self.reload = None;
    }

    fn clear_interrupt(&mut self) {}

    fn is_running(&self) -> bool {
        self.reload.is_some()
    }
}
