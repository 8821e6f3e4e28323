//! Simulated countdown timer
//!
//! Counts reference ticks the way the hardware does: after
//! `start_periodic(reload)` the interrupt fires every `reload + 1` ticks.

use pwrcap_hal::{ReferenceClock, TickTimer};

/// Software model of a repeating countdown timer
#[derive(Debug, Default)]
pub struct SimTimer {
    reference: ReferenceClock,
    reload: u32,
    count: u32,
    running: bool,
}

impl SimTimer {
    /// Create a stopped timer on the given reference clock
    pub fn new(reference: ReferenceClock) -> Self {
        Self {
            reference,
            ..Self::default()
        }
    }

    /// Advance one reference tick
    ///
    /// Returns `true` when the interrupt fires on this tick.
    pub fn advance(&mut self) -> bool {
        if !self.running {
            return false;
        }
        if self.count == 0 {
            self.count = self.reload;
            return true;
        }
        self.count -= 1;
        false
    }
}

impl TickTimer for SimTimer {
    fn reference(&self) -> ReferenceClock {
        self.reference
    }

    fn start_periodic(&mut self, reload: u32) {
        self.reload = reload;
        self.count = reload;
        self.running = true;
    }

    fn stop(&mut self) {
        self.running = false;
    }

    // Expirations are reported by `advance`, nothing to latch
    fn clear_interrupt(&mut self) {}

    fn is_running(&self) -> bool {
        self.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_every_reload_plus_one() {
        let mut timer = SimTimer::new(ReferenceClock::Lfrc512Hz);
        timer.start_periodic(3);

        let fired: Vec<u32> = (1..=12).filter(|_| timer.advance()).collect();
        assert_eq!(fired, [4, 8, 12]);
    }

    #[test]
    fn test_stopped_timer_is_silent() {
        let mut timer = SimTimer::new(ReferenceClock::Xtal256Hz);
        assert!(!(0..1000).any(|_| timer.advance()));

        timer.start_periodic(1);
        assert!(!timer.advance());
        assert!(timer.advance());
        timer.stop();
        assert!(!(0..10).any(|_| timer.advance()));
    }
}
