//! Periodic countdown timer abstraction
//!
//! Models a free-running hardware timer clocked from a low-frequency
//! reference. The timer counts `reload + 1` reference ticks per period and
//! raises its interrupt at the end of each period.

/// Low-frequency clock feeding the timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReferenceClock {
    /// Internal low-frequency RC oscillator, 512 Hz
    #[default]
    Lfrc512Hz,
    /// 32kHz crystal divided down to 256 Hz
    Xtal256Hz,
}

impl ReferenceClock {
    /// Reference frequency in Hz
    pub const fn hz(self) -> u32 {
        match self {
            ReferenceClock::Lfrc512Hz => 512,
            ReferenceClock::Xtal256Hz => 256,
        }
    }
}

/// Hardware countdown timer
///
/// Implementations own one timer instance and its interrupt line. Interrupt
/// delivery itself is outside this trait: the platform routes the timer
/// interrupt to whoever owns the implementation.
pub trait TickTimer {
    /// Clock the timer is counting
    fn reference(&self) -> ReferenceClock;

    /// Load `reload`, clear any pending interrupt, enable the interrupt and
    /// start counting in repeat mode
    ///
    /// The interrupt fires every `reload + 1` reference ticks.
    fn start_periodic(&mut self, reload: u32);

    /// Stop counting and mask the interrupt
    fn stop(&mut self);

    /// Acknowledge the pending interrupt
    fn clear_interrupt(&mut self);

    /// Check if the timer is counting
    fn is_running(&self) -> bool;
}
