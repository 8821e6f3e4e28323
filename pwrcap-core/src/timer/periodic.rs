//! Periodic timer with one registered callback

use pwrcap_hal::{ReferenceClock, TickTimer};

/// Reference ticks per second of the default timer clock
pub const TICKS_PER_SECOND: u32 = ReferenceClock::Lfrc512Hz.hz();

/// Smallest accepted period
///
/// The hardware reload value is `period - 1`, and a reload of zero does not
/// produce a repeating interrupt.
pub const MIN_PERIOD_TICKS: u32 = 2;

/// Convert whole seconds to reference ticks
pub const fn seconds_to_ticks(seconds: u32, clock: ReferenceClock) -> u32 {
    seconds.saturating_mul(clock.hz())
}

/// Convert reference ticks to microseconds
pub const fn ticks_to_micros(ticks: u32, clock: ReferenceClock) -> u64 {
    ticks as u64 * 1_000_000 / clock.hz() as u64
}

/// Timer configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerError {
    /// Period shorter than [`MIN_PERIOD_TICKS`]
    InvalidPeriod(u32),
}

/// Handler run from the timer interrupt
///
/// Runs in interrupt context, so it only gets shared access and must be
/// `Sync`. Keep it short: set a flag and return.
pub trait TimerCallback: Sync {
    /// Called once per timer period
    fn on_expire(&self);
}

impl TimerCallback for fn() {
    fn on_expire(&self) {
        self()
    }
}

/// Periodic timer
///
/// Owns the hardware timer and at most one callback. Calling
/// [`init`](Self::init) again before [`disable`](Self::disable) replaces the
/// previous period and callback; registrations are not queued.
pub struct PeriodicTimer<'a, T> {
    hw: T,
    period_ticks: Option<u32>,
    callback: Option<&'a dyn TimerCallback>,
}

impl<'a, T: TickTimer> PeriodicTimer<'a, T> {
    /// Create a disarmed timer
    pub fn new(hw: T) -> Self {
        Self {
            hw,
            period_ticks: None,
            callback: None,
        }
    }

    /// Register `callback` and start firing it every `period_ticks`
    ///
    /// Rejects periods below [`MIN_PERIOD_TICKS`] without touching the
    /// hardware or the current registration.
    pub fn init(
        &mut self,
        period_ticks: u32,
        callback: &'a dyn TimerCallback,
    ) -> Result<(), TimerError> {
        if period_ticks < MIN_PERIOD_TICKS {
            return Err(TimerError::InvalidPeriod(period_ticks));
        }

        self.callback = Some(callback);
        self.period_ticks = Some(period_ticks);
        self.hw.start_periodic(period_ticks - 1);
        Ok(())
    }

    /// Stop the hardware timer and drop the callback
    pub fn disable(&mut self) {
        self.hw.stop();
        self.period_ticks = None;
        self.callback = None;
    }

    /// Timer interrupt entry point
    ///
    /// Acknowledges the hardware interrupt and runs the registered callback.
    pub fn on_interrupt(&mut self) {
        self.hw.clear_interrupt();
        if let Some(callback) = self.callback {
            callback.on_expire();
        }
    }

    /// Check if a callback is registered and the timer is running
    pub fn is_armed(&self) -> bool {
        self.callback.is_some() && self.hw.is_running()
    }

    /// Current period, if armed
    pub fn period_ticks(&self) -> Option<u32> {
        self.period_ticks
    }

    /// Current period in microseconds, if armed
    pub fn period_micros(&self) -> Option<u64> {
        self.period_ticks
            .map(|ticks| ticks_to_micros(ticks, self.hw.reference()))
    }

    /// Access the hardware timer
    pub fn hardware(&self) -> &T {
        &self.hw
    }

    /// Mutable access to the hardware timer
    pub fn hardware_mut(&mut self) -> &mut T {
        &mut self.hw
    }
}
