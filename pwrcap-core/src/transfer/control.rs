//! Capture peripheral control bits
//!
//! Written by the driver handle in the main loop and read by whatever
//! services the capture hardware.

use portable_atomic::{AtomicBool, AtomicU32, Ordering};
use pwrcap_hal::InterruptMask;

/// Auto-restart, in-flight and interrupt-enable bits of one capture channel
pub struct CaptureControl {
    auto_restart: AtomicBool,
    busy: AtomicBool,
    enabled: AtomicU32,
}

impl CaptureControl {
    pub const fn new() -> Self {
        Self {
            auto_restart: AtomicBool::new(false),
            busy: AtomicBool::new(false),
            enabled: AtomicU32::new(0),
        }
    }

    pub fn set_auto_restart(&self, enabled: bool) {
        self.auto_restart.store(enabled, Ordering::Release);
    }

    pub fn auto_restart(&self) -> bool {
        self.auto_restart.load(Ordering::Acquire)
    }

    /// Mark a transfer as in flight, failing if one already is
    pub fn try_claim(&self) -> bool {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn release(&self) {
        self.busy.store(false, Ordering::Release);
    }

    pub fn enable(&self, mask: InterruptMask) {
        self.enabled.fetch_or(mask.bits(), Ordering::AcqRel);
    }

    /// Stop re-arming and mask every interrupt source
    ///
    /// A transfer already in flight runs to completion but is neither
    /// reported nor restarted.
    pub fn disable(&self) {
        self.auto_restart.store(false, Ordering::Release);
        self.enabled.store(0, Ordering::Release);
    }

    /// Status bits that are enabled as interrupt sources
    pub fn enabled_status(&self, status: InterruptMask) -> InterruptMask {
        status & InterruptMask::from_bits_truncate(self.enabled.load(Ordering::Acquire))
    }
}

impl Default for CaptureControl {
    fn default() -> Self {
        Self::new()
    }
}
