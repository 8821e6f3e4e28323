//! Simulated DMA capture driver
//!
//! A transfer takes a fixed number of reference ticks. On completion the
//! driver's interrupt service reports the filled buffer and, if the
//! auto-restart bit is set at that moment, re-arms the next transfer before
//! the main loop ever sees the completion.

use pwrcap_core::transfer::TransferState;
use pwrcap_hal::{BufferId, DriverError, InterruptMask, TransferDescriptor, TransferDriver};

/// Software model of a double-buffered capture peripheral
#[derive(Debug)]
pub struct SimTransferDriver {
    transfer_ticks: u32,
    descriptor: Option<TransferDescriptor>,
    enabled: InterruptMask,
    auto_restart: bool,
    /// Ticks left on the transfer in flight
    in_flight: Option<u32>,
    next_buffer: BufferId,
    restarts: u32,
    completions: u32,
    /// Report a FIFO overflow with every Nth completion
    overflow_every: Option<u32>,
    /// Fail the Nth call to `restart`
    fail_restart_at: Option<u32>,
}

impl SimTransferDriver {
    /// Create a driver whose transfers take `transfer_ticks` reference ticks
    pub fn new(transfer_ticks: u32) -> Self {
        Self {
            transfer_ticks: transfer_ticks.max(1),
            descriptor: None,
            enabled: InterruptMask::empty(),
            auto_restart: false,
            in_flight: None,
            next_buffer: BufferId::Ping,
            restarts: 0,
            completions: 0,
            overflow_every: None,
            fail_restart_at: None,
        }
    }

    /// Report a FIFO overflow alongside every `n`th completion
    pub fn with_overflow_every(mut self, n: Option<u32>) -> Self {
        self.overflow_every = n.filter(|&n| n > 0);
        self
    }

    /// Make the `n`th `restart` call fail
    pub fn with_failing_restart(mut self, n: Option<u32>) -> Self {
        self.fail_restart_at = n.filter(|&n| n > 0);
        self
    }

    /// Advance one reference tick, running the interrupt service on completion
    ///
    /// Returns `true` if an interrupt was delivered.
    pub fn advance(&mut self, shared: &TransferState) -> bool {
        let Some(remaining) = self.in_flight.as_mut() else {
            return false;
        };

        *remaining = remaining.saturating_sub(1);
        if *remaining > 0 {
            return false;
        }

        self.in_flight = None;
        self.completions += 1;

        let filled = self.next_buffer;
        if self.descriptor.is_some_and(|d| d.double_buffered) {
            self.next_buffer = filled.other();
        }

        let mut status = InterruptMask::DMA_COMPLETE;
        if self
            .overflow_every
            .is_some_and(|n| self.completions % n == 0)
        {
            status |= InterruptMask::OVERFLOW;
        }

        // Interrupt service re-arms before the main loop runs
        if self.auto_restart {
            self.in_flight = Some(self.transfer_ticks);
        }

        let delivered = status & self.enabled;
        if delivered.is_empty() {
            return false;
        }
        shared.on_transfer_interrupt(delivered, Some(filled));
        true
    }

    /// Check if a transfer is running
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Successful `restart` calls
    pub fn restarts(&self) -> u32 {
        self.restarts
    }

    /// Transfers finished by the peripheral
    pub fn completions(&self) -> u32 {
        self.completions
    }
}

impl TransferDriver for SimTransferDriver {
    fn configure(&mut self, descriptor: &TransferDescriptor) -> Result<(), DriverError> {
        if descriptor.total_bytes == 0 {
            return Err(DriverError::InvalidDescriptor);
        }
        self.descriptor = Some(*descriptor);
        self.auto_restart = descriptor.auto_restart;
        Ok(())
    }

    fn enable_interrupts(&mut self, mask: InterruptMask) -> Result<(), DriverError> {
        if self.descriptor.is_none() {
            return Err(DriverError::NotInitialized);
        }
        self.enabled |= mask;
        Ok(())
    }

    fn set_auto_restart(&mut self, enabled: bool) {
        self.auto_restart = enabled;
    }

    fn auto_restart(&self) -> bool {
        self.auto_restart
    }

    fn restart(&mut self) -> Result<(), DriverError> {
        if self.descriptor.is_none() {
            return Err(DriverError::NotInitialized);
        }
        if self.fail_restart_at == Some(self.restarts + 1) {
            return Err(DriverError::Status(1));
        }
        if self.in_flight.is_some() {
            return Err(DriverError::Busy);
        }
        self.in_flight = Some(self.transfer_ticks);
        self.restarts += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured(transfer_ticks: u32) -> SimTransferDriver {
        let mut driver = SimTransferDriver::new(transfer_ticks);
        driver
            .configure(&TransferDescriptor {
                total_bytes: 64,
                fifo_threshold: 16,
                double_buffered: true,
                auto_restart: false,
            })
            .unwrap();
        driver.enable_interrupts(InterruptMask::DMA_CAPTURE).unwrap();
        driver
    }

    #[test]
    fn test_restart_requires_configuration() {
        let mut driver = SimTransferDriver::new(4);
        assert_eq!(driver.restart(), Err(DriverError::NotInitialized));
        assert_eq!(
            driver.enable_interrupts(InterruptMask::DMA_CAPTURE),
            Err(DriverError::NotInitialized)
        );
    }

    #[test]
    fn test_single_transfer_completes_once() {
        let shared = TransferState::new();
        let mut driver = configured(3);
        driver.restart().unwrap();
        assert_eq!(driver.restart(), Err(DriverError::Busy));

        let fired: Vec<u32> = (1..=10).filter(|_| driver.advance(&shared)).collect();
        assert_eq!(fired, [3]);
        assert!(!driver.is_busy());
        assert_eq!(shared.take_buffer(), Some(BufferId::Ping));
    }

    #[test]
    fn test_auto_restart_rearms_in_isr() {
        let shared = TransferState::new();
        let mut driver = configured(2);
        driver.set_auto_restart(true);
        driver.restart().unwrap();

        let fired: Vec<u32> = (1..=6).filter(|_| driver.advance(&shared)).collect();
        assert_eq!(fired, [2, 4, 6]);
        assert!(driver.is_busy());
        assert_eq!(driver.restarts(), 1);
        // Last writer wins: the marker holds the latest buffer
        assert_eq!(shared.take_buffer(), Some(BufferId::Ping));
        assert_eq!(shared.stats().complete_count, 3);
    }

    #[test]
    fn test_injected_faults() {
        let shared = TransferState::new();
        let mut driver = configured(1)
            .with_overflow_every(Some(2))
            .with_failing_restart(Some(2));
        driver.restart().unwrap();
        driver.advance(&shared);
        assert_eq!(driver.restart(), Err(DriverError::Status(1)));
        assert_eq!(shared.stats().fifo_overflows, 0);

        driver.set_auto_restart(true);
        driver.fail_restart_at = None;
        driver.restart().unwrap();
        driver.advance(&shared);
        assert_eq!(shared.stats().fifo_overflows, 1);
    }

    #[test]
    fn test_masked_interrupts_are_not_delivered() {
        let shared = TransferState::new();
        let mut driver = SimTransferDriver::new(1);
        driver
            .configure(&TransferDescriptor {
                total_bytes: 64,
                fifo_threshold: 16,
                double_buffered: false,
                auto_restart: false,
            })
            .unwrap();
        driver.restart().unwrap();
        assert!(!driver.advance(&shared));
        assert_eq!(driver.completions(), 1);
        assert!(!shared.take_data_ready());
    }
}
