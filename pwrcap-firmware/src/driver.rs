//! ADC DMA capture driver
//!
//! Main-loop handle for the capture task. `restart` hands the descriptor to
//! the task, which runs the DMA and re-arms on completion while the
//! auto-restart bit is set.

use pwrcap_hal::{DriverError, InterruptMask, TransferDescriptor, TransferDriver};

use crate::board::MAX_SAMPLES;
use crate::channels::{CAPTURE, START};

pub struct AdcCaptureDriver {
    descriptor: Option<TransferDescriptor>,
}

impl AdcCaptureDriver {
    pub const fn new() -> Self {
        Self { descriptor: None }
    }
}

impl TransferDriver for AdcCaptureDriver {
    fn configure(&mut self, descriptor: &TransferDescriptor) -> Result<(), DriverError> {
        let bytes = descriptor.total_bytes as usize;
        if bytes == 0 || bytes % 2 != 0 || bytes / 2 > MAX_SAMPLES {
            return Err(DriverError::InvalidDescriptor);
        }
        self.descriptor = Some(*descriptor);
        CAPTURE.set_auto_restart(descriptor.auto_restart);
        Ok(())
    }

    fn enable_interrupts(&mut self, mask: InterruptMask) -> Result<(), DriverError> {
        if self.descriptor.is_none() {
            return Err(DriverError::NotInitialized);
        }
        CAPTURE.enable(mask);
        Ok(())
    }

    fn set_auto_restart(&mut self, enabled: bool) {
        CAPTURE.set_auto_restart(enabled);
    }

    fn auto_restart(&self) -> bool {
        CAPTURE.auto_restart()
    }

    fn restart(&mut self) -> Result<(), DriverError> {
        let descriptor = self.descriptor.ok_or(DriverError::NotInitialized)?;
        if !CAPTURE.try_claim() {
            return Err(DriverError::Busy);
        }
        START.signal(descriptor);
        Ok(())
    }
}
