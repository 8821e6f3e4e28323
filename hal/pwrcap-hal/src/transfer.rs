//! DMA capture peripheral abstraction
//!
//! The sequencer only needs to describe a transfer once, start it, learn
//! about completion through an interrupt, and flip the auto-restart bit that
//! tells the driver's interrupt service whether to re-arm the DMA.

bitflags::bitflags! {
    /// Interrupt sources of a capture peripheral
    ///
    /// Used both as an enable mask and as the status reported by an interrupt.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct InterruptMask: u32 {
        /// FIFO threshold reached
        const THRESHOLD = 1 << 0;
        /// FIFO underflow
        const UNDERFLOW = 1 << 1;
        /// FIFO overflow
        const OVERFLOW = 1 << 2;
        /// DMA transfer complete
        const DMA_COMPLETE = 1 << 3;
        /// DMA error
        const DMA_ERROR = 1 << 4;

        /// Mask used by the DMA capture examples
        const DMA_CAPTURE = Self::DMA_ERROR.bits()
            | Self::DMA_COMPLETE.bits()
            | Self::UNDERFLOW.bits()
            | Self::OVERFLOW.bits();
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for InterruptMask {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "InterruptMask({=u32:#x})", self.bits())
    }
}

/// One half of the ping-pong capture buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BufferId {
    /// First buffer
    Ping,
    /// Second buffer
    Pong,
}

impl BufferId {
    /// The buffer the DMA fills after this one
    pub const fn other(self) -> Self {
        match self {
            BufferId::Ping => BufferId::Pong,
            BufferId::Pong => BufferId::Ping,
        }
    }
}

/// Description of the capture transfer, set up once before starting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransferDescriptor {
    /// Bytes moved per transfer
    pub total_bytes: u32,
    /// FIFO level that triggers a DMA request
    pub fifo_threshold: u32,
    /// Alternate between [`BufferId::Ping`] and [`BufferId::Pong`]
    pub double_buffered: bool,
    /// Initial state of the auto-restart bit
    pub auto_restart: bool,
}

/// Errors reported by a capture driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverError {
    /// Peripheral handle was never initialized
    NotInitialized,
    /// Descriptor rejected by the peripheral
    InvalidDescriptor,
    /// A transfer is already running
    Busy,
    /// Peripheral returned a non-zero status
    Status(u32),
}

/// DMA capture peripheral driver
///
/// The driver's completion interrupt service is expected to re-arm the DMA
/// on its own whenever the auto-restart bit is set at the moment the
/// transfer completes.
pub trait TransferDriver {
    /// Program the transfer parameters without starting anything
    fn configure(&mut self, descriptor: &TransferDescriptor) -> Result<(), DriverError>;

    /// Enable the given interrupt sources
    fn enable_interrupts(&mut self, mask: InterruptMask) -> Result<(), DriverError>;

    /// Set or clear the auto-restart bit
    fn set_auto_restart(&mut self, enabled: bool);

    /// Current state of the auto-restart bit
    fn auto_restart(&self) -> bool;

    /// Start the configured transfer
    fn restart(&mut self) -> Result<(), DriverError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_mask_contents() {
        let mask = InterruptMask::DMA_CAPTURE;
        assert!(mask.contains(InterruptMask::DMA_COMPLETE));
        assert!(mask.contains(InterruptMask::OVERFLOW));
        assert!(!mask.contains(InterruptMask::THRESHOLD));
    }

    #[test]
    fn test_empty_mask() {
        let none = InterruptMask::empty();
        assert!(none.is_empty());
        assert!(!none.intersects(InterruptMask::DMA_COMPLETE));
        assert_eq!(InterruptMask::default(), none);
    }

    #[test]
    fn test_bitor_and_truncate() {
        let status = InterruptMask::DMA_COMPLETE | InterruptMask::DMA_ERROR;
        assert_eq!(status.bits(), 0x18);
        assert_eq!(InterruptMask::from_bits_truncate(0xFF).bits(), 0x1F);
        assert_eq!(status & InterruptMask::DMA_CAPTURE, status);
    }

    #[test]
    fn test_buffer_alternation() {
        assert_eq!(BufferId::Ping.other(), BufferId::Pong);
        assert_eq!(BufferId::Ping.other().other(), BufferId::Ping);
    }
}
