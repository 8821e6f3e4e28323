//! ADC capture task
//!
//! Waits for a start request, then fills the ping-pong buffers with DMA.
//! After each transfer it reports completion like an interrupt would and
//! re-arms immediately if the auto-restart bit is still set.

use defmt::*;
use embassy_rp::adc::{Adc, Async, Channel};
use embassy_rp::peripherals::DMA_CH0;
use embassy_rp::Peri;
use pwrcap_hal::{BufferId, InterruptMask};

use crate::board::{ADC_CLOCK_DIV, MAX_SAMPLES};
use crate::channels::{CAPTURE, SHARED, START, WAKE};

/// Capture buffers, indexed by [`BufferId`]
pub type CaptureBuffers = [[u16; MAX_SAMPLES]; 2];

fn slot(buffer: BufferId) -> usize {
    match buffer {
        BufferId::Ping => 0,
        BufferId::Pong => 1,
    }
}

/// Capture task - the DMA completion interrupt
#[embassy_executor::task]
pub async fn capture_task(
    mut adc: Adc<'static, Async>,
    mut channel: Channel<'static>,
    mut dma: Peri<'static, DMA_CH0>,
    buffers: &'static mut CaptureBuffers,
    print: bool,
) {
    if print {
        info!("Capture task started");
    }

    let mut buffer = BufferId::Ping;

    loop {
        let descriptor = START.wait().await;
        let samples = (descriptor.total_bytes as usize / 2).min(MAX_SAMPLES);

        loop {
            let target = &mut buffers[slot(buffer)][..samples];
            let status = match adc
                .read_many(&mut channel, target, ADC_CLOCK_DIV, dma.reborrow())
                .await
            {
                Ok(()) => InterruptMask::DMA_COMPLETE,
                Err(_) => InterruptMask::DMA_COMPLETE | InterruptMask::DMA_ERROR,
            };

            // Sampled at completion, as the hardware would
            let rearm = CAPTURE.auto_restart();
            if !rearm {
                CAPTURE.release();
            }

            let delivered = CAPTURE.enabled_status(status);
            if !delivered.is_empty() {
                SHARED.on_transfer_interrupt(delivered, Some(buffer));
                WAKE.signal(());
            }

            if descriptor.double_buffered {
                buffer = buffer.other();
            }
            if !rearm {
                break;
            }
        }
    }
}
