//! Sequencer task - the main loop
//!
//! Sleeps until an interrupt source raises the wake signal, then runs one
//! sequencer poll with the sleep pin high.

use defmt::*;
use embassy_rp::gpio::Output;
use pwrcap_core::sequencer::{Event, Sequencer};

use crate::board::BoardGpio;
use crate::channels::{CAPTURE, HALT, SHARED, WAKE};
use crate::driver::AdcCaptureDriver;

/// Sequencer over the board's capture driver and debug pins
pub type FirmwareSequencer = Sequencer<AdcCaptureDriver, BoardGpio<Output<'static>>>;

#[embassy_executor::task]
pub async fn sequencer_task(mut sequencer: FirmwareSequencer) {
    let print_in_loop = sequencer.config().debug.print_in_loop;

    loop {
        WAKE.wait().await;
        sequencer.exit_sleep();

        match sequencer.poll(&SHARED) {
            Ok(events) => {
                if print_in_loop {
                    for event in events {
                        log_event(&sequencer, event);
                    }
                }
            }
            Err(e) => {
                error!("Capture halted: {:?}", e);
                CAPTURE.disable();
                HALT.signal(());
                return;
            }
        }

        sequencer.enter_sleep();
    }
}

fn log_event(sequencer: &FirmwareSequencer, event: Event) {
    match event {
        Event::TransferComplete { buffer, total } => {
            debug!("Transfer {} complete ({:?})", total, buffer)
        }
        Event::BurstStarted { burst } => info!(
            "Sequence {} start, transfers {}",
            burst,
            sequencer.total_transfers()
        ),
        Event::BurstReleased => debug!("Auto-restart off, last transfer in flight"),
        Event::BurstFinished { bursts } => info!(
            "Sequence complete, {} done, transfers {}",
            bursts,
            sequencer.total_transfers()
        ),
        Event::TimerTick => {
            let stats = SHARED.stats();
            info!(
                "transfers: {} isr: {} overflow: {} dma complete: {} dma error: {}",
                sequencer.total_transfers(),
                stats.isr_count,
                stats.fifo_overflows,
                stats.complete_count,
                stats.dma_errors
            );
        }
    }
}
