//! Periodic timer task
//!
//! Fires the registered timer callback once per period and wakes the
//! sequencer. Stops for good when the sequencer halts.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_time::Ticker;
use pwrcap_core::timer::PeriodicTimer;

use crate::channels::{HALT, WAKE};
use crate::clock::EmbassyTickTimer;

/// Tick task - the timer interrupt
#[embassy_executor::task]
pub async fn tick_task(mut timer: PeriodicTimer<'static, EmbassyTickTimer>, print: bool) {
    let Some(period) = timer.hardware().period() else {
        warn!("Tick task started with a disarmed timer");
        return;
    };
    if print {
        info!("Tick task started, period {} us", period.as_micros());
    }

    let mut ticker = Ticker::every(period);

    loop {
        match select(ticker.next(), HALT.wait()).await {
            Either::First(()) => {
                timer.on_interrupt();
                WAKE.signal(());
            }
            Either::Second(()) => {
                timer.disable();
                if print {
                    info!("Timer disabled");
                }
                return;
            }
        }
    }
}
