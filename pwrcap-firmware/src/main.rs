//! pwrcap - low-power capture firmware
//!
//! Captures ADC data with DMA into ping-pong buffers, either continuously
//! or in timed bursts gated by a periodic timer. Between interrupts the
//! executor sleeps; debug pins show transfers, bursts and sleep for a logic
//! analyzer.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::adc::{Adc, Channel, Config as AdcConfig, InterruptHandler as AdcInterruptHandler};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{AnyPin, Level, Output, Pull};
use embassy_rp::Peri;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use pwrcap_core::config::{parse_config, CaptureConfig, CaptureMode};
use pwrcap_core::timer::PeriodicTimer;
use pwrcap_core::sequencer::Sequencer;
use pwrcap_hal::ReferenceClock;

use crate::board::{BoardGpio, DEBUG_PIN_CANDIDATES, MAX_SAMPLES};
use crate::channels::SHARED;
use crate::clock::EmbassyTickTimer;
use crate::driver::AdcCaptureDriver;
use crate::tasks::capture::CaptureBuffers;

mod board;
mod channels;
mod clock;
mod driver;
mod tasks;

/// Embedded capture configuration (compiled into firmware)
/// Edit capture.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../capture.toml");

bind_interrupts!(struct Irqs {
    ADC_IRQ_FIFO => AdcInterruptHandler;
});

static BUFFERS: StaticCell<CaptureBuffers> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());

    let config = load_config();
    let print = config.debug.print_enabled;

    if print {
        info!("pwrcap capture firmware starting");
    }

    // Only the GPIOs the config asks for become outputs
    let map = config.debug_pin_map();
    let candidates: [(u32, Peri<'static, AnyPin>); DEBUG_PIN_CANDIDATES] = [
        (0, Peri::<AnyPin>::from(p.PIN_0)),
        (1, Peri::<AnyPin>::from(p.PIN_1)),
        (2, Peri::<AnyPin>::from(p.PIN_2)),
        (3, Peri::<AnyPin>::from(p.PIN_3)),
        (4, Peri::<AnyPin>::from(p.PIN_4)),
        (5, Peri::<AnyPin>::from(p.PIN_5)),
        (6, Peri::<AnyPin>::from(p.PIN_6)),
        (7, Peri::<AnyPin>::from(p.PIN_7)),
    ];
    let mut gpio = BoardGpio::new();
    for (number, pin) in candidates {
        if [map.transfer, map.burst, map.sleep].contains(&number)
            && gpio.add(number, Output::new(pin, Level::Low)).is_err()
        {
            warn!("Debug pin {} assigned twice", number);
        }
    }

    let mut sequencer = match Sequencer::new(&config, AdcCaptureDriver::new(), gpio) {
        Ok(sequencer) => sequencer,
        Err(e) => {
            error!("Sequencer rejected configuration: {:?}", e);
            return;
        }
    };

    if let Err(e) = sequencer.init() {
        error!("Capture setup failed: {:?}", e);
        return;
    }

    // The timer runs in every mode, also pacing the stats output
    let mut timer = PeriodicTimer::new(EmbassyTickTimer::new(ReferenceClock::Lfrc512Hz));
    if let Err(e) = timer.init(config.capture.timer_period_ticks, &SHARED) {
        error!("Timer setup failed: {:?}", e);
        return;
    }

    // ADC on GPIO26 (ADC0), DMA channel 0
    let adc = Adc::new(p.ADC, Irqs, AdcConfig::default());
    let channel = Channel::new_pin(p.PIN_26, Pull::None);
    let buffers = BUFFERS.init([[0; MAX_SAMPLES]; 2]);

    if print {
        match config.capture.mode {
            CaptureMode::Burst => info!(
                "Periodically capturing {} transfers of {} bytes, timer period {} ticks",
                config.capture.burst_size,
                config.transfer.total_bytes,
                config.capture.timer_period_ticks
            ),
            CaptureMode::Continuous => info!(
                "Continuous capture, {} bytes per transfer",
                config.transfer.total_bytes
            ),
            CaptureMode::InitOnly => info!("Capture configured, not started"),
            CaptureMode::Disabled => info!("Capture disabled, sleeping only"),
        }
    }

    spawner
        .spawn(tasks::capture_task(adc, channel, p.DMA_CH0, buffers, print))
        .unwrap();
    spawner.spawn(tasks::tick_task(timer, print)).unwrap();

    if let Err(e) = sequencer.start() {
        error!("Capture start failed: {:?}", e);
        return;
    }
    sequencer.enter_sleep();

    spawner.spawn(tasks::sequencer_task(sequencer)).unwrap();

    if print {
        info!("All tasks spawned, capture running");
    }
}

/// Parse and validate the embedded configuration
///
/// Falls back to defaults if the embedded file is broken, which the build
/// script should have caught.
fn load_config() -> CaptureConfig {
    let mut config = match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to parse embedded config: {:?}", e);
            CaptureConfig::default()
        }
    };

    if let Err(e) = config.validate() {
        error!("Invalid embedded config: {:?}, using defaults", e);
        config = CaptureConfig::default();
    }

    if config.normalize() {
        warn!("print_in_loop needs print_enabled, disabling loop output");
    }

    config
}
