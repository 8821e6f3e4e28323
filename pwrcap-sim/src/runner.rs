//! Simulated main loop
//!
//! Every reference tick advances the fake timer and the fake capture driver.
//! When either raises an interrupt, the core "wakes": the sleep pin goes
//! high, the sequencer polls once, and the sleep pin goes low again. Ticks
//! without an interrupt are spent asleep.

use std::fmt;

use log::{debug, error, info, warn};
use pwrcap_core::config::{apply_iom_pin_setup, CaptureMode, IomPinSetup};
use pwrcap_core::debug::DebugRole;
use pwrcap_core::sequencer::{Event, Sequencer};
use pwrcap_core::timer::{seconds_to_ticks, PeriodicTimer};
use pwrcap_core::transfer::{StatsSnapshot, TransferState};
use pwrcap_hal::ReferenceClock;

use crate::clock::SimTimer;
use crate::config::SimFile;
use crate::driver::SimTransferDriver;
use crate::error::SimError;
use crate::gpio::RecordingGpio;

/// Reference clock of the simulated timer
pub const SIM_CLOCK: ReferenceClock = ReferenceClock::Lfrc512Hz;

/// Sequencer event stamped with the tick it happened on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedEvent {
    pub tick: u64,
    pub event: Event,
}

/// Outcome of a simulation run
#[derive(Debug, Clone)]
pub struct Report {
    /// Reference ticks simulated
    pub ticks: u64,
    /// Times the core woke up
    pub wakeups: u64,
    pub total_transfers: u32,
    pub bursts_started: u32,
    pub bursts_completed: u32,
    /// Interrupt-side counters
    pub stats: StatsSnapshot,
    /// Timer period, `None` while disarmed
    pub timer_period_micros: Option<u64>,
    /// Edges seen on each debug pin
    pub pin_edges: [(DebugRole, u32); 3],
    /// Every event, in order
    pub events: Vec<TimedEvent>,
}

impl Report {
    /// Timer ticks consumed between each finished burst and the next start
    pub fn idle_ticks_between_bursts(&self) -> Vec<u32> {
        let mut gaps = Vec::new();
        let mut counting: Option<u32> = None;

        for timed in &self.events {
            match timed.event {
                Event::BurstFinished { .. } => counting = Some(0),
                Event::TimerTick => {
                    if let Some(n) = counting.as_mut() {
                        *n += 1;
                    }
                }
                Event::BurstStarted { .. } => {
                    if let Some(n) = counting.take() {
                        gaps.push(n);
                    }
                }
                _ => {}
            }
        }
        gaps
    }

    /// Transfers consumed within each completed burst
    pub fn transfers_per_burst(&self) -> Vec<u32> {
        let mut bursts = Vec::new();
        let mut current: Option<u32> = None;

        for timed in &self.events {
            match timed.event {
                Event::BurstStarted { .. } => current = Some(0),
                Event::TransferComplete { .. } => {
                    if let Some(n) = current.as_mut() {
                        *n += 1;
                    }
                }
                Event::BurstFinished { .. } => {
                    if let Some(n) = current.take() {
                        bursts.push(n);
                    }
                }
                _ => {}
            }
        }
        bursts
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "simulated {} ticks ({:.1} s), {} wakeups",
            self.ticks,
            self.ticks as f64 / SIM_CLOCK.hz() as f64,
            self.wakeups
        )?;
        writeln!(
            f,
            "transfers: {}  bursts started: {}  bursts completed: {}",
            self.total_transfers, self.bursts_started, self.bursts_completed
        )?;
        writeln!(
            f,
            "isr: {}  dma complete: {}  fifo overflow: {}  dma error: {}  timer: {}",
            self.stats.isr_count,
            self.stats.complete_count,
            self.stats.fifo_overflows,
            self.stats.dma_errors,
            self.stats.timer_ticks
        )?;
        match self.timer_period_micros {
            Some(us) => writeln!(f, "timer period: {us} us")?,
            None => writeln!(f, "timer period: disarmed")?,
        }
        for (role, edges) in &self.pin_edges {
            writeln!(f, "debug pin {role:?}: {edges} edges")?;
        }
        Ok(())
    }
}

/// Capture loop driven by simulated interrupts
pub struct Simulation<'a> {
    shared: &'a TransferState,
    timer: PeriodicTimer<'a, SimTimer>,
    sequencer: Sequencer<SimTransferDriver, RecordingGpio>,
    tick: u64,
    wakeups: u64,
    events: Vec<TimedEvent>,
    halted: bool,
}

impl<'a> Simulation<'a> {
    /// Build the simulated board from a config file
    pub fn new(file: &SimFile, shared: &'a TransferState) -> Result<Self, SimError> {
        let mut config = file.capture;
        if config.normalize() {
            warn!("print_in_loop needs print_enabled, disabling loop output");
        }
        config.validate()?;

        let driver = SimTransferDriver::new(file.sim.transfer_ticks)
            .with_overflow_every(file.sim.overflow_every)
            .with_failing_restart(file.sim.fail_restart_at);
        let mut gpio = RecordingGpio::new();
        if let Some(iom) = config.capture.iom {
            apply_iom_pin_setup(&mut gpio, &IomPinSetup::parked(iom))?;
            debug!("iom{iom} pins parked");
        }
        let sequencer = Sequencer::new(&config, driver, gpio)?;

        Ok(Self {
            shared,
            timer: PeriodicTimer::new(SimTimer::new(SIM_CLOCK)),
            sequencer,
            tick: 0,
            wakeups: 0,
            events: Vec::new(),
            halted: false,
        })
    }

    /// Set up pins, timer and driver, then start capturing
    pub fn setup(&mut self) -> Result<(), SimError> {
        let config = *self.sequencer.config();
        let print = config.debug.print_enabled;

        if print {
            info!("pwrcap capture simulation");
        }

        self.sequencer.init()?;
        self.timer
            .init(config.capture.timer_period_ticks, self.shared)?;

        if print {
            match config.capture.mode {
                CaptureMode::Burst => info!(
                    "periodically capturing {} transfers, timer period {} ticks",
                    config.capture.burst_size, config.capture.timer_period_ticks
                ),
                CaptureMode::Continuous => info!("continuous capture"),
                CaptureMode::InitOnly => info!("capture peripheral initialized, not started"),
                CaptureMode::Disabled => info!("capture disabled, sleeping only"),
            }
        }

        self.sequencer.start()?;
        self.sequencer.enter_sleep();
        Ok(())
    }

    /// Advance one reference tick
    pub fn step(&mut self) -> Result<(), SimError> {
        if self.halted {
            return Ok(());
        }
        self.tick += 1;

        let mut woke = false;
        if self.timer.hardware_mut().advance() {
            self.timer.on_interrupt();
            woke = true;
        }
        if self.sequencer.driver_mut().advance(self.shared) {
            woke = true;
        }
        if !woke {
            return Ok(());
        }

        self.wakeups += 1;
        self.sequencer.exit_sleep();

        match self.sequencer.poll(self.shared) {
            Ok(events) => {
                for event in events {
                    self.log_event(event);
                    self.events.push(TimedEvent {
                        tick: self.tick,
                        event,
                    });
                }
            }
            Err(err) => {
                error!("capture error at tick {}: {:?}", self.tick, err);
                self.timer.disable();
                self.halted = true;
                return Err(SimError::Halted {
                    tick: self.tick,
                    error: err,
                });
            }
        }

        self.sequencer.enter_sleep();
        Ok(())
    }

    /// Advance `ticks` reference ticks, stopping at the first fatal error
    pub fn run_for(&mut self, ticks: u64) -> Result<(), SimError> {
        for _ in 0..ticks {
            self.step()?;
        }
        Ok(())
    }

    fn log_event(&self, event: Event) {
        if !self.sequencer.config().debug.print_in_loop {
            return;
        }
        let tick = self.tick;
        match event {
            Event::TransferComplete { buffer, total } => {
                debug!("[{tick}] transfer {total} complete ({buffer:?})")
            }
            Event::BurstStarted { burst } => info!(
                "[{tick}] sequence {burst} start, transfers {}",
                self.sequencer.total_transfers()
            ),
            Event::BurstReleased => debug!("[{tick}] auto-restart off, last transfer in flight"),
            Event::BurstFinished { bursts } => info!(
                "[{tick}] sequence complete, {bursts} done, transfers {}",
                self.sequencer.total_transfers()
            ),
            Event::TimerTick => {
                let stats = self.shared.stats();
                info!(
                    "[{tick}] transfers: {} isr: {} overflow: {} dma complete: {} dma error: {}",
                    self.sequencer.total_transfers(),
                    stats.isr_count,
                    stats.fifo_overflows,
                    stats.complete_count,
                    stats.dma_errors
                );
            }
        }
    }

    /// Current tick
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// The sequencer under simulation
    pub fn sequencer(&self) -> &Sequencer<SimTransferDriver, RecordingGpio> {
        &self.sequencer
    }

    /// Check if the loop stopped on a fatal error
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Check if the timer is still armed
    pub fn timer_armed(&self) -> bool {
        self.timer.is_armed()
    }

    /// Summarize the run so far
    pub fn report(&self) -> Report {
        let pins = self.sequencer.pins();
        let edges = |role| (role, pins.gpio().edges(pins.pin(role)));

        Report {
            ticks: self.tick,
            wakeups: self.wakeups,
            total_transfers: self.sequencer.total_transfers(),
            bursts_started: self.sequencer.bursts_started(),
            bursts_completed: self.sequencer.bursts_completed(),
            stats: self.shared.stats(),
            timer_period_micros: self.timer.period_micros(),
            pin_edges: [
                edges(DebugRole::Transfer),
                edges(DebugRole::Burst),
                edges(DebugRole::Sleep),
            ],
            events: self.events.clone(),
        }
    }
}

/// Run a config file for its configured duration
pub fn run(file: &SimFile) -> Result<Report, SimError> {
    let shared = TransferState::new();
    let mut sim = Simulation::new(file, &shared)?;
    sim.setup()?;
    sim.run_for(u64::from(seconds_to_ticks(file.sim.seconds, SIM_CLOCK)))?;
    Ok(sim.report())
}
