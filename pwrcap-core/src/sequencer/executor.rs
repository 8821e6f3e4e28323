//! Sequencer main loop step
//!
//! [`Sequencer::poll`] is called once per main loop iteration, after the
//! core wakes from sleep. Each call handles, in order:
//! 1. a pending completion (consume the buffer, count, maybe end a burst)
//! 2. the burst timer gate (maybe arm a new burst)
//! 3. the timer flag (cleared)

use pwrcap_hal::{
    BufferId, DriverError, GpioBank, GpioError, InterruptMask, TransferDriver,
};

use super::events::{Event, Events};
use super::machine::{State, Trigger};
use crate::config::{CaptureConfig, CaptureMode, ConfigError};
use crate::debug::{DebugPins, DebugRole};
use crate::transfer::TransferState;

/// Timer ticks observed while idle before a burst is armed
///
/// One tick is skipped so a burst never starts on the tick the previous one
/// finished, while its DMA may still be tearing down.
pub const RESTART_DELAY_TICKS: u32 = 2;

/// Errors that stop the sequencer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequencerError {
    /// Debug pin setup failed
    Gpio(GpioError),
    /// Capture driver rejected a request
    Driver(DriverError),
    /// Configuration rejected
    Config(ConfigError),
}

impl From<GpioError> for SequencerError {
    fn from(e: GpioError) -> Self {
        SequencerError::Gpio(e)
    }
}

impl From<DriverError> for SequencerError {
    fn from(e: DriverError) -> Self {
        SequencerError::Driver(e)
    }
}

impl From<ConfigError> for SequencerError {
    fn from(e: ConfigError) -> Self {
        SequencerError::Config(e)
    }
}

/// Capture sequencer
///
/// Owns the capture driver and the debug pins. Everything interrupt
/// handlers write lives in a [`TransferState`] passed to [`poll`](Self::poll).
pub struct Sequencer<D, G> {
    config: CaptureConfig,
    driver: D,
    pins: DebugPins<G>,
    state: State,
    /// Transfers started in the current burst
    transfers_this_burst: u32,
    /// Idle timer ticks counted towards the next burst
    delay_counter: u32,
    total_transfers: u32,
    bursts_started: u32,
    bursts_completed: u32,
}

impl<D: TransferDriver, G: GpioBank> Sequencer<D, G> {
    /// Create a sequencer from a validated configuration
    pub fn new(config: &CaptureConfig, driver: D, gpio: G) -> Result<Self, SequencerError> {
        config.validate()?;

        Ok(Self {
            config: *config,
            driver,
            pins: DebugPins::new(gpio, config.debug_pin_map()),
            state: State::Idle,
            transfers_this_burst: 0,
            delay_counter: 0,
            total_transfers: 0,
            bursts_started: 0,
            bursts_completed: 0,
        })
    }

    /// Set up debug pins and the capture driver
    ///
    /// Does not start any transfer. In [`CaptureMode::Disabled`] the driver
    /// is left untouched.
    pub fn init(&mut self) -> Result<(), SequencerError> {
        self.pins.init()?;

        if self.config.capture.mode.configures_driver() {
            let descriptor = self.config.descriptor();
            self.driver.configure(&descriptor)?;
            self.driver.enable_interrupts(InterruptMask::DMA_CAPTURE)?;
            self.driver.set_auto_restart(descriptor.auto_restart);
        }

        Ok(())
    }

    /// Begin capturing according to the configured mode
    ///
    /// Continuous mode starts its first transfer here. Burst mode only
    /// begins waiting for the timer gate.
    pub fn start(&mut self) -> Result<(), SequencerError> {
        match self.config.capture.mode {
            CaptureMode::Continuous => {
                self.driver.set_auto_restart(true);
                self.pins.toggle(DebugRole::Transfer);
                if let Err(e) = self.driver.restart() {
                    self.driver.set_auto_restart(false);
                    return Err(e.into());
                }
                self.state = self.state.transition(Trigger::StartContinuous);
            }
            CaptureMode::Burst => {
                self.delay_counter = 0;
                self.state = self.state.transition(Trigger::StartBurstMode);
            }
            CaptureMode::Disabled | CaptureMode::InitOnly => {}
        }
        Ok(())
    }

    /// Run one main loop iteration
    ///
    /// A failed restart is returned as an error; the caller is expected to
    /// stop the loop.
    pub fn poll(&mut self, shared: &TransferState) -> Result<Events, SequencerError> {
        let mut events = Events::new();

        if shared.take_data_ready() {
            if let Some(buffer) = shared.take_buffer() {
                self.on_completion(buffer, &mut events);
            }
        }

        // One read-and-clear serves both the gate and the tick event
        let timer_fired = shared.take_timer_flag();

        if timer_fired
            && self.config.capture.mode == CaptureMode::Burst
            && self.state.accepts_burst_trigger()
        {
            self.delay_counter += 1;
            if self.delay_counter >= RESTART_DELAY_TICKS {
                self.arm_burst(&mut events)?;
            }
        }

        if timer_fired {
            emit(&mut events, Event::TimerTick);
        }

        Ok(events)
    }

    fn on_completion(&mut self, buffer: BufferId, events: &mut Events) {
        self.total_transfers = self.total_transfers.wrapping_add(1);
        self.pins.toggle(DebugRole::Transfer);
        emit(
            events,
            Event::TransferComplete {
                buffer,
                total: self.total_transfers,
            },
        );

        match self.state {
            State::BurstActive => {
                self.transfers_this_burst += 1;
                if self.transfers_this_burst >= self.config.capture.burst_size {
                    // The driver already re-armed for the last transfer
                    self.driver.set_auto_restart(false);
                    self.pins.set(DebugRole::Burst, false);
                    self.state = self.state.transition(Trigger::BurstLimitReached);
                    emit(events, Event::BurstReleased);
                }
            }
            State::BurstComplete => {
                self.state = self.state.transition(Trigger::TransferDrained);
                self.bursts_completed += 1;
                emit(
                    events,
                    Event::BurstFinished {
                        bursts: self.bursts_completed,
                    },
                );
            }
            State::Idle | State::BurstWaiting | State::ContinuousRunning => {}
        }
    }

    fn arm_burst(&mut self, events: &mut Events) -> Result<(), SequencerError> {
        let previous = self.state;
        self.delay_counter = 0;
        self.transfers_this_burst = 1;

        let rearm = self.config.capture.burst_size > 1;
        self.driver.set_auto_restart(rearm);
        self.pins.set(DebugRole::Burst, rearm);
        self.state = self.state.transition(if rearm {
            Trigger::ArmBurst
        } else {
            Trigger::ArmFinalTransfer
        });

        self.pins.toggle(DebugRole::Transfer);
        if let Err(e) = self.driver.restart() {
            self.driver.set_auto_restart(false);
            self.pins.set(DebugRole::Burst, false);
            self.state = previous;
            return Err(e.into());
        }

        self.bursts_started += 1;
        emit(
            events,
            Event::BurstStarted {
                burst: self.bursts_started,
            },
        );
        Ok(())
    }

    /// About to sleep until the next interrupt
    pub fn enter_sleep(&mut self) {
        self.pins.mark_asleep();
    }

    /// Woken by an interrupt
    pub fn exit_sleep(&mut self) {
        self.pins.mark_awake();
    }

    /// Current state
    pub fn state(&self) -> State {
        self.state
    }

    /// Configuration in use
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Transfers consumed since start
    pub fn total_transfers(&self) -> u32 {
        self.total_transfers
    }

    /// Bursts armed since start
    pub fn bursts_started(&self) -> u32 {
        self.bursts_started
    }

    /// Bursts whose last transfer was consumed
    pub fn bursts_completed(&self) -> u32 {
        self.bursts_completed
    }

    /// Transfers started in the current burst
    pub fn transfers_this_burst(&self) -> u32 {
        self.transfers_this_burst
    }

    /// Idle ticks counted towards the next burst
    pub fn delay_counter(&self) -> u32 {
        self.delay_counter
    }

    /// Access the capture driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Mutable access to the capture driver
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Access the debug pins
    pub fn pins(&self) -> &DebugPins<G> {
        &self.pins
    }
}

fn emit(events: &mut Events, event: Event) {
    // Capacity covers the most one poll can produce
    let _ = events.push(event);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DebugPinMap;
    use pwrcap_hal::{PinFunction, TransferDescriptor};

    /// Driver that records calls; completions are injected by the test
    #[derive(Default)]
    struct ScriptedDriver {
        descriptor: Option<TransferDescriptor>,
        interrupts: InterruptMask,
        auto_restart: bool,
        restarts: u32,
        fail_restart: bool,
    }

    impl TransferDriver for ScriptedDriver {
        fn configure(&mut self, descriptor: &TransferDescriptor) -> Result<(), DriverError> {
            self.descriptor = Some(*descriptor);
            Ok(())
        }

        fn enable_interrupts(&mut self, mask: InterruptMask) -> Result<(), DriverError> {
            self.interrupts = mask;
            Ok(())
        }

        fn set_auto_restart(&mut self, enabled: bool) {
            self.auto_restart = enabled;
        }

        fn auto_restart(&self) -> bool {
            self.auto_restart
        }

        fn restart(&mut self) -> Result<(), DriverError> {
            if self.fail_restart {
                return Err(DriverError::Status(3));
            }
            self.restarts += 1;
            Ok(())
        }
    }

    #[derive(Default)]
    struct Levels([bool; 8]);

    impl GpioBank for Levels {
        fn configure(&mut self, _pin: u32, _function: PinFunction) -> Result<(), GpioError> {
            Ok(())
        }

        fn set_high(&mut self, pin: u32) {
            self.0[pin as usize] = true;
        }

        fn set_low(&mut self, pin: u32) {
            self.0[pin as usize] = false;
        }

        fn toggle(&mut self, pin: u32) {
            self.0[pin as usize] = !self.0[pin as usize];
        }

        fn is_set_high(&self, pin: u32) -> bool {
            self.0[pin as usize]
        }
    }

    fn config(mode: CaptureMode, burst_size: u32) -> CaptureConfig {
        let mut config = CaptureConfig::default();
        config.capture.mode = mode;
        config.capture.burst_size = burst_size;
        config.debug.transfer_pin = 1;
        config.debug.burst_pin = 2;
        config.debug.sleep_pin = 3;
        config
    }

    fn started(mode: CaptureMode, burst_size: u32) -> Sequencer<ScriptedDriver, Levels> {
        let mut seq =
            Sequencer::new(&config(mode, burst_size), ScriptedDriver::default(), Levels::default())
                .unwrap();
        seq.init().unwrap();
        seq.start().unwrap();
        seq
    }

    fn tick(seq: &mut Sequencer<ScriptedDriver, Levels>, shared: &TransferState) -> Events {
        shared.raise_timer_flag();
        seq.poll(shared).unwrap()
    }

    fn complete(
        seq: &mut Sequencer<ScriptedDriver, Levels>,
        shared: &TransferState,
        buffer: BufferId,
    ) -> Events {
        shared.on_transfer_interrupt(InterruptMask::DMA_COMPLETE, Some(buffer));
        seq.poll(shared).unwrap()
    }

    #[test]
    fn test_init_configures_driver() {
        let seq = started(CaptureMode::Burst, 4);
        let driver = seq.driver();
        assert_eq!(driver.interrupts, InterruptMask::DMA_CAPTURE);
        assert_eq!(driver.descriptor.unwrap().total_bytes, 16 * 1024);
        assert!(!driver.auto_restart);
        assert_eq!(driver.restarts, 0);
        assert_eq!(seq.state(), State::BurstWaiting);
        assert!(seq.pins().gpio().is_set_high(3));
    }

    #[test]
    fn test_disabled_mode_leaves_driver_alone() {
        let seq = started(CaptureMode::Disabled, 4);
        assert!(seq.driver().descriptor.is_none());
        assert_eq!(seq.state(), State::Idle);

        let seq = started(CaptureMode::InitOnly, 4);
        assert!(seq.driver().descriptor.is_some());
        assert_eq!(seq.driver().restarts, 0);
        assert_eq!(seq.state(), State::Idle);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let result = Sequencer::new(
            &config(CaptureMode::Burst, 0),
            ScriptedDriver::default(),
            Levels::default(),
        );
        assert!(matches!(
            result,
            Err(SequencerError::Config(ConfigError::InvalidBurstSize(0)))
        ));
    }

    #[test]
    fn test_double_tick_gate() {
        let shared = TransferState::new();
        let mut seq = started(CaptureMode::Burst, 4);

        let events = tick(&mut seq, &shared);
        assert_eq!(events.as_slice(), &[Event::TimerTick]);
        assert_eq!(seq.state(), State::BurstWaiting);
        assert_eq!(seq.delay_counter(), 1);
        assert_eq!(seq.driver().restarts, 0);

        let events = tick(&mut seq, &shared);
        assert_eq!(
            events.as_slice(),
            &[Event::BurstStarted { burst: 1 }, Event::TimerTick]
        );
        assert_eq!(seq.state(), State::BurstActive);
        assert_eq!(seq.delay_counter(), 0);
        assert_eq!(seq.transfers_this_burst(), 1);
        assert_eq!(seq.driver().restarts, 1);
        assert!(seq.driver().auto_restart());
        assert!(seq.pins().gpio().is_set_high(2));

        // Ticks during a burst do not arm another one
        tick(&mut seq, &shared);
        tick(&mut seq, &shared);
        assert_eq!(seq.driver().restarts, 1);
        assert_eq!(seq.bursts_started(), 1);
    }

    #[test]
    fn test_poll_without_flags_does_nothing() {
        let shared = TransferState::new();
        let mut seq = started(CaptureMode::Burst, 4);
        for _ in 0..10 {
            assert!(seq.poll(&shared).unwrap().is_empty());
        }
        assert_eq!(seq.delay_counter(), 0);
    }

    #[test]
    fn test_burst_ends_on_last_completion() {
        for burst_size in [1u32, 2, 4, 7] {
            let shared = TransferState::new();
            let mut seq = started(CaptureMode::Burst, burst_size);
            tick(&mut seq, &shared);
            tick(&mut seq, &shared);
            assert!(seq.state().is_burst_in_progress());

            let mut buffer = BufferId::Ping;
            for n in 1..=burst_size {
                let events = complete(&mut seq, &shared, buffer);
                buffer = buffer.other();

                if n < burst_size {
                    assert!(seq.state().is_burst_in_progress(), "size {burst_size} n {n}");
                } else {
                    assert_eq!(seq.state(), State::Idle);
                    assert!(!seq.driver().auto_restart());
                    assert!(events.contains(&Event::BurstFinished { bursts: 1 }));
                }
                if n + 1 >= burst_size {
                    assert!(!seq.driver().auto_restart());
                }
            }

            assert_eq!(seq.total_transfers(), burst_size);
            assert_eq!(seq.bursts_completed(), 1);
            assert!(seq.pins().gpio().is_set_low(2));
        }
    }

    #[test]
    fn test_release_event_order() {
        let shared = TransferState::new();
        let mut seq = started(CaptureMode::Burst, 2);
        tick(&mut seq, &shared);
        tick(&mut seq, &shared);

        let events = complete(&mut seq, &shared, BufferId::Ping);
        assert_eq!(
            events.as_slice(),
            &[
                Event::TransferComplete {
                    buffer: BufferId::Ping,
                    total: 1
                },
                Event::BurstReleased
            ]
        );
        assert_eq!(seq.state(), State::BurstComplete);
    }

    #[test]
    fn test_completion_consumed_once() {
        let shared = TransferState::new();
        let mut seq = started(CaptureMode::Continuous, 4);

        shared.on_transfer_interrupt(InterruptMask::DMA_COMPLETE, Some(BufferId::Ping));
        assert_eq!(seq.poll(&shared).unwrap().len(), 1);
        assert!(seq.poll(&shared).unwrap().is_empty());
        assert_eq!(seq.total_transfers(), 1);
    }

    #[test]
    fn test_continuous_keeps_auto_restart() {
        let shared = TransferState::new();
        let mut seq = started(CaptureMode::Continuous, 4);
        assert_eq!(seq.state(), State::ContinuousRunning);
        assert_eq!(seq.driver().restarts, 1);

        let mut buffer = BufferId::Ping;
        for n in 1..=100 {
            complete(&mut seq, &shared, buffer);
            buffer = buffer.other();
            if n % 7 == 0 {
                tick(&mut seq, &shared);
            }
            assert!(seq.driver().auto_restart());
            assert_eq!(seq.state(), State::ContinuousRunning);
        }
        assert_eq!(seq.total_transfers(), 100);
        assert_eq!(seq.driver().restarts, 1);
    }

    #[test]
    fn test_restart_failure_is_fatal() {
        let shared = TransferState::new();
        let mut seq = started(CaptureMode::Burst, 4);
        seq.driver_mut().fail_restart = true;

        tick(&mut seq, &shared);
        shared.raise_timer_flag();
        assert_eq!(
            seq.poll(&shared),
            Err(SequencerError::Driver(DriverError::Status(3)))
        );
    }

    #[test]
    fn test_failed_arm_leaves_nothing_running() {
        let shared = TransferState::new();
        let mut seq = started(CaptureMode::Burst, 4);
        seq.driver_mut().fail_restart = true;

        tick(&mut seq, &shared);
        shared.raise_timer_flag();
        assert!(seq.poll(&shared).is_err());

        assert!(!seq.driver().auto_restart());
        assert!(!seq.pins().gpio().is_set_high(2));
        assert_eq!(seq.state(), State::BurstWaiting);
        assert_eq!(seq.bursts_started(), 0);
    }

    #[test]
    fn test_failed_continuous_start_clears_auto_restart() {
        let mut seq = Sequencer::new(
            &config(CaptureMode::Continuous, 4),
            ScriptedDriver::default(),
            Levels::default(),
        )
        .unwrap();
        seq.init().unwrap();
        seq.driver_mut().fail_restart = true;

        assert_eq!(
            seq.start(),
            Err(SequencerError::Driver(DriverError::Status(3)))
        );
        assert!(!seq.driver().auto_restart());
        assert_eq!(seq.state(), State::Idle);
    }

    #[test]
    fn test_each_tick_counted_once() {
        let shared = TransferState::new();
        let mut seq = started(CaptureMode::Burst, 4);

        // Flag raised after the previous poll is seen by the next one
        assert!(seq.poll(&shared).unwrap().is_empty());
        shared.raise_timer_flag();
        assert_eq!(seq.poll(&shared).unwrap().as_slice(), &[Event::TimerTick]);
        assert_eq!(seq.delay_counter(), 1);

        // Consumed tick does not advance the gate again
        assert!(seq.poll(&shared).unwrap().is_empty());
        assert_eq!(seq.delay_counter(), 1);

        shared.raise_timer_flag();
        let events = seq.poll(&shared).unwrap();
        assert_eq!(
            events.as_slice(),
            &[Event::BurstStarted { burst: 1 }, Event::TimerTick]
        );
        assert_eq!(seq.driver().restarts, 1);
    }

    #[test]
    fn test_errors_do_not_change_state() {
        let shared = TransferState::new();
        let mut seq = started(CaptureMode::Burst, 4);
        tick(&mut seq, &shared);
        tick(&mut seq, &shared);

        shared.on_transfer_interrupt(InterruptMask::OVERFLOW | InterruptMask::DMA_ERROR, None);
        assert!(seq.poll(&shared).unwrap().is_empty());
        assert_eq!(seq.state(), State::BurstActive);
        assert_eq!(shared.stats().dma_errors, 1);
    }

    #[test]
    fn test_sleep_pin() {
        let mut seq = started(CaptureMode::Burst, 4);
        seq.enter_sleep();
        assert!(seq.pins().gpio().is_set_low(3));
        seq.exit_sleep();
        assert!(seq.pins().gpio().is_set_high(3));
    }

    #[test]
    fn test_unused_pins_when_disabled() {
        let mut config = config(CaptureMode::Burst, 4);
        config.debug.pins_enabled = false;
        let seq = Sequencer::new(&config, ScriptedDriver::default(), Levels::default()).unwrap();
        assert_eq!(seq.pins().map(), DebugPinMap::UNUSED);
    }
}
