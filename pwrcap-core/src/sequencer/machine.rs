//! Sequencer state machine
//!
//! Pure state transitions; counters and driver calls live in the executor.

/// Sequencer states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Nothing running
    #[default]
    Idle,
    /// Free-running transfers
    ContinuousRunning,
    /// Burst mode started, waiting for the timer gate
    BurstWaiting,
    /// Burst running, driver re-arms after each completion
    BurstActive,
    /// Auto-restart dropped, final transfer of the burst in flight
    BurstComplete,
}

/// Inputs that move the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Trigger {
    /// Continuous capture started
    StartContinuous,
    /// Burst mode started
    StartBurstMode,
    /// Timer gate opened for a burst of more than one transfer
    ArmBurst,
    /// Timer gate opened for a single-transfer burst
    ArmFinalTransfer,
    /// Enough completions seen to stop re-arming
    BurstLimitReached,
    /// Final transfer of a burst consumed
    TransferDrained,
}

impl State {
    /// Check if the timer gate may count ticks and arm a burst
    pub fn accepts_burst_trigger(&self) -> bool {
        matches!(self, State::Idle | State::BurstWaiting)
    }

    /// Check if a burst is between arming and its last completion
    pub fn is_burst_in_progress(&self) -> bool {
        matches!(self, State::BurstActive | State::BurstComplete)
    }

    /// Process a trigger and return the next state
    pub fn transition(self, trigger: Trigger) -> Self {
        use State::*;
        use Trigger::*;

        match (self, trigger) {
            (Idle, StartContinuous) => ContinuousRunning,
            (Idle, StartBurstMode) => BurstWaiting,

            (Idle | BurstWaiting, ArmBurst) => BurstActive,
            (Idle | BurstWaiting, ArmFinalTransfer) => BurstComplete,

            (BurstActive, BurstLimitReached) => BurstComplete,
            (BurstComplete, TransferDrained) => Idle,

            // Default: stay in current state
            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_cycle() {
        let state = State::Idle.transition(Trigger::StartBurstMode);
        assert_eq!(state, State::BurstWaiting);

        let state = state.transition(Trigger::ArmBurst);
        assert_eq!(state, State::BurstActive);

        let state = state.transition(Trigger::BurstLimitReached);
        assert_eq!(state, State::BurstComplete);

        let state = state.transition(Trigger::TransferDrained);
        assert_eq!(state, State::Idle);

        // Next burst arms straight from idle
        assert_eq!(state.transition(Trigger::ArmBurst), State::BurstActive);
    }

    #[test]
    fn test_single_transfer_burst() {
        let state = State::BurstWaiting.transition(Trigger::ArmFinalTransfer);
        assert_eq!(state, State::BurstComplete);
        assert_eq!(state.transition(Trigger::TransferDrained), State::Idle);
    }

    #[test]
    fn test_no_rearm_while_burst_in_progress() {
        for state in [State::BurstActive, State::BurstComplete] {
            assert!(state.is_burst_in_progress());
            assert!(!state.accepts_burst_trigger());
            assert_eq!(state.transition(Trigger::ArmBurst), state);
        }
    }

    #[test]
    fn test_continuous_ignores_burst_triggers() {
        let state = State::Idle.transition(Trigger::StartContinuous);
        assert_eq!(state, State::ContinuousRunning);
        assert!(!state.is_burst_in_progress());

        for trigger in [
            Trigger::ArmBurst,
            Trigger::BurstLimitReached,
            Trigger::TransferDrained,
            Trigger::StartBurstMode,
        ] {
            assert_eq!(state.transition(trigger), State::ContinuousRunning);
        }
    }

    #[test]
    fn test_predicates() {
        assert!(State::Idle.accepts_burst_trigger());
        assert!(State::BurstWaiting.accepts_burst_trigger());
        assert!(!State::ContinuousRunning.accepts_burst_trigger());
        assert!(!State::Idle.is_burst_in_progress());
        assert!(!State::BurstWaiting.is_burst_in_progress());
    }
}
