//! Events reported by a sequencer poll

use heapless::Vec;
use pwrcap_hal::BufferId;

/// Upper bound on events from one poll
///
/// One completion, one burst transition, one burst start and one tick.
pub const MAX_EVENTS_PER_POLL: usize = 4;

/// Events from one poll, in the order they happened
pub type Events = Vec<Event, MAX_EVENTS_PER_POLL>;

/// Something the sequencer observed or did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// A completed buffer was consumed
    TransferComplete {
        /// Buffer holding the data
        buffer: BufferId,
        /// Transfers consumed since start
        total: u32,
    },
    /// A burst was armed and its first transfer started
    BurstStarted {
        /// Bursts started since start, including this one
        burst: u32,
    },
    /// Auto-restart dropped; the last transfer of the burst is in flight
    BurstReleased,
    /// Last transfer of the burst consumed
    BurstFinished {
        /// Bursts completed since start
        bursts: u32,
    },
    /// Timer flag consumed
    TimerTick,
}
