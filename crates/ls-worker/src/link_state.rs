//! Per-link mutable state, owned by exactly one worker.

use ls_core::LinkId;

/// Traffic currently on a link plus running counters.
///
/// Static attributes (free-flow time, capacity) stay in the shared
/// [`Network`][ls_network::Network]; only what changes during the run lives
/// here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkState {
    pub link: LinkId,

    /// Vehicles that have entered and not yet left.
    pub volume: u32,

    /// Vehicles that have entered over the whole run.
    pub entries: u64,

    /// Highest `volume` seen.
    pub peak_volume: u32,
}

impl LinkState {
    pub fn new(link: LinkId) -> Self {
        Self { link, volume: 0, entries: 0, peak_volume: 0 }
    }

    /// Record an entry; returns the volume the vehicle found on the link.
    #[inline]
    pub fn enter(&mut self) -> u32 {
        let before = self.volume;
        self.volume += 1;
        self.entries += 1;
        self.peak_volume = self.peak_volume.max(self.volume);
        before
    }

    /// Record an exit.  `None` if the link was already empty.
    #[inline]
    pub fn leave(&mut self) -> Option<u32> {
        self.volume = self.volume.checked_sub(1)?;
        Some(self.volume)
    }
}
