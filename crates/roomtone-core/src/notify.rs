//! Change notification from the render thread to the UI
//!
//! The render loop reports every start and stop of the engine through a
//! [`ChangeBroadcaster`]. Notifying is a relaxed store plus a generation
//! bump, so it is safe inside the audio callback. Each [`ChangeListener`]
//! polls from the UI side and sees the most recent change it has not yet
//! consumed. Bursts coalesce: a listener that polls late only sees the last
//! change.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

/// Why the engine stopped producing sound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A halt command was applied
    Halted,
    /// The current source ran out of frames
    EndOfStream,
    /// A start was requested with no current source
    NoSource,
    /// The audio stream released its resources
    Released,
}

/// Engine change reported to listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineChange {
    /// The engine began producing sound from the current source
    Started,
    /// The engine is no longer producing sound
    Stopped(StopReason),
}

impl EngineChange {
    fn to_raw(self) -> u8 {
        match self {
            EngineChange::Started => 0,
            EngineChange::Stopped(StopReason::Halted) => 1,
            EngineChange::Stopped(StopReason::EndOfStream) => 2,
            EngineChange::Stopped(StopReason::NoSource) => 3,
            EngineChange::Stopped(StopReason::Released) => 4,
        }
    }

    fn from_raw(raw: u8) -> Self {
        match raw {
            0 => EngineChange::Started,
            2 => EngineChange::Stopped(StopReason::EndOfStream),
            3 => EngineChange::Stopped(StopReason::NoSource),
            4 => EngineChange::Stopped(StopReason::Released),
            _ => EngineChange::Stopped(StopReason::Halted),
        }
    }
}

#[derive(Debug)]
struct ChangeSlot {
    generation: AtomicU64,
    last: AtomicU8,
}

/// Sending side, owned by the render loop
#[derive(Debug, Clone)]
pub struct ChangeBroadcaster {
    slot: Arc<ChangeSlot>,
}

impl ChangeBroadcaster {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(ChangeSlot {
                generation: AtomicU64::new(0),
                last: AtomicU8::new(EngineChange::Stopped(StopReason::Halted).to_raw()),
            }),
        }
    }

    /// Publish a change (wait-free, allocation-free)
    #[inline]
    pub fn notify(&self, change: EngineChange) {
        self.slot.last.store(change.to_raw(), Ordering::Relaxed);
        self.slot.generation.fetch_add(1, Ordering::Release);
    }

    /// Create a listener that only sees changes published after this call
    pub fn subscribe(&self) -> ChangeListener {
        ChangeListener {
            slot: Arc::clone(&self.slot),
            seen: self.slot.generation.load(Ordering::Acquire),
        }
    }
}

impl Default for ChangeBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side, polled from the UI thread
#[derive(Debug)]
pub struct ChangeListener {
    slot: Arc<ChangeSlot>,
    seen: u64,
}

impl ChangeListener {
    /// Return the latest unseen change, if any
    pub fn poll(&mut self) -> Option<EngineChange> {
        let generation = self.slot.generation.load(Ordering::Acquire);
        if generation == self.seen {
            return None;
        }
        self.seen = generation;
        Some(EngineChange::from_raw(self.slot.last.load(Ordering::Relaxed)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_empty() {
        let broadcaster = ChangeBroadcaster::new();
        let mut listener = broadcaster.subscribe();
        assert_eq!(listener.poll(), None);
    }

    #[test]
    fn test_poll_consumes_once() {
        let broadcaster = ChangeBroadcaster::new();
        let mut listener = broadcaster.subscribe();

        broadcaster.notify(EngineChange::Started);
        assert_eq!(listener.poll(), Some(EngineChange::Started));
        assert_eq!(listener.poll(), None);
    }

    #[test]
    fn test_burst_coalesces_to_latest() {
        let broadcaster = ChangeBroadcaster::new();
        let mut listener = broadcaster.subscribe();

        broadcaster.notify(EngineChange::Started);
        broadcaster.notify(EngineChange::Stopped(StopReason::EndOfStream));
        assert_eq!(
            listener.poll(),
            Some(EngineChange::Stopped(StopReason::EndOfStream))
        );
        assert_eq!(listener.poll(), None);
    }

    #[test]
    fn test_listeners_are_independent() {
        let broadcaster = ChangeBroadcaster::new();
        let mut a = broadcaster.subscribe();
        broadcaster.notify(EngineChange::Started);
        let mut b = broadcaster.subscribe();

        assert_eq!(a.poll(), Some(EngineChange::Started));
        assert_eq!(b.poll(), None);
    }
}
