//! Render-thread state readable from the UI without locks

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use crate::audio::DEFAULT_BUFFER_SIZE;
use crate::types::{frames_to_seconds, DEFAULT_SAMPLE_RATE};

/// Transport state published by the render loop
///
/// All fields are written by the audio thread and read by the UI with
/// relaxed ordering. Values may be a block stale, which is fine for display
/// and for preparing sources.
#[derive(Debug)]
pub struct TransportAtomics {
    /// Engine is producing sound from the current source
    pub playing: AtomicBool,
    /// A current source is active
    pub has_source: AtomicBool,
    /// Read position of the current source in frames
    pub position: AtomicU64,
    /// Length of the current source in frames
    pub length: AtomicU64,
    /// Output sample rate reported by the backend
    pub sample_rate: AtomicU32,
    /// Block size reported by the backend
    pub block_size: AtomicU32,
    /// Blocks that had to be zero-padded while playing
    pub underruns: AtomicU64,
}

impl TransportAtomics {
    pub fn new() -> Self {
        Self {
            playing: AtomicBool::new(false),
            has_source: AtomicBool::new(false),
            position: AtomicU64::new(0),
            length: AtomicU64::new(0),
            sample_rate: AtomicU32::new(DEFAULT_SAMPLE_RATE),
            block_size: AtomicU32::new(DEFAULT_BUFFER_SIZE),
            underruns: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn has_source(&self) -> bool {
        self.has_source.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn position(&self) -> u64 {
        self.position.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn length(&self) -> u64 {
        self.length.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn block_size(&self) -> u32 {
        self.block_size.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn underruns(&self) -> u64 {
        self.underruns.load(Ordering::Relaxed)
    }

    /// Current position in seconds at the output rate
    pub fn position_seconds(&self) -> f64 {
        frames_to_seconds(self.position(), self.sample_rate())
    }

    /// Show position 0 right away, ahead of the render thread's rewind
    pub fn reset_position(&self) {
        self.position.store(0, Ordering::Relaxed);
    }
}

impl Default for TransportAtomics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_seconds() {
        let atomics = TransportAtomics::new();
        atomics.sample_rate.store(44100, Ordering::Relaxed);
        atomics.position.store(66150, Ordering::Relaxed);
        assert!((atomics.position_seconds() - 1.5).abs() < 1e-9);

        atomics.reset_position();
        assert_eq!(atomics.position(), 0);
    }
}
