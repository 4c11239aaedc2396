//! Decoder adapter and playback sources
//!
//! A [`PlaybackSource`] is a read cursor over one fully decoded audio asset.
//! Decoding and resampling happen up front (on the loader thread), so the
//! render path only ever copies frames out of memory.
//!
//! The decoded frames live behind a `basedrop::Shared` pointer. When the
//! render thread replaces its current source, the old frames are handed to
//! the collector thread instead of being freed inside the audio callback.

mod decoder;
mod error;
mod resample;

use basedrop::Shared;

use crate::render::gc::gc_handle;
use crate::types::{frames_to_seconds, Sample};

pub use decoder::{decode_file, load};
pub use error::{DecodeError, DecodeResult};
pub use resample::resample;

/// Planar stereo audio decoded from a file
#[derive(Debug, Clone, Default)]
pub struct DecodedAudio {
    left: Vec<Sample>,
    right: Vec<Sample>,
    sample_rate: u32,
}

impl DecodedAudio {
    /// Build from separate left and right channels
    ///
    /// The longer channel is truncated if the lengths differ.
    pub fn from_channels(mut left: Vec<Sample>, mut right: Vec<Sample>, sample_rate: u32) -> Self {
        let len = left.len().min(right.len());
        left.truncate(len);
        right.truncate(len);
        Self {
            left,
            right,
            sample_rate,
        }
    }

    /// Build from interleaved samples with any channel count
    ///
    /// Mono is duplicated to both channels; for more than two channels only
    /// the first two are kept.
    pub fn from_interleaved(samples: &[Sample], channels: usize, sample_rate: u32) -> Self {
        if channels == 0 {
            return Self::from_channels(Vec::new(), Vec::new(), sample_rate);
        }

        let frames = samples.len() / channels;
        let mut left = Vec::with_capacity(frames);
        let mut right = Vec::with_capacity(frames);

        for frame in samples.chunks_exact(channels) {
            left.push(frame[0]);
            right.push(if channels > 1 { frame[1] } else { frame[0] });
        }

        Self {
            left,
            right,
            sample_rate,
        }
    }

    /// Number of stereo frames
    pub fn len(&self) -> usize {
        self.left.len()
    }

    /// Whether the asset has no frames
    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Sample rate the frames were decoded (or resampled) at
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Duration in seconds
    pub fn duration_seconds(&self) -> f64 {
        frames_to_seconds(self.len() as u64, self.sample_rate)
    }

    /// Left channel samples
    pub fn left(&self) -> &[Sample] {
        &self.left
    }

    /// Right channel samples
    pub fn right(&self) -> &[Sample] {
        &self.right
    }
}

/// A streaming read cursor over one decoded asset
///
/// Owned by the controller while pending, then moved to the render thread
/// when the transport enters `Starting`. Reading never allocates.
pub struct PlaybackSource {
    audio: Shared<DecodedAudio>,
    position: usize,
}

impl PlaybackSource {
    /// Wrap decoded audio in a new source positioned at frame 0
    pub fn new(audio: DecodedAudio) -> Self {
        Self {
            audio: Shared::new(&gc_handle(), audio),
            position: 0,
        }
    }

    /// Check the source against the active output rate
    ///
    /// Sources are resampled on the loader thread, so a mismatch here means
    /// the device rate changed after loading. Such a source is refused
    /// rather than played at the wrong pitch.
    pub fn prepare_to_play(&self, sample_rate: u32) -> DecodeResult<()> {
        if sample_rate > 0 && self.audio.sample_rate() != sample_rate {
            return Err(DecodeError::RateMismatch {
                source_rate: self.audio.sample_rate(),
                output_rate: sample_rate,
            });
        }
        Ok(())
    }

    /// Frame index the next read starts at
    pub fn next_read_position(&self) -> usize {
        self.position
    }

    /// Move the read cursor (clamped to the asset length)
    pub fn set_next_read_position(&mut self, position: usize) {
        self.position = position.min(self.audio.len());
    }

    /// Total length in frames
    pub fn total_length(&self) -> usize {
        self.audio.len()
    }

    /// Sample rate of the underlying frames
    pub fn sample_rate(&self) -> u32 {
        self.audio.sample_rate()
    }

    /// Whether the cursor reached the end of the asset
    pub fn is_exhausted(&self) -> bool {
        self.position >= self.audio.len()
    }

    /// Copy up to `left.len()` frames into the output channels
    ///
    /// Any shortfall at the end of the asset is zero-padded. Returns the
    /// number of frames actually read.
    pub fn read(&mut self, left: &mut [Sample], right: &mut [Sample]) -> usize {
        let frames = left.len().min(right.len());
        let available = self.audio.len().saturating_sub(self.position);
        let read = frames.min(available);

        let start = self.position;
        left[..read].copy_from_slice(&self.audio.left()[start..start + read]);
        right[..read].copy_from_slice(&self.audio.right()[start..start + read]);
        left[read..].fill(0.0);
        right[read..].fill(0.0);

        self.position += read;
        read
    }
}

impl std::fmt::Debug for PlaybackSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackSource")
            .field("frames", &self.audio.len())
            .field("sample_rate", &self.audio.sample_rate())
            .field("position", &self.position)
            .finish()
    }
}
