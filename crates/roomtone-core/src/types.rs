//! Common types for roomtone

/// Audio sample type (32-bit float throughout the render path)
pub type Sample = f32;

/// Sample rate used when no audio device has reported one yet (48kHz)
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

/// Number of output channels the render path produces
pub const NUM_CHANNELS: usize = 2;

/// Convert a frame count to seconds at the given sample rate
///
/// Returns 0.0 for a zero sample rate instead of dividing by zero.
#[inline]
pub fn frames_to_seconds(frames: u64, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        0.0
    } else {
        frames as f64 / sample_rate as f64
    }
}
