//! Offline sample rate conversion using rubato
//!
//! Sources are converted once on the loader thread so that the render loop
//! always reads frames at the device rate.

use rubato::{FftFixedIn, Resampler};

use super::error::{DecodeError, DecodeResult};
use super::DecodedAudio;

/// Input chunk size handed to the FFT resampler
const CHUNK_SIZE: usize = 1024;

/// Resample decoded audio to `target_sample_rate`
///
/// The resampler's output delay is trimmed and the result is truncated to
/// the exact expected length, so one second in is one second out.
pub fn resample(audio: &DecodedAudio, target_sample_rate: u32) -> DecodeResult<DecodedAudio> {
    let source_rate = audio.sample_rate();
    if source_rate == target_sample_rate || audio.is_empty() {
        return Ok(DecodedAudio::from_channels(
            audio.left().to_vec(),
            audio.right().to_vec(),
            target_sample_rate,
        ));
    }
    if source_rate == 0 || target_sample_rate == 0 {
        return Err(DecodeError::Resample(format!(
            "invalid rate conversion {}Hz -> {}Hz",
            source_rate, target_sample_rate
        )));
    }

    let mut resampler = FftFixedIn::<f32>::new(
        source_rate as usize,
        target_sample_rate as usize,
        CHUNK_SIZE,
        2,
        2,
    )
    .map_err(|e| DecodeError::Resample(e.to_string()))?;

    let expected =
        (audio.len() as f64 * target_sample_rate as f64 / source_rate as f64).round() as usize;
    let delay = resampler.output_delay();

    let mut left = Vec::with_capacity(expected + delay + CHUNK_SIZE);
    let mut right = Vec::with_capacity(expected + delay + CHUNK_SIZE);

    let input_left = audio.left();
    let input_right = audio.right();
    let mut pos = 0;

    while audio.len() - pos >= resampler.input_frames_next() {
        let n = resampler.input_frames_next();
        let chunk = [&input_left[pos..pos + n], &input_right[pos..pos + n]];
        let out = resampler
            .process(&chunk[..], None)
            .map_err(|e| DecodeError::Resample(e.to_string()))?;
        left.extend_from_slice(&out[0]);
        right.extend_from_slice(&out[1]);
        pos += n;
    }

    if pos < audio.len() {
        let chunk = [&input_left[pos..], &input_right[pos..]];
        let out = resampler
            .process_partial(Some(&chunk[..]), None)
            .map_err(|e| DecodeError::Resample(e.to_string()))?;
        left.extend_from_slice(&out[0]);
        right.extend_from_slice(&out[1]);
    }

    // Flush the filter tail until the delayed output covers the full length
    while left.len() < expected + delay {
        let out = resampler
            .process_partial(None::<&[&[f32]]>, None)
            .map_err(|e| DecodeError::Resample(e.to_string()))?;
        if out[0].is_empty() {
            break;
        }
        left.extend_from_slice(&out[0]);
        right.extend_from_slice(&out[1]);
    }

    let start = delay.min(left.len());
    let mut left = left.split_off(start);
    let mut right = right.split_off(start);
    left.resize(expected, 0.0);
    right.resize(expected, 0.0);

    log::debug!(
        "Resampled {} frames {}Hz -> {} frames {}Hz",
        audio.len(),
        source_rate,
        expected,
        target_sample_rate
    );

    Ok(DecodedAudio::from_channels(left, right, target_sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(frames: usize, freq: f32, rate: u32) -> DecodedAudio {
        let samples: Vec<f32> = (0..frames)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / rate as f32).sin() * 0.5)
            .collect();
        DecodedAudio::from_channels(samples.clone(), samples, rate)
    }

    #[test]
    fn test_same_rate_is_copy() {
        let audio = sine(1000, 440.0, 48000);
        let out = resample(&audio, 48000).unwrap();
        assert_eq!(out.len(), 1000);
        assert_eq!(out.left(), audio.left());
    }

    #[test]
    fn test_upsample_length_and_rate() {
        let audio = sine(44100, 440.0, 44100);
        let out = resample(&audio, 48000).unwrap();
        assert_eq!(out.sample_rate(), 48000);
        assert_eq!(out.len(), 48000);
    }

    #[test]
    fn test_downsample_keeps_signal_level() {
        let audio = sine(48000, 440.0, 48000);
        let out = resample(&audio, 44100).unwrap();
        assert_eq!(out.len(), 44100);

        // Skip the edges, the body should still be a half-scale sine
        let peak = out.left()[4000..40000]
            .iter()
            .fold(0.0f32, |acc, &s| acc.max(s.abs()));
        assert!(peak > 0.4 && peak < 0.6, "peak was {}", peak);
    }

    #[test]
    fn test_zero_rate_is_error() {
        let audio = DecodedAudio::from_channels(vec![0.0; 10], vec![0.0; 10], 0);
        assert!(matches!(resample(&audio, 48000), Err(DecodeError::Resample(_))));
    }
}
