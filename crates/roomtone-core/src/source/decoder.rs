//! File decoding via Symphonia

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::error::{DecodeError, DecodeResult};
use super::resample::resample;
use super::{DecodedAudio, PlaybackSource};

/// Decode an audio file to planar stereo at its native sample rate
pub fn decode_file(path: &Path) -> DecodeResult<DecodedAudio> {
    let file = File::open(path).map_err(|e| DecodeError::Open {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| DecodeError::Unsupported(e.to_string()))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(DecodeError::NoAudioTrack)?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| DecodeError::Unsupported("Unknown sample rate".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| DecodeError::Unsupported(e.to_string()))?;

    let mut samples: Vec<f32> = Vec::new();
    let mut channels = 0usize;
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(e) => return Err(DecodeError::Decode(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                // Corrupt packet: skip it and keep going
                log::warn!("Skipping undecodable packet in {:?}: {}", path, e);
                continue;
            }
            Err(e) => return Err(DecodeError::Decode(e.to_string())),
        };

        if sample_buf.is_none() {
            let spec = *decoded.spec();
            channels = spec.channels.count();
            sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
        }

        if let Some(ref mut buf) = sample_buf {
            buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buf.samples());
        }
    }

    let audio = DecodedAudio::from_interleaved(&samples, channels, sample_rate);
    if audio.is_empty() {
        return Err(DecodeError::Empty);
    }

    log::debug!(
        "Decoded {:?}: {} frames, {} channel(s), {}Hz ({:.2}s)",
        path,
        audio.len(),
        channels,
        sample_rate,
        audio.duration_seconds()
    );

    Ok(audio)
}

/// Decode a file into a playback source at the given output rate
///
/// This is the decoder adapter entry point used by the loader thread. The
/// returned source is resampled to `target_sample_rate` so the render path
/// never has to convert rates.
pub fn load(path: &Path, target_sample_rate: u32) -> DecodeResult<PlaybackSource> {
    let start = std::time::Instant::now();
    let mut audio = decode_file(path)?;

    if target_sample_rate > 0 && audio.sample_rate() != target_sample_rate {
        audio = resample(&audio, target_sample_rate)?;
    }

    log::info!(
        "Loaded {:?} ({:.2}s at {}Hz) in {:?}",
        path,
        audio.duration_seconds(),
        audio.sample_rate(),
        start.elapsed()
    );

    Ok(PlaybackSource::new(audio))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, channels: u16, sample_rate: u32, frames: usize) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..frames {
            for ch in 0..channels {
                let value = if ch == 0 { (i % 100) as i16 * 100 } else { -((i % 100) as i16) * 100 };
                writer.write_sample(value).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_decode_stereo_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_wav(&path, 2, 48000, 4800);

        let audio = decode_file(&path).unwrap();
        assert_eq!(audio.len(), 4800);
        assert_eq!(audio.sample_rate(), 48000);
        assert!((audio.left()[1] - 100.0 / 32768.0).abs() < 1e-4);
        assert!((audio.right()[1] + 100.0 / 32768.0).abs() < 1e-4);
    }

    #[test]
    fn test_decode_mono_wav_fills_both_channels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        write_wav(&path, 1, 44100, 1000);

        let audio = decode_file(&path).unwrap();
        assert_eq!(audio.len(), 1000);
        assert_eq!(audio.left(), audio.right());
    }

    #[test]
    fn test_load_resamples_to_target_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cd.wav");
        write_wav(&path, 2, 44100, 44100);

        let source = load(&path, 48000).unwrap();
        assert_eq!(source.sample_rate(), 48000);
        // One second in, one second out (within a frame of rounding)
        assert!((source.total_length() as i64 - 48000).abs() <= 1);
    }

    #[test]
    fn test_missing_file_is_open_error() {
        let err = decode_file(Path::new("/nonexistent/file.wav")).unwrap_err();
        assert!(matches!(err, DecodeError::Open { .. }));
    }

    #[test]
    fn test_garbage_file_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.wav");
        std::fs::write(&path, b"definitely not a riff header").unwrap();

        let err = decode_file(&path).unwrap_err();
        assert!(matches!(err, DecodeError::Unsupported(_)));
    }
}
