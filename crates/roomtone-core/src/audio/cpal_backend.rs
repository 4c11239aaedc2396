//! cpal output stream
//!
//! ```text
//! ┌──────────────────┐   TransportCommand    ┌─────────────────────┐
//! │    UI Thread     │──────push()──────────►│   Command Ring      │
//! │   (Transport)    │                       │  (lock-free SPSC)   │
//! └──────────────────┘                       └──────────┬──────────┘
//!      ▲        ▲                                       │ pop()
//!      │        │ relaxed atomics                       ▼
//!      │  ┌─────┴────────────┐               ┌─────────────────────┐
//!      │  │ TransportAtomics │◄──────────────│  cpal Audio Thread  │
//!      │  └──────────────────┘               │  (owns RenderLoop)  │
//!      │         EngineChange                └──────────┬──────────┘
//!      └────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{BufferSize as CpalBufferSize, SampleFormat, Stream, StreamConfig};

use super::config::{AudioConfig, MAX_BUFFER_SIZE};
use super::device::{find_device_by_id, get_cpal_default_device};
use super::error::{AudioError, AudioResult};
use crate::render::{render_channel, AudioCallback, EngineLink};
use crate::reverb::SharedReverbParameters;
use crate::types::NUM_CHANNELS;

/// Keeps the output stream alive; drop it to stop audio
pub struct AudioHandle {
    _stream: Stream,
    device_name: String,
}

impl AudioHandle {
    pub fn device_name(&self) -> &str {
        &self.device_name
    }
}

/// A running output stream and the link to its render loop
pub struct AudioSystem {
    pub handle: AudioHandle,
    pub link: EngineLink,
    pub sample_rate: u32,
    pub buffer_size: u32,
    pub latency_ms: f32,
}

/// Open the configured device and start rendering
pub fn start_audio_system(
    config: &AudioConfig,
    params: Arc<SharedReverbParameters>,
) -> AudioResult<AudioSystem> {
    let device = match &config.device {
        Some(id) => find_device_by_id(id)?,
        None => get_cpal_default_device()?,
    };
    let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
    log::info!("Using audio device: {}", device_name);

    let supported = get_output_config(&device, config)?;
    let sample_rate = supported.sample_rate().0;
    let buffer_size = config.buffer_size.frames();
    let latency_ms = config.buffer_size.latency_ms(sample_rate);

    let stream_config = StreamConfig {
        channels: supported.channels(),
        sample_rate: supported.sample_rate(),
        buffer_size: CpalBufferSize::Fixed(buffer_size),
    };

    log::info!(
        "Audio config: {} channels, {}Hz, {} frames (~{:.1}ms latency)",
        stream_config.channels,
        sample_rate,
        buffer_size,
        latency_ms
    );

    let (mut render, link) = render_channel(params);
    render.prepare(buffer_size as usize, sample_rate);

    let stream = build_output_stream(&device, &stream_config, render)?;
    stream
        .play()
        .map_err(|e| AudioError::StreamPlayError(e.to_string()))?;

    log::info!("Audio stream started");

    Ok(AudioSystem {
        handle: AudioHandle {
            _stream: stream,
            device_name,
        },
        link,
        sample_rate,
        buffer_size,
        latency_ms,
    })
}

/// Pick an f32 output config at the requested rate
///
/// Prefers stereo-capable configs that include the target rate, then any
/// f32 config at its closest rate.
fn get_output_config(
    device: &cpal::Device,
    config: &AudioConfig,
) -> AudioResult<cpal::SupportedStreamConfig> {
    let supported_configs: Vec<_> = device
        .supported_output_configs()
        .map_err(|e| AudioError::ConfigError(e.to_string()))?
        .filter(|c| c.sample_format() == SampleFormat::F32)
        .collect();

    if supported_configs.is_empty() {
        return Err(AudioError::UnsupportedFormat(
            "device has no f32 output configuration".to_string(),
        ));
    }

    let target = config.target_sample_rate();
    let in_range = |c: &&cpal::SupportedStreamConfigRange| {
        target >= c.min_sample_rate().0 && target <= c.max_sample_rate().0
    };

    let best = supported_configs
        .iter()
        .filter(|c| c.channels() as usize >= NUM_CHANNELS)
        .find(in_range)
        .or_else(|| supported_configs.iter().find(|c| c.channels() as usize >= NUM_CHANNELS))
        .or_else(|| supported_configs.first())
        .ok_or_else(|| AudioError::ConfigError("No suitable output configuration found".to_string()))?;

    let rate = choose_sample_rate(target, best.min_sample_rate().0, best.max_sample_rate().0);
    if rate != target {
        log::warn!(
            "Audio device doesn't support {}Hz, falling back to {}Hz (files will be resampled)",
            target,
            rate
        );
    }

    Ok(best.clone().with_sample_rate(cpal::SampleRate(rate)))
}

/// Clamp the requested rate into a device range
fn choose_sample_rate(target: u32, min: u32, max: u32) -> u32 {
    if target < min {
        min
    } else if target > max {
        max
    } else {
        target
    }
}

/// Audio-thread state: the callback plus its planar scratch buffers
///
/// Dropped together with the stream closure, which releases the callback.
struct StreamState<C: AudioCallback> {
    callback: C,
    left: Vec<f32>,
    right: Vec<f32>,
}

impl<C: AudioCallback> StreamState<C> {
    fn new(callback: C) -> Self {
        Self {
            callback,
            left: vec![0.0; MAX_BUFFER_SIZE],
            right: vec![0.0; MAX_BUFFER_SIZE],
        }
    }

    /// Render into an interleaved device buffer
    ///
    /// Device buffers larger than the scratch are rendered in chunks.
    fn fill(&mut self, data: &mut [f32], channels: usize) {
        for chunk in data.chunks_mut(MAX_BUFFER_SIZE * channels) {
            let frames = chunk.len() / channels;
            let left = &mut self.left[..frames];
            let right = &mut self.right[..frames];
            self.callback.render(left, right);

            for (i, frame) in chunk.chunks_exact_mut(channels).enumerate() {
                if channels == 1 {
                    frame[0] = 0.5 * (left[i] + right[i]);
                    continue;
                }
                frame[0] = left[i];
                frame[1] = right[i];
                for sample in frame.iter_mut().skip(NUM_CHANNELS) {
                    *sample = 0.0;
                }
            }
        }
    }
}

impl<C: AudioCallback> Drop for StreamState<C> {
    fn drop(&mut self) {
        self.callback.release();
    }
}

fn build_output_stream<C: AudioCallback + 'static>(
    device: &cpal::Device,
    config: &StreamConfig,
    callback: C,
) -> AudioResult<Stream> {
    let channels = config.channels.max(1) as usize;
    let mut state = StreamState::new(callback);

    device
        .build_output_stream(
            config,
            move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                state.fill(data, channels);
            },
            move |err| {
                log::error!("Audio stream error: {}", err);
            },
            None,
        )
        .map_err(|e| AudioError::StreamBuildError(e.to_string()))
}
