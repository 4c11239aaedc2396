//! cpal audio output
//!
//! Opens one stereo output stream and drives an [`AudioCallback`] from it.
//! The callback is moved into the stream closure and owned exclusively by
//! the audio thread; the UI talks to it only through the
//! [`EngineLink`](crate::render::EngineLink) returned alongside the stream.
//!
//! ```ignore
//! use roomtone_core::audio::{start_audio_system, AudioConfig};
//!
//! let system = start_audio_system(&AudioConfig::default(), params)?;
//! let transport = Transport::new(system.link);
//! // keep `system.handle` alive for as long as audio should play
//! ```
//!
//! [`AudioCallback`]: crate::render::AudioCallback

mod config;
mod cpal_backend;
mod device;
mod error;

pub use config::{AudioConfig, BufferSize, DeviceId, DEFAULT_BUFFER_SIZE, MAX_BUFFER_SIZE};
pub use cpal_backend::{start_audio_system, AudioHandle, AudioSystem};
pub use device::{get_available_output_devices, get_output_devices, AudioDevice, OutputDevice};
pub use error::{AudioError, AudioResult};
