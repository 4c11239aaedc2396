//! Errors from opening the output stream
//!
//! None of these are fatal: the player logs them and keeps running
//! without sound.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AudioError {
    /// Enumeration found nothing the player can drive
    #[error("No usable audio output devices found")]
    NoDevices,

    #[error("No default output device: {0}")]
    NoDefaultDevice(String),

    /// The device named in the config is gone
    #[error("Configured output device not found: {0}")]
    DeviceNotFound(String),

    #[error("Could not query output configs: {0}")]
    ConfigError(String),

    #[error("Could not build the output stream: {0}")]
    StreamBuildError(String),

    /// The stream was built but refused to start
    #[error("Could not start the output stream: {0}")]
    StreamPlayError(String),

    /// Render output is f32 only
    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),
}

pub type AudioResult<T> = Result<T, AudioError>;
