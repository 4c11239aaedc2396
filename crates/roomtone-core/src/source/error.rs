//! Decoder adapter error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while turning a file into a playable source
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The file could not be opened
    #[error("Failed to open audio file: {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The container or codec is not supported by the decoder
    #[error("Unsupported audio format: {0}")]
    Unsupported(String),

    /// The container holds no decodable audio track
    #[error("No audio track found")]
    NoAudioTrack,

    /// Reading or decoding packets failed
    #[error("Decode failed: {0}")]
    Decode(String),

    /// Sample rate conversion to the output rate failed
    #[error("Resampling failed: {0}")]
    Resample(String),

    /// The source was loaded for a different output rate
    #[error("Source is at {source_rate}Hz but output runs at {output_rate}Hz")]
    RateMismatch { source_rate: u32, output_rate: u32 },

    /// The file decoded to zero frames
    #[error("Audio file contains no samples")]
    Empty,
}

/// Result type for decoder operations
pub type DecodeResult<T> = Result<T, DecodeError>;
