//! Player configuration
//!
//! Read from `~/.config/roomtone/config.yaml` at startup. The file is never
//! written; every section and field is optional.
//!
//! ```yaml
//! audio:
//!   device:
//!     name: "hw:1,0"
//!     host: ALSA
//!   buffer_size: !Fixed 256
//!   sample_rate: 44100
//! reverb:
//!   room_size: 0.7
//!   wet_level: 0.25
//! ```

use roomtone_core::audio::AudioConfig;
use roomtone_core::reverb::ReverbParameters;
use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Output device and stream settings
    pub audio: AudioConfig,
    /// Reverb settings applied at startup
    pub reverb: ReverbParameters,
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomtone_core::audio::BufferSize;
    use roomtone_core::config::load_config;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: PlayerConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, PlayerConfig::default());
    }

    #[test]
    fn test_sections_are_applied() {
        let yaml = "audio:\n  buffer_size: !Fixed 256\n  sample_rate: 44100\nreverb:\n  room_size: 0.7\n  wet_level: 0.25\n";
        let config: PlayerConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.audio.buffer_size, BufferSize::Fixed(256));
        assert_eq!(config.audio.sample_rate, Some(44100));
        assert_eq!(config.reverb.room_size, 0.7);
        assert_eq!(config.reverb.wet_level, 0.25);
        assert_eq!(config.reverb.dry_level, 0.4);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config: PlayerConfig = load_config(std::path::Path::new("/nonexistent/roomtone.yaml"));
        assert_eq!(config, PlayerConfig::default());
    }
}
