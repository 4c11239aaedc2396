//! Output device enumeration and lookup
//!
//! Devices are enumerated from every available cpal host so that a device
//! named in the config can be found whichever host exposes it.

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Host, HostId};

use super::config::DeviceId;
use super::error::{AudioError, AudioResult};

/// Display name for a host ID
fn host_name(host_id: HostId) -> String {
    let name = format!("{:?}", host_id);
    match name.as_str() {
        "Alsa" => "ALSA".to_string(),
        "Jack" => "JACK".to_string(),
        "Wasapi" => "WASAPI".to_string(),
        _ => name,
    }
}

fn get_host_by_name(name: &str) -> Option<Host> {
    cpal::available_hosts()
        .into_iter()
        .find(|&id| host_name(id) == name)
        .and_then(|id| cpal::host_from_id(id).ok())
}

/// An output device the player can drive
#[derive(Debug, Clone)]
pub struct AudioDevice {
    pub id: DeviceId,
    pub name: String,
    pub host: String,
    pub is_default: bool,
}

/// Whether any of a device's configs is stereo-capable 32-bit float
fn has_f32_stereo(configs: &[cpal::SupportedStreamConfigRange]) -> bool {
    configs
        .iter()
        .any(|c| c.sample_format() == cpal::SampleFormat::F32 && c.channels() >= 2)
}

/// Enumerate output devices from all hosts, defaults first
///
/// Devices without a stereo f32 output config are skipped, since the
/// stream is always built as f32.
pub fn get_output_devices() -> AudioResult<Vec<AudioDevice>> {
    let mut all_devices = Vec::new();

    for host_id in cpal::available_hosts() {
        let host = match cpal::host_from_id(host_id) {
            Ok(h) => h,
            Err(e) => {
                log::debug!("Could not initialize host {:?}: {}", host_id, e);
                continue;
            }
        };
        let host_label = host_name(host_id);
        let default_name = host.default_output_device().and_then(|d: cpal::Device| d.name().ok());

        let devices = match host.output_devices() {
            Ok(d) => d,
            Err(e) => {
                log::debug!("Could not enumerate devices for {:?}: {}", host_id, e);
                continue;
            }
        };

        for device in devices {
            let Ok(name) = device.name() else { continue };
            let configs: Vec<_> = match device.supported_output_configs() {
                Ok(c) => c.collect(),
                Err(_) => continue,
            };
            if !has_f32_stereo(&configs) {
                log::debug!("Skipping {} on {}: no stereo f32 output", name, host_label);
                continue;
            }

            all_devices.push(AudioDevice {
                id: DeviceId::with_host(&name, &host_label),
                is_default: default_name.as_ref() == Some(&name),
                name,
                host: host_label.clone(),
            });
        }
    }

    if all_devices.is_empty() {
        return Err(AudioError::NoDevices);
    }

    all_devices.sort_by(|a, b| {
        b.is_default
            .cmp(&a.is_default)
            .then_with(|| a.host.cmp(&b.host))
            .then_with(|| a.name.cmp(&b.name))
    });

    Ok(all_devices)
}

/// Find a cpal device by ID
///
/// Uses the ID's host when given, otherwise searches every host by name.
pub(crate) fn find_device_by_id(id: &DeviceId) -> AudioResult<cpal::Device> {
    if let Some(host) = id.host.as_deref().and_then(get_host_by_name) {
        return host
            .output_devices()
            .map_err(|e| AudioError::ConfigError(e.to_string()))?
            .find(|d: &cpal::Device| d.name().ok().as_ref() == Some(&id.name))
            .ok_or_else(|| AudioError::DeviceNotFound(id.display_label()));
    }

    for host_id in cpal::available_hosts() {
        let Ok(host) = cpal::host_from_id(host_id) else { continue };
        let Ok(mut devices) = host.output_devices() else { continue };
        if let Some(device) = devices.find(|d: &cpal::Device| d.name().ok().as_ref() == Some(&id.name)) {
            return Ok(device);
        }
    }

    Err(AudioError::DeviceNotFound(id.display_label()))
}

/// Default output device of the default host
pub(crate) fn get_cpal_default_device() -> AudioResult<cpal::Device> {
    cpal::default_host()
        .default_output_device()
        .ok_or_else(|| AudioError::NoDefaultDevice("No default output device".to_string()))
}

/// Lightweight device entry for logs and settings lists
#[derive(Debug, Clone)]
pub struct OutputDevice {
    pub id: DeviceId,
    pub name: String,
    pub host: String,
    pub is_default: bool,
}

impl From<AudioDevice> for OutputDevice {
    fn from(device: AudioDevice) -> Self {
        Self {
            id: device.id,
            name: device.name,
            host: device.host,
            is_default: device.is_default,
        }
    }
}

impl std::fmt::Display for OutputDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.host, self.name)?;
        if self.is_default {
            f.write_str(" (default)")?;
        }
        Ok(())
    }
}

/// Available output devices, empty when enumeration fails
pub fn get_available_output_devices() -> Vec<OutputDevice> {
    match get_output_devices() {
        Ok(devices) => devices.into_iter().map(OutputDevice::from).collect(),
        Err(e) => {
            log::warn!("Failed to enumerate audio devices: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_enumeration() {
        // Depends on the machine; only checks that enumeration does not panic
        match get_output_devices() {
            Ok(devices) => {
                for device in &devices {
                    println!("{}", device.id.display_label());
                }
            }
            Err(AudioError::NoDevices) => println!("No audio devices available"),
            Err(e) => println!("Error enumerating devices: {}", e),
        }
    }

    fn range(channels: u16, format: cpal::SampleFormat) -> cpal::SupportedStreamConfigRange {
        cpal::SupportedStreamConfigRange::new(
            channels,
            cpal::SampleRate(44100),
            cpal::SampleRate(48000),
            cpal::SupportedBufferSize::Unknown,
            format,
        )
    }

    #[test]
    fn test_f32_stereo_filter() {
        assert!(has_f32_stereo(&[range(2, cpal::SampleFormat::F32)]));
        assert!(has_f32_stereo(&[
            range(2, cpal::SampleFormat::I16),
            range(8, cpal::SampleFormat::F32)
        ]));
        assert!(!has_f32_stereo(&[range(1, cpal::SampleFormat::F32)]));
        assert!(!has_f32_stereo(&[range(2, cpal::SampleFormat::I16)]));
        assert!(!has_f32_stereo(&[]));
    }

    #[test]
    fn test_output_device_display() {
        let device = OutputDevice {
            id: DeviceId::with_host("hw:0,0", "ALSA"),
            name: "hw:0,0".to_string(),
            host: "ALSA".to_string(),
            is_default: true,
        };
        assert_eq!(device.to_string(), "[ALSA] hw:0,0 (default)");
    }
}
