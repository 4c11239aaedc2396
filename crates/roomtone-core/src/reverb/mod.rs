//! Stereo reverb processor and its hot-swappable parameters
//!
//! The controller writes [`SharedReverbParameters`] from the UI thread; the
//! render loop takes a [`ReverbParameters`] snapshot at the start of every
//! block and hands it to [`Reverb::process_stereo`].

mod freeverb;

pub use freeverb::Reverb;

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Reverb settings, all continuous values in [0.0, 1.0]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReverbParameters {
    /// Room size (larger is a longer tail)
    pub room_size: f32,
    /// High frequency damping of the tail
    pub damping: f32,
    /// Wet (reverberated) level
    pub wet_level: f32,
    /// Dry (direct) level
    pub dry_level: f32,
    /// Stereo width of the wet signal
    pub width: f32,
    /// Hold the current tail indefinitely and ignore new input
    pub freeze_mode: bool,
}

impl Default for ReverbParameters {
    fn default() -> Self {
        Self {
            room_size: 0.5,
            damping: 0.5,
            wet_level: 0.33,
            dry_level: 0.4,
            width: 1.0,
            freeze_mode: false,
        }
    }
}

impl ReverbParameters {
    /// Copy with every continuous value clamped to [0.0, 1.0]
    pub fn clamped(self) -> Self {
        Self {
            room_size: clamp_unit(self.room_size),
            damping: clamp_unit(self.damping),
            wet_level: clamp_unit(self.wet_level),
            dry_level: clamp_unit(self.dry_level),
            width: clamp_unit(self.width),
            freeze_mode: self.freeze_mode,
        }
    }
}

#[inline]
fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Lock-free reverb parameter store shared between UI and audio threads
///
/// Each field is its own atomic (f32 stored as bits), so a UI write never
/// blocks the render thread. A snapshot may mix an old and a new field when
/// it races a write; the next block picks up the rest.
#[derive(Debug)]
pub struct SharedReverbParameters {
    room_size: AtomicU32,
    damping: AtomicU32,
    wet_level: AtomicU32,
    dry_level: AtomicU32,
    width: AtomicU32,
    freeze_mode: AtomicBool,
}

impl SharedReverbParameters {
    pub fn new(params: ReverbParameters) -> Self {
        let params = params.clamped();
        Self {
            room_size: AtomicU32::new(params.room_size.to_bits()),
            damping: AtomicU32::new(params.damping.to_bits()),
            wet_level: AtomicU32::new(params.wet_level.to_bits()),
            dry_level: AtomicU32::new(params.dry_level.to_bits()),
            width: AtomicU32::new(params.width.to_bits()),
            freeze_mode: AtomicBool::new(params.freeze_mode),
        }
    }

    pub fn set_room_size(&self, value: f32) {
        store(&self.room_size, value);
    }

    pub fn set_damping(&self, value: f32) {
        store(&self.damping, value);
    }

    pub fn set_wet_level(&self, value: f32) {
        store(&self.wet_level, value);
    }

    pub fn set_dry_level(&self, value: f32) {
        store(&self.dry_level, value);
    }

    pub fn set_width(&self, value: f32) {
        store(&self.width, value);
    }

    pub fn set_freeze_mode(&self, freeze: bool) {
        self.freeze_mode.store(freeze, Ordering::Relaxed);
    }

    /// Overwrite every field
    pub fn set(&self, params: ReverbParameters) {
        self.set_room_size(params.room_size);
        self.set_damping(params.damping);
        self.set_wet_level(params.wet_level);
        self.set_dry_level(params.dry_level);
        self.set_width(params.width);
        self.set_freeze_mode(params.freeze_mode);
    }

    /// Read all fields (lock-free, called once per render block)
    #[inline]
    pub fn snapshot(&self) -> ReverbParameters {
        ReverbParameters {
            room_size: load(&self.room_size),
            damping: load(&self.damping),
            wet_level: load(&self.wet_level),
            dry_level: load(&self.dry_level),
            width: load(&self.width),
            freeze_mode: self.freeze_mode.load(Ordering::Relaxed),
        }
    }
}

impl Default for SharedReverbParameters {
    fn default() -> Self {
        Self::new(ReverbParameters::default())
    }
}

#[inline]
fn store(slot: &AtomicU32, value: f32) {
    slot.store(clamp_unit(value).to_bits(), Ordering::Relaxed);
}

#[inline]
fn load(slot: &AtomicU32) -> f32 {
    f32::from_bits(slot.load(Ordering::Relaxed))
}
