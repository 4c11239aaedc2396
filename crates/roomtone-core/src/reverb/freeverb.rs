//! Freeverb stereo reverb
//!
//! Eight parallel lowpass-feedback comb filters followed by four series
//! all-pass filters per channel. The right channel's delay lines are offset
//! by a fixed stereo spread, which decorrelates the two tails.

use super::ReverbParameters;
use crate::types::Sample;

/// Comb delay lengths at 44.1kHz
const COMB_TUNINGS: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];

/// All-pass delay lengths at 44.1kHz
const ALLPASS_TUNINGS: [usize; 4] = [556, 441, 341, 225];

/// Extra delay for the right channel at 44.1kHz
const STEREO_SPREAD: usize = 23;

/// Reference rate the tunings are specified at
const TUNING_RATE: f64 = 44100.0;

/// Input gain into the comb bank
const FIXED_GAIN: f32 = 0.015;
const WET_SCALE: f32 = 3.0;
const DRY_SCALE: f32 = 2.0;
const DAMP_SCALE: f32 = 0.4;
const ROOM_SCALE: f32 = 0.28;
const ROOM_OFFSET: f32 = 0.7;

/// All-pass feedback coefficient
const ALLPASS_FEEDBACK: f32 = 0.5;

#[inline]
fn flush_denormal(value: f32) -> f32 {
    if value.abs() < 1.0e-15 {
        0.0
    } else {
        value
    }
}

fn scaled_length(tuning: usize, sample_rate: u32) -> usize {
    ((tuning as f64 * sample_rate as f64 / TUNING_RATE) as usize).max(1)
}

struct CombFilter {
    buffer: Vec<f32>,
    pos: usize,
    last: f32,
}

impl CombFilter {
    fn new(length: usize) -> Self {
        Self {
            buffer: vec![0.0; length],
            pos: 0,
            last: 0.0,
        }
    }

    #[inline]
    fn process(&mut self, input: f32, damp: f32, feedback: f32) -> f32 {
        let output = self.buffer[self.pos];
        self.last = flush_denormal(output * (1.0 - damp) + self.last * damp);
        self.buffer[self.pos] = input + self.last * feedback;
        self.pos += 1;
        if self.pos >= self.buffer.len() {
            self.pos = 0;
        }
        output
    }
}

struct AllpassFilter {
    buffer: Vec<f32>,
    pos: usize,
}

impl AllpassFilter {
    fn new(length: usize) -> Self {
        Self {
            buffer: vec![0.0; length],
            pos: 0,
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let buffered = self.buffer[self.pos];
        self.buffer[self.pos] = flush_denormal(input + buffered * ALLPASS_FEEDBACK);
        self.pos += 1;
        if self.pos >= self.buffer.len() {
            self.pos = 0;
        }
        buffered - input
    }
}

/// Gains derived from [`ReverbParameters`], ramped between blocks
#[derive(Debug, Clone, Copy, PartialEq)]
struct Gains {
    damp: f32,
    feedback: f32,
    dry: f32,
    wet1: f32,
    wet2: f32,
}

impl Gains {
    fn from_parameters(params: &ReverbParameters) -> Self {
        let params = params.clamped();
        let wet = params.wet_level * WET_SCALE;
        let (damp, feedback) = if params.freeze_mode {
            (0.0, 1.0)
        } else {
            (
                params.damping * DAMP_SCALE,
                params.room_size * ROOM_SCALE + ROOM_OFFSET,
            )
        };

        Self {
            damp,
            feedback,
            dry: params.dry_level * DRY_SCALE,
            wet1: 0.5 * wet * (1.0 + params.width),
            wet2: 0.5 * wet * (1.0 - params.width),
        }
    }
}

/// Stateful stereo reverb
///
/// Filter memory is allocated once for a sample rate and then only ever
/// written in place; [`Reverb::process_stereo`] never allocates. Changing
/// parameters never clears the filter memory, so the tail keeps ringing.
pub struct Reverb {
    sample_rate: u32,
    combs: [Vec<CombFilter>; 2],
    allpasses: [Vec<AllpassFilter>; 2],
    current: Gains,
}

impl Reverb {
    pub fn new(sample_rate: u32) -> Self {
        let sample_rate = sample_rate.max(1);
        let build_combs = |spread: usize| {
            COMB_TUNINGS
                .iter()
                .map(|&t| CombFilter::new(scaled_length(t + spread, sample_rate)))
                .collect::<Vec<_>>()
        };
        let build_allpasses = |spread: usize| {
            ALLPASS_TUNINGS
                .iter()
                .map(|&t| AllpassFilter::new(scaled_length(t + spread, sample_rate)))
                .collect::<Vec<_>>()
        };

        Self {
            sample_rate,
            combs: [build_combs(0), build_combs(STEREO_SPREAD)],
            allpasses: [build_allpasses(0), build_allpasses(STEREO_SPREAD)],
            current: Gains::from_parameters(&ReverbParameters::default()),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Rebuild the delay lines for a new sample rate
    ///
    /// Allocates and clears the tail. Only call outside the render callback.
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        if sample_rate.max(1) != self.sample_rate {
            let current = self.current;
            *self = Self::new(sample_rate);
            self.current = current;
        }
    }

    /// Process one block in place
    ///
    /// Damping, feedback and output gains ramp linearly across the block
    /// from the previous block's values to those derived from `params`.
    pub fn process_stereo(&mut self, left: &mut [Sample], right: &mut [Sample], params: &ReverbParameters) {
        let frames = left.len().min(right.len());
        if frames == 0 {
            return;
        }

        let target = Gains::from_parameters(params);
        let gain = if params.freeze_mode { 0.0 } else { FIXED_GAIN };

        let inv = 1.0 / frames as f32;
        let step = Gains {
            damp: (target.damp - self.current.damp) * inv,
            feedback: (target.feedback - self.current.feedback) * inv,
            dry: (target.dry - self.current.dry) * inv,
            wet1: (target.wet1 - self.current.wet1) * inv,
            wet2: (target.wet2 - self.current.wet2) * inv,
        };
        let mut g = self.current;

        let [combs_l, combs_r] = &mut self.combs;
        let [allpass_l, allpass_r] = &mut self.allpasses;

        for i in 0..frames {
            g.damp += step.damp;
            g.feedback += step.feedback;
            g.dry += step.dry;
            g.wet1 += step.wet1;
            g.wet2 += step.wet2;

            let input = (left[i] + right[i]) * gain;
            let mut out_l = 0.0f32;
            let mut out_r = 0.0f32;

            for comb in combs_l.iter_mut() {
                out_l += comb.process(input, g.damp, g.feedback);
            }
            for comb in combs_r.iter_mut() {
                out_r += comb.process(input, g.damp, g.feedback);
            }

            for allpass in allpass_l.iter_mut() {
                out_l = allpass.process(out_l);
            }
            for allpass in allpass_r.iter_mut() {
                out_r = allpass.process(out_r);
            }

            let dry_l = left[i];
            let dry_r = right[i];
            left[i] = out_l * g.wet1 + out_r * g.wet2 + dry_l * g.dry;
            right[i] = out_r * g.wet1 + out_l * g.wet2 + dry_r * g.dry;
        }

        // Land exactly on the target so float drift never accumulates
        self.current = target;
    }
}

impl std::fmt::Debug for Reverb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reverb")
            .field("sample_rate", &self.sample_rate)
            .field("gains", &self.current)
            .finish()
    }
}
