//! Built-in demo effects used as units under test.
//!
//! These are deliberately simple, well-understood processors so the
//! engine's measurements have known expected results: a gain stage should
//! measure ~0% THD, the clipper should not, and the compressor should
//! show its configured ratio in Dynamics mode.

use medidor_core::{Effect, db_to_linear};

/// Unity pass-through.
pub struct PassThrough;

impl Effect for PassThrough {
    fn prepare(&mut self, _sample_rate: f32, _block_size: usize) {}
    fn process_stereo(&mut self, _left: &mut [f32], _right: &mut [f32]) {}
    fn reset(&mut self) {}
}

/// Fixed gain stage.
pub struct GainStage {
    gain: f32,
}

impl GainStage {
    /// Create a gain stage from a dB value.
    pub fn from_db(gain_db: f32) -> Self {
        Self {
            gain: db_to_linear(gain_db),
        }
    }
}

impl Effect for GainStage {
    fn prepare(&mut self, _sample_rate: f32, _block_size: usize) {}

    fn process_stereo(&mut self, left: &mut [f32], right: &mut [f32]) {
        for s in left.iter_mut().chain(right.iter_mut()) {
            *s *= self.gain;
        }
    }

    fn reset(&mut self) {}
}

/// Memoryless tanh soft clipper.
pub struct SoftClipper {
    drive: f32,
}

impl SoftClipper {
    /// Create a clipper with the given input drive (>= 1 distorts harder).
    pub fn new(drive: f32) -> Self {
        Self { drive }
    }
}

impl Effect for SoftClipper {
    fn prepare(&mut self, _sample_rate: f32, _block_size: usize) {}

    fn process_stereo(&mut self, left: &mut [f32], right: &mut [f32]) {
        for s in left.iter_mut().chain(right.iter_mut()) {
            *s = (*s * self.drive).tanh();
        }
    }

    fn reset(&mut self) {}
}

/// Feed-forward compressor with a one-pole envelope follower and a
/// hard-knee static curve.
pub struct Compressor {
    threshold_db: f32,
    ratio: f32,
    attack_secs: f32,
    release_secs: f32,
    attack_coeff: f32,
    release_coeff: f32,
    envelope: f32,
}

impl Compressor {
    /// Create a compressor with the given static curve and time constants.
    pub fn new(threshold_db: f32, ratio: f32, attack_secs: f32, release_secs: f32) -> Self {
        Self {
            threshold_db,
            ratio,
            attack_secs,
            release_secs,
            attack_coeff: 0.0,
            release_coeff: 0.0,
            envelope: 0.0,
        }
    }

    fn gain_for(&self, level: f32) -> f32 {
        let level_db = medidor_core::linear_to_db(level);
        if level_db <= self.threshold_db {
            return 1.0;
        }
        let over_db = level_db - self.threshold_db;
        let reduction_db = over_db - over_db / self.ratio;
        db_to_linear(-reduction_db)
    }
}

impl Effect for Compressor {
    fn prepare(&mut self, sample_rate: f32, _block_size: usize) {
        self.attack_coeff = (-1.0 / (self.attack_secs * sample_rate)).exp();
        self.release_coeff = (-1.0 / (self.release_secs * sample_rate)).exp();
        self.envelope = 0.0;
    }

    fn process_stereo(&mut self, left: &mut [f32], right: &mut [f32]) {
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let peak = l.abs().max(r.abs());
            let coeff = if peak > self.envelope {
                self.attack_coeff
            } else {
                self.release_coeff
            };
            self.envelope = coeff * self.envelope + (1.0 - coeff) * peak;

            let gain = self.gain_for(self.envelope);
            *l *= gain;
            *r *= gain;
        }
    }

    fn reset(&mut self) {
        self.envelope = 0.0;
    }
}

/// Name and one-line description of each built-in effect.
pub const CATALOG: [(&str, &str); 4] = [
    ("passthrough", "unity pass-through (baseline measurements)"),
    ("gain", "+6 dB clean gain stage"),
    ("clipper", "tanh soft clipper, drive 2.0"),
    ("compressor", "4:1 compressor, -30 dB threshold, 5 ms attack"),
];

/// Construct a built-in effect by name.
pub fn build(name: &str) -> Option<Box<dyn Effect + Send>> {
    match name {
        "passthrough" => Some(Box::new(PassThrough)),
        "gain" => Some(Box::new(GainStage::from_db(6.0))),
        "clipper" => Some(Box::new(SoftClipper::new(2.0))),
        "compressor" => Some(Box::new(Compressor::new(-30.0, 4.0, 0.005, 0.1))),
        _ => None,
    }
}
