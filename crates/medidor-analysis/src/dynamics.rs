//! Dynamics and envelope measurement.
//!
//! Two bounded time-series trackers fed by the drive loop:
//!
//! - [`DynamicsTracker`] collects per-block RMS level pairs (stimulus in,
//!   response out) and estimates a compression ratio from recent deltas.
//! - [`EnvelopeTracker`] collects per-sample rectified values and estimates
//!   the 10%→90% attack time over a trailing window.
//!
//! Both use pre-reserved `VecDeque`s so steady-state pushes never allocate.

use std::collections::VecDeque;

use medidor_core::linear_to_db_floor;

/// Floor for RMS level conversion.
const LEVEL_FLOOR_DB: f32 = -100.0;

/// Maximum number of (input, output) level pairs retained.
const MAX_LEVEL_PAIRS: usize = 1000;

/// Input-level deltas below this (in dB) are too small to divide by.
const RATIO_MIN_INPUT_DELTA_DB: f32 = 1.0;

/// RMS of a signal, linear scale.
pub fn rms(signal: &[f32]) -> f32 {
    if signal.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = signal.iter().map(|&x| x * x).sum();
    (sum_sq / signal.len() as f32).sqrt()
}

/// Per-block level pairs and the compression ratio derived from them.
#[derive(Debug, Clone)]
pub struct DynamicsTracker {
    input_levels_db: VecDeque<f32>,
    output_levels_db: VecDeque<f32>,
    compression_ratio: f32,
}

impl Default for DynamicsTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl DynamicsTracker {
    /// Create an empty tracker with capacity for 1000 level pairs.
    pub fn new() -> Self {
        Self {
            input_levels_db: VecDeque::with_capacity(MAX_LEVEL_PAIRS),
            output_levels_db: VecDeque::with_capacity(MAX_LEVEL_PAIRS),
            compression_ratio: 1.0,
        }
    }

    /// Feed one pre-effect / post-effect block pair (first channel).
    ///
    /// Appends the RMS of each (dB, −100 floor) and re-estimates the
    /// compression ratio once at least 10 pairs exist, using the level
    /// change between the newest pair and the pair 10 positions back. The
    /// ratio only updates when the input moved by more than 1 dB, which
    /// keeps the division away from near-silence instability.
    pub fn push_block(&mut self, input: &[f32], output: &[f32]) {
        let input_db = linear_to_db_floor(rms(input), LEVEL_FLOOR_DB);
        let output_db = linear_to_db_floor(rms(output), LEVEL_FLOOR_DB);

        if self.input_levels_db.len() == MAX_LEVEL_PAIRS {
            self.input_levels_db.pop_front();
            self.output_levels_db.pop_front();
        }
        self.input_levels_db.push_back(input_db);
        self.output_levels_db.push_back(output_db);

        let n = self.input_levels_db.len();
        if n >= 10 {
            let input_change = self.input_levels_db[n - 1] - self.input_levels_db[n - 10];
            let output_change = self.output_levels_db[n - 1] - self.output_levels_db[n - 10];
            if input_change.abs() > RATIO_MIN_INPUT_DELTA_DB {
                let ratio = input_change / output_change;
                if ratio.is_finite() {
                    self.compression_ratio = ratio;
                }
            }
        }
    }

    /// Estimated compression ratio (input dB change / output dB change).
    pub fn compression_ratio(&self) -> f32 {
        self.compression_ratio
    }

    /// Recorded input levels in dB, oldest first.
    pub fn input_levels_db(&self) -> &VecDeque<f32> {
        &self.input_levels_db
    }

    /// Recorded output levels in dB, oldest first.
    pub fn output_levels_db(&self) -> &VecDeque<f32> {
        &self.output_levels_db
    }

    /// Number of recorded level pairs.
    pub fn len(&self) -> usize {
        self.input_levels_db.len()
    }

    /// True when no pairs have been recorded.
    pub fn is_empty(&self) -> bool {
        self.input_levels_db.is_empty()
    }

    /// Drop all recorded pairs and return the ratio to 1.0.
    pub fn clear(&mut self) {
        self.input_levels_db.clear();
        self.output_levels_db.clear();
        self.compression_ratio = 1.0;
    }
}

/// Per-sample envelope series and the attack time derived from it.
#[derive(Debug, Clone)]
pub struct EnvelopeTracker {
    times_secs: VecDeque<f32>,
    values: VecDeque<f32>,
    attack_time_secs: f32,
    sample_rate: f64,
    capacity: usize,
    total_samples: u64,
}

/// Trailing window length used for the attack-time estimate.
const ATTACK_WINDOW: usize = 100;

impl EnvelopeTracker {
    /// Create a tracker retaining up to 10 seconds at `sample_rate`.
    pub fn new(sample_rate: f64) -> Self {
        let capacity = (sample_rate * 10.0) as usize;
        Self {
            times_secs: VecDeque::with_capacity(capacity),
            values: VecDeque::with_capacity(capacity),
            attack_time_secs: 0.0,
            sample_rate,
            capacity,
            total_samples: 0,
        }
    }

    /// Feed one post-effect block (first channel), one entry per sample.
    ///
    /// Each entry is (elapsed seconds since the tracker started, |sample|).
    /// Once at least 100 entries exist, the trailing 100 are scanned for
    /// the first crossings of 10% and 90% of the window peak; the attack
    /// time updates only when both are found in rising order.
    pub fn push_block(&mut self, samples: &[f32]) {
        for &sample in samples {
            if self.values.len() == self.capacity {
                self.times_secs.pop_front();
                self.values.pop_front();
            }
            self.times_secs
                .push_back((self.total_samples as f64 / self.sample_rate) as f32);
            self.values.push_back(sample.abs());
            self.total_samples += 1;
        }

        self.update_attack_time();
    }

    fn update_attack_time(&mut self) {
        let n = self.values.len();
        if n < ATTACK_WINDOW {
            return;
        }
        let start = n - ATTACK_WINDOW;

        let mut peak = 0.0_f32;
        for i in start..n {
            peak = peak.max(self.values[i]);
        }
        if peak <= 0.0 {
            return;
        }

        let threshold_10 = peak * 0.1;
        let threshold_90 = peak * 0.9;
        let mut idx_10 = None;
        let mut idx_90 = None;
        for i in start..n {
            let v = self.values[i];
            if idx_10.is_none() && v >= threshold_10 {
                idx_10 = Some(i);
            }
            if idx_90.is_none() && v >= threshold_90 {
                idx_90 = Some(i);
            }
        }

        if let (Some(lo), Some(hi)) = (idx_10, idx_90)
            && hi > lo
        {
            self.attack_time_secs = self.times_secs[hi] - self.times_secs[lo];
        }
    }

    /// Estimated 10%→90% attack time in seconds.
    pub fn attack_time_secs(&self) -> f32 {
        self.attack_time_secs
    }

    /// Number of recorded envelope samples.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when no samples have been recorded.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Recorded rectified values, oldest first.
    pub fn values(&self) -> &VecDeque<f32> {
        &self.values
    }

    /// Drop all recorded samples and restart the clock.
    pub fn clear(&mut self) {
        self.times_secs.clear();
        self.values.clear();
        self.attack_time_secs = 0.0;
        self.total_samples = 0;
    }
}
