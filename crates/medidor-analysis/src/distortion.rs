//! THD / THD+N extraction from a completed dB spectrum.
//!
//! Works directly on the bin-indexed magnitude spectrum the
//! [`SpectrumAnalyzer`](crate::SpectrumAnalyzer) produces, using the known
//! test frequency to locate the fundamental. An out-of-range fundamental is
//! an undefined measurement, not an error: both outputs go to 0.

use medidor_core::db_to_linear;

use crate::spectrum::SPECTRUM_FLOOR_DB;

/// Number of harmonic level slots tracked (2nd through 11th would exceed
/// it; the fundamental itself is not stored).
pub const MAX_HARMONICS: usize = 10;

/// THD / THD+N / IMD state, updated once per completed spectrum.
#[derive(Debug, Clone)]
pub struct DistortionAnalyzer {
    thd_percent: f32,
    thd_plus_n_percent: f32,
    imd_percent: f32,
    harmonic_levels_db: [f32; MAX_HARMONICS],
}

impl Default for DistortionAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl DistortionAnalyzer {
    /// Create an analyzer with all metrics at their neutral values.
    pub fn new() -> Self {
        Self {
            thd_percent: 0.0,
            thd_plus_n_percent: 0.0,
            imd_percent: 0.0,
            harmonic_levels_db: [SPECTRUM_FLOOR_DB; MAX_HARMONICS],
        }
    }

    /// Latest THD in percent.
    pub fn thd_percent(&self) -> f32 {
        self.thd_percent
    }

    /// Latest THD+N in percent. Always ≥ THD.
    pub fn thd_plus_n_percent(&self) -> f32 {
        self.thd_plus_n_percent
    }

    /// Latest IMD in percent. Currently always 0 - see [`update_imd`].
    ///
    /// [`update_imd`]: DistortionAnalyzer::update_imd
    pub fn imd_percent(&self) -> f32 {
        self.imd_percent
    }

    /// Levels of harmonics 2..=11 in dB, floor-filled for harmonics that
    /// fell outside the spectrum.
    pub fn harmonic_levels_db(&self) -> &[f32; MAX_HARMONICS] {
        &self.harmonic_levels_db
    }

    /// Return all metrics to their neutral values.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Recompute THD and THD+N from a single-tone magnitude spectrum.
    ///
    /// `magnitude_db` holds N/2 bins; `bin width = sample_rate / N`. The
    /// fundamental bin is `round(test_freq / bin_width)`. When that bin is
    /// 0 or beyond the spectrum, the measurement is undefined and both
    /// metrics are set to 0.
    ///
    /// THD sums harmonics 2..=10 (stopping at the spectrum edge); THD+N
    /// additionally sums every bin from 1 upward that is not a harmonic
    /// multiple of the fundamental bin, so it can never be below THD.
    pub fn update_thd(&mut self, magnitude_db: &[f32], test_freq: f64, sample_rate: f64) {
        let bins = magnitude_db.len();
        if bins == 0 {
            return;
        }
        let fft_size = bins * 2;
        let bin_width = sample_rate / fft_size as f64;
        #[allow(clippy::cast_possible_truncation)]
        let fundamental_bin = (test_freq / bin_width + 0.5) as usize;

        if fundamental_bin < 1 || fundamental_bin >= bins {
            self.thd_percent = 0.0;
            self.thd_plus_n_percent = 0.0;
            return;
        }

        let fundamental_gain = db_to_linear(magnitude_db[fundamental_bin]);

        self.harmonic_levels_db = [SPECTRUM_FLOOR_DB; MAX_HARMONICS];
        let mut harmonics_sq = 0.0_f64;
        for h in 2..=MAX_HARMONICS {
            let bin = fundamental_bin * h;
            if bin >= bins {
                break;
            }
            let gain = f64::from(db_to_linear(magnitude_db[bin]));
            harmonics_sq += gain * gain;
            self.harmonic_levels_db[h - 2] = magnitude_db[bin];
        }

        // Everything that is neither the fundamental nor one of its
        // harmonic multiples counts as noise. DC is excluded by starting
        // at bin 1.
        let mut noise_sq = 0.0_f64;
        for (i, &level_db) in magnitude_db.iter().enumerate().skip(1) {
            if i % fundamental_bin == 0 && i / fundamental_bin <= MAX_HARMONICS {
                continue;
            }
            let gain = f64::from(db_to_linear(level_db));
            noise_sq += gain * gain;
        }

        let fundamental = f64::from(fundamental_gain);
        self.thd_percent = (harmonics_sq.sqrt() / fundamental * 100.0) as f32;
        self.thd_plus_n_percent = ((harmonics_sq + noise_sq).sqrt() / fundamental * 100.0) as f32;
    }

    /// Recompute IMD from a dual-tone response spectrum.
    ///
    /// Placeholder: dual-tone stimulus generation is not wired up, so this
    /// always yields 0. An implementation must use the SMPTE method
    /// (sideband energy at f2 ± n·f1 relative to the f2 carrier) and keep
    /// this contract: never panic, always produce a finite percentage.
    pub fn update_imd(&mut self, _magnitude_db: &[f32], _freq1: f64, _freq2: f64) {
        self.imd_percent = 0.0;
    }
}
