//! Stateful stimulus generators.

use core::f64::consts::TAU;
use libm::{pow, sin};
use medidor_core::db_to_linear;

/// The stimulus types the generator can produce.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SignalKind {
    /// Single-sample Dirac impulse, emitted once per arm/reset cycle.
    #[default]
    Impulse,
    /// Continuous sine at the configured test frequency.
    Sine,
    /// Uniform white noise in [−amplitude, amplitude].
    WhiteNoise,
    /// Exponential frequency sweep between the configured endpoints.
    SineSweep,
    /// dB-linear level ramp riding a sine at the test frequency.
    Ramp,
    /// Linear attack/release envelope riding a sine at the test frequency.
    AttackRelease,
}

/// Instantaneous sweep frequency for a given progress in [0, 1].
///
/// Exponential (logarithmic) interpolation: equal time spent per octave.
#[inline]
pub fn sweep_frequency(start_hz: f64, end_hz: f64, progress: f64) -> f64 {
    start_hz * pow(end_hz / start_hz, progress)
}

/// Stateful test-signal generator.
///
/// Produces one block of a chosen [`SignalKind`] per [`fill_block`] call,
/// advancing internal state (phase, sweep position, envelope stage) by
/// exactly that many samples. [`reset`] returns every generator to its
/// initial phase/stage without touching configured parameters.
///
/// [`fill_block`]: SignalGenerator::fill_block
/// [`reset`]: SignalGenerator::reset
#[derive(Debug, Clone)]
pub struct SignalGenerator {
    sample_rate: f64,

    amplitude: f32,
    frequency: f64,

    // Shared sine phase accumulator, wraps at exactly 2π.
    phase: f64,

    // One-shot impulse latch.
    impulse_fired: bool,

    // Xorshift32 noise state.
    noise_state: u32,

    // Sweep position (samples into the current sweep pass).
    sweep_pos: u64,
    sweep_start_hz: f64,
    sweep_end_hz: f64,
    sweep_duration_secs: f64,

    // Ramp position and endpoints (dB).
    ramp_pos: u64,
    ramp_duration_secs: f64,
    ramp_start_db: f32,
    ramp_end_db: f32,

    // Attack/release envelope stage.
    ar_pos: u64,
    attack_secs: f64,
    release_secs: f64,
    in_attack: bool,

    // Dual-tone frequencies, configured state for the IMD stimulus.
    imd_freq1: f64,
    imd_freq2: f64,
}

const NOISE_SEED: u32 = 0x12345678;

impl SignalGenerator {
    /// Create a generator for the given sample rate.
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            amplitude: 0.5,
            frequency: 1000.0,
            phase: 0.0,
            impulse_fired: false,
            noise_state: NOISE_SEED,
            sweep_pos: 0,
            sweep_start_hz: 20.0,
            sweep_end_hz: 20000.0,
            sweep_duration_secs: 5.0,
            ramp_pos: 0,
            ramp_duration_secs: 2.0,
            ramp_start_db: -60.0,
            ramp_end_db: 0.0,
            ar_pos: 0,
            attack_secs: 0.1,
            release_secs: 0.5,
            in_attack: true,
            imd_freq1: 250.0,
            imd_freq2: 8000.0,
        }
    }

    /// Update the sample rate and restart sweep/ramp/envelope positions.
    ///
    /// Called before processing begins and after any reconfiguration.
    pub fn prepare(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.sweep_pos = 0;
        self.ramp_pos = 0;
        self.ar_pos = 0;
    }

    /// Return all generators to their initial phase/stage.
    ///
    /// Configured parameters (amplitude, frequencies, durations) are kept.
    pub fn reset(&mut self) {
        self.impulse_fired = false;
        self.phase = 0.0;
        self.noise_state = NOISE_SEED;
        self.sweep_pos = 0;
        self.ramp_pos = 0;
        self.ar_pos = 0;
        self.in_attack = true;
    }

    /// Set output amplitude, clamped to [0, 1].
    pub fn set_amplitude(&mut self, amplitude: f32) {
        self.amplitude = amplitude.clamp(0.0, 1.0);
    }

    /// Current output amplitude.
    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    /// Set the test frequency in Hz, clamped to [20, 20000].
    pub fn set_frequency(&mut self, frequency: f64) {
        self.frequency = frequency.clamp(20.0, 20000.0);
    }

    /// Current test frequency in Hz.
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Configure the sweep endpoints and duration.
    pub fn set_sweep_params(&mut self, start_hz: f64, end_hz: f64, duration_secs: f64) {
        self.sweep_start_hz = start_hz;
        self.sweep_end_hz = end_hz;
        self.sweep_duration_secs = duration_secs;
    }

    /// Configure the ramp duration and dB endpoints.
    pub fn set_ramp_params(&mut self, duration_secs: f64, start_db: f32, end_db: f32) {
        self.ramp_duration_secs = duration_secs;
        self.ramp_start_db = start_db;
        self.ramp_end_db = end_db;
    }

    /// Configure the attack and release segment durations.
    pub fn set_attack_release_params(&mut self, attack_secs: f64, release_secs: f64) {
        self.attack_secs = attack_secs;
        self.release_secs = release_secs;
    }

    /// Configure the dual-tone frequencies, each clamped to [20, 20000] Hz.
    pub fn set_imd_frequencies(&mut self, freq1: f64, freq2: f64) {
        self.imd_freq1 = freq1.clamp(20.0, 20000.0);
        self.imd_freq2 = freq2.clamp(20.0, 20000.0);
    }

    /// Configured dual-tone frequencies `(f1, f2)`.
    pub fn imd_frequencies(&self) -> (f64, f64) {
        (self.imd_freq1, self.imd_freq2)
    }

    /// Fill `out` with the chosen stimulus, advancing internal state by
    /// exactly `out.len()` samples.
    pub fn fill_block(&mut self, out: &mut [f32], kind: SignalKind) {
        match kind {
            SignalKind::Impulse => self.fill_impulse(out),
            SignalKind::Sine => self.fill_sine(out),
            SignalKind::WhiteNoise => self.fill_noise(out),
            SignalKind::SineSweep => self.fill_sweep(out),
            SignalKind::Ramp => self.fill_ramp(out),
            SignalKind::AttackRelease => self.fill_attack_release(out),
        }
    }

    fn fill_impulse(&mut self, out: &mut [f32]) {
        out.fill(0.0);
        if !self.impulse_fired && !out.is_empty() {
            out[0] = self.amplitude;
            self.impulse_fired = true;
        }
    }

    fn fill_sine(&mut self, out: &mut [f32]) {
        let phase_inc = TAU * self.frequency / self.sample_rate;
        for sample in out.iter_mut() {
            *sample = self.amplitude * sin(self.phase) as f32;
            self.advance_phase(phase_inc);
        }
    }

    fn fill_noise(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            *sample = self.amplitude * self.next_noise();
        }
    }

    fn fill_sweep(&mut self, out: &mut [f32]) {
        let total_samples = self.sweep_duration_secs * self.sample_rate;
        for sample in out.iter_mut() {
            let mut progress = self.sweep_pos as f64 / total_samples;
            if progress >= 1.0 {
                // The sweep position wraps; the phase accumulator does not,
                // so there is no waveform discontinuity at the wrap point.
                self.sweep_pos = 0;
                progress = 0.0;
            }

            let freq = sweep_frequency(self.sweep_start_hz, self.sweep_end_hz, progress);

            *sample = self.amplitude * sin(self.phase) as f32;
            self.advance_phase(TAU * freq / self.sample_rate);
            self.sweep_pos += 1;
        }
    }

    fn fill_ramp(&mut self, out: &mut [f32]) {
        let total_samples = self.ramp_duration_secs * self.sample_rate;
        let phase_inc = TAU * self.frequency / self.sample_rate;
        for sample in out.iter_mut() {
            let mut progress = self.ramp_pos as f64 / total_samples;
            if progress >= 1.0 {
                self.ramp_pos = 0;
                progress = 0.0;
            }

            let level_db =
                self.ramp_start_db + (self.ramp_end_db - self.ramp_start_db) * progress as f32;
            let gain = db_to_linear(level_db);

            *sample = gain * sin(self.phase) as f32;
            self.advance_phase(phase_inc);
            self.ramp_pos += 1;
        }
    }

    fn fill_attack_release(&mut self, out: &mut [f32]) {
        let attack_samples = self.attack_secs * self.sample_rate;
        let release_samples = self.release_secs * self.sample_rate;
        let phase_inc = TAU * self.frequency / self.sample_rate;

        for sample in out.iter_mut() {
            let envelope = if self.in_attack {
                let progress = self.ar_pos as f64 / attack_samples;
                if progress >= 1.0 {
                    self.in_attack = false;
                    self.ar_pos = 0;
                    1.0
                } else {
                    progress as f32
                }
            } else {
                let progress = self.ar_pos as f64 / release_samples;
                if progress >= 1.0 {
                    self.in_attack = true;
                    self.ar_pos = 0;
                    0.0
                } else {
                    1.0 - progress as f32
                }
            };

            *sample = self.amplitude * envelope * sin(self.phase) as f32;
            self.advance_phase(phase_inc);
            self.ar_pos += 1;
        }
    }

    #[inline]
    fn advance_phase(&mut self, phase_inc: f64) {
        self.phase += phase_inc;
        while self.phase >= TAU {
            self.phase -= TAU;
        }
    }

    /// Xorshift32 step mapped to [−1, 1].
    #[inline]
    fn next_noise(&mut self) -> f32 {
        let mut x = self.noise_state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.noise_state = x;
        (x as f32 / u32::MAX as f32) * 2.0 - 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impulse_fires_exactly_once() {
        let mut generator = SignalGenerator::new(44100.0);
        generator.set_amplitude(0.8);

        let mut block = [1.0_f32; 64];
        generator.fill_block(&mut block, SignalKind::Impulse);
        assert_eq!(block[0], 0.8);
        assert!(block[1..].iter().all(|&s| s == 0.0));

        generator.fill_block(&mut block, SignalKind::Impulse);
        assert!(block.iter().all(|&s| s == 0.0), "second block must be silent");
    }

    #[test]
    fn impulse_rearms_on_reset() {
        let mut generator = SignalGenerator::new(44100.0);
        let mut block = [0.0_f32; 16];
        generator.fill_block(&mut block, SignalKind::Impulse);
        generator.reset();
        generator.fill_block(&mut block, SignalKind::Impulse);
        assert_eq!(block[0], generator.amplitude());
    }

    #[test]
    fn sine_phase_is_continuous_across_blocks() {
        let mut generator = SignalGenerator::new(48000.0);
        generator.set_frequency(997.0);
        generator.set_amplitude(1.0);

        let mut split = [0.0_f32; 128];
        generator.fill_block(&mut split[..64], SignalKind::Sine);
        generator.fill_block(&mut split[64..], SignalKind::Sine);

        let mut whole = [0.0_f32; 128];
        let mut reference = SignalGenerator::new(48000.0);
        reference.set_frequency(997.0);
        reference.set_amplitude(1.0);
        reference.fill_block(&mut whole, SignalKind::Sine);

        for (a, b) in split.iter().zip(whole.iter()) {
            assert!((a - b).abs() < 1e-6, "block split changed the waveform");
        }
    }

    #[test]
    fn amplitude_and_frequency_clamp() {
        let mut generator = SignalGenerator::new(44100.0);
        generator.set_amplitude(1.5);
        assert_eq!(generator.amplitude(), 1.0);
        generator.set_amplitude(-0.2);
        assert_eq!(generator.amplitude(), 0.0);

        generator.set_frequency(5.0);
        assert_eq!(generator.frequency(), 20.0);
        generator.set_frequency(96000.0);
        assert_eq!(generator.frequency(), 20000.0);
    }

    #[test]
    fn sweep_frequency_endpoints() {
        assert!((sweep_frequency(20.0, 20000.0, 0.0) - 20.0).abs() < 1e-9);
        assert!((sweep_frequency(20.0, 20000.0, 1.0) - 20000.0).abs() < 1e-6);
        // Halfway in log space: sqrt(20 * 20000)
        let mid = sweep_frequency(20.0, 20000.0, 0.5);
        assert!((mid - (20.0_f64 * 20000.0).sqrt()).abs() < 1e-6);
    }

    #[test]
    fn sweep_wraps_to_start_frequency_without_phase_reset() {
        let sample_rate = 44100.0;
        let mut generator = SignalGenerator::new(sample_rate);
        generator.set_amplitude(1.0);
        generator.set_sweep_params(20.0, 20000.0, 1.0);

        // Consume exactly one sweep pass so the next sample wraps.
        let mut block = vec![0.0_f32; sample_rate as usize];
        generator.fill_block(&mut block, SignalKind::SineSweep);

        // Right after the wrap the instantaneous frequency is back at
        // 20 Hz: a tenth of a second holds roughly two zero crossings,
        // nowhere near the thousands a 20 kHz tail would produce.
        let mut after = vec![0.0_f32; 4410];
        generator.fill_block(&mut after, SignalKind::SineSweep);
        let crossings = after
            .windows(2)
            .filter(|p| (p[0] >= 0.0) != (p[1] >= 0.0))
            .count();
        assert!(
            crossings <= 8,
            "expected ~20 Hz after wrap, saw {crossings} crossings in 0.1 s"
        );
    }

    #[test]
    fn ramp_gain_rises_toward_end_level() {
        let sample_rate = 1000.0;
        let mut generator = SignalGenerator::new(sample_rate);
        generator.set_ramp_params(1.0, -60.0, 0.0);
        generator.set_frequency(100.0);

        let mut first = [0.0_f32; 100];
        generator.fill_block(&mut first, SignalKind::Ramp);
        let mut last = [0.0_f32; 100];
        for _ in 0..8 {
            generator.fill_block(&mut last, SignalKind::Ramp);
        }

        let peak = |b: &[f32]| b.iter().fold(0.0_f32, |m, &s| m.max(s.abs()));
        assert!(
            peak(&last) > peak(&first) * 10.0,
            "late ramp blocks must be much louder than early ones"
        );
    }

    #[test]
    fn attack_release_envelope_toggles() {
        let sample_rate = 1000.0;
        let mut generator = SignalGenerator::new(sample_rate);
        generator.set_amplitude(1.0);
        generator.set_attack_release_params(0.1, 0.1);

        // 0.1 s attack at 1 kHz = 100 samples up, then 100 samples down.
        let mut block = [0.0_f32; 400];
        generator.fill_block(&mut block, SignalKind::AttackRelease);

        let peak_early = block[..50].iter().fold(0.0_f32, |m, &s| m.max(s.abs()));
        let peak_mid = block[75..125].iter().fold(0.0_f32, |m, &s| m.max(s.abs()));
        let peak_late = block[180..200].iter().fold(0.0_f32, |m, &s| m.max(s.abs()));
        assert!(peak_mid > peak_early, "envelope must rise through the attack");
        assert!(peak_mid > peak_late, "envelope must fall through the release");
    }

    #[test]
    fn noise_is_bounded_and_deterministic() {
        let mut generator = SignalGenerator::new(44100.0);
        generator.set_amplitude(0.25);

        let mut a = [0.0_f32; 256];
        generator.fill_block(&mut a, SignalKind::WhiteNoise);
        assert!(a.iter().all(|s| s.abs() <= 0.25));
        assert!(a.iter().any(|&s| s != 0.0));

        generator.reset();
        let mut b = [0.0_f32; 256];
        generator.fill_block(&mut b, SignalKind::WhiteNoise);
        assert_eq!(a, b, "reset must restore the noise sequence");
    }
}
