//! Integration tests for medidor-analysis.
//!
//! These exercise the public API end to end: stimulus blocks go through
//! spectrum accumulation the way the engine feeds them, and the metric
//! types are driven off the completed spectra.

use std::f32::consts::PI;

use medidor_analysis::{
    DistortionAnalyzer, DynamicsTracker, EnvelopeTracker, PerfTracker, SpectrumAnalyzer, Window,
};
use medidor_signal::{SignalGenerator, SignalKind};

const SAMPLE_RATE: f64 = 44100.0;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Generate a sine wave at a given frequency and amplitude.
fn sine(freq_hz: f32, num_samples: usize, amplitude: f32) -> Vec<f32> {
    (0..num_samples)
        .map(|i| amplitude * (2.0 * PI * freq_hz * i as f32 / SAMPLE_RATE as f32).sin())
        .collect()
}

/// Bin with the largest magnitude, excluding DC.
fn peak_bin(magnitude_db: &[f32]) -> usize {
    magnitude_db
        .iter()
        .enumerate()
        .skip(1)
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
        .map(|(i, _)| i)
        .unwrap()
}

/// Feed blocks into the analyzer until a spectrum is available.
fn accumulate_until_ready(
    analyzer: &mut SpectrumAnalyzer,
    left: &[f32],
    right: &[f32],
    block_size: usize,
) {
    let mut offset = 0;
    loop {
        let end = (offset + block_size).min(left.len());
        if analyzer.accumulate(&left[offset..end], &right[offset..end]) {
            return;
        }
        offset = end;
        assert!(offset < left.len(), "signal exhausted before transform");
    }
}

// ===========================================================================
// 1. Spectrum pipeline
// ===========================================================================

#[test]
fn tone_fed_in_callback_sized_blocks_peaks_at_expected_bin() {
    let mut analyzer = SpectrumAnalyzer::new(11); // N = 2048
    let freq = 1000.0_f32;
    let signal = sine(freq, 4096, 0.5);

    accumulate_until_ready(&mut analyzer, &signal, &signal, 512);

    let spectrum = analyzer.left().expect("spectrum ready after full window");
    let expected = (f64::from(freq) / analyzer.bin_width(SAMPLE_RATE)).round() as usize;
    assert_eq!(peak_bin(&spectrum.magnitude_db), expected);
    assert_eq!(expected, 46);
}

#[test]
fn generated_sine_matches_hand_rolled_sine_spectrum() {
    let mut generator = SignalGenerator::new(SAMPLE_RATE);
    generator.set_frequency(2000.0);
    generator.set_amplitude(0.5);

    let mut generated = vec![0.0_f32; 2048];
    generator.fill_block(&mut generated, SignalKind::Sine);

    let mut analyzer_gen = SpectrumAnalyzer::new(11);
    let mut analyzer_ref = SpectrumAnalyzer::new(11);
    let reference = sine(2000.0, 2048, 0.5);

    analyzer_gen.accumulate(&generated, &generated);
    analyzer_ref.accumulate(&reference, &reference);

    let gen_peak = peak_bin(&analyzer_gen.left().unwrap().magnitude_db);
    let ref_peak = peak_bin(&analyzer_ref.left().unwrap().magnitude_db);
    assert_eq!(gen_peak, ref_peak);
}

#[test]
fn order_change_mid_stream_discards_partial_window() {
    let mut analyzer = SpectrumAnalyzer::new(10); // N = 1024
    let signal = sine(1000.0, 512, 0.5);

    analyzer.accumulate(&signal, &signal);
    assert_eq!(analyzer.pending_samples(), 512);

    analyzer.set_order(12);
    assert_eq!(analyzer.pending_samples(), 0);
    assert_eq!(analyzer.size(), 4096);
    assert!(analyzer.left().is_none());
}

#[test]
fn hann_window_contains_leakage_from_off_bin_tone() {
    // 1234.5 Hz is deliberately between bins. Hann should keep far-away
    // bins well below the peak; rectangular smears much more.
    let freq = 1234.5_f32;
    let signal = sine(freq, 2048, 0.8);

    let mut hann = SpectrumAnalyzer::new(11);
    hann.set_window(Window::Hann);
    hann.accumulate(&signal, &signal);

    let mut rect = SpectrumAnalyzer::new(11);
    rect.set_window(Window::Rectangular);
    rect.accumulate(&signal, &signal);

    let hann_db = &hann.left().unwrap().magnitude_db;
    let rect_db = &rect.left().unwrap().magnitude_db;

    let peak = peak_bin(hann_db);
    let far_hann: f32 =
        hann_db[peak + 50..peak + 150].iter().sum::<f32>() / 100.0;
    let far_rect: f32 =
        rect_db[peak + 50..peak + 150].iter().sum::<f32>() / 100.0;

    assert!(
        far_hann < far_rect - 20.0,
        "Hann far bins {far_hann:.1} dB should sit well below rectangular {far_rect:.1} dB"
    );
}

// ===========================================================================
// 2. Spectrum -> distortion pipeline
// ===========================================================================

#[test]
fn clean_sine_measures_low_thd() {
    let mut analyzer = SpectrumAnalyzer::new(12); // N = 4096
    let signal = sine(1000.0, 4096, 0.5);
    analyzer.accumulate(&signal, &signal);

    let mut distortion = DistortionAnalyzer::new();
    distortion.update_thd(
        &analyzer.left().unwrap().magnitude_db,
        1000.0,
        SAMPLE_RATE,
    );

    assert!(
        distortion.thd_percent() < 1.0,
        "clean sine measured {} % THD",
        distortion.thd_percent()
    );
}

#[test]
fn soft_clipped_sine_measures_elevated_thd() {
    let mut analyzer = SpectrumAnalyzer::new(12);
    let clean = sine(1000.0, 4096, 0.9);
    let clipped: Vec<f32> = clean.iter().map(|&s| s.tanh()).collect();
    analyzer.accumulate(&clipped, &clipped);

    let mut distortion = DistortionAnalyzer::new();
    distortion.update_thd(
        &analyzer.left().unwrap().magnitude_db,
        1000.0,
        SAMPLE_RATE,
    );

    // tanh on a 0.9 amplitude sine produces several percent of odd
    // harmonics.
    assert!(
        distortion.thd_percent() > 1.0,
        "clipped sine measured only {} % THD",
        distortion.thd_percent()
    );
    assert!(distortion.thd_plus_n_percent() >= distortion.thd_percent());
}

// ===========================================================================
// 3. Dynamics against a synthetic compressor
// ===========================================================================

#[test]
fn hard_knee_compressor_ratio_is_recovered() {
    // Static 4:1 curve above a -40 dB threshold, applied per block.
    let ratio = 4.0_f32;
    let threshold_db = -40.0_f32;

    let mut tracker = DynamicsTracker::new();
    for i in 0..48 {
        let input_db = -30.0 + i as f32 * 1.25;
        let output_db = threshold_db + (input_db - threshold_db) / ratio;
        let input = vec![medidor_core::db_to_linear(input_db); 256];
        let output = vec![medidor_core::db_to_linear(output_db); 256];
        tracker.push_block(&input, &output);
    }

    assert!(
        (tracker.compression_ratio() - ratio).abs() < 0.2,
        "recovered ratio {}",
        tracker.compression_ratio()
    );
}

#[test]
fn envelope_tracker_times_a_shaped_burst() {
    let sample_rate = 44100.0;
    let mut tracker = EnvelopeTracker::new(sample_rate);

    let mut generator = SignalGenerator::new(sample_rate);
    generator.set_frequency(1000.0);
    generator.set_amplitude(0.8);
    generator.set_attack_release_params(0.002, 0.5);

    let mut block = vec![0.0_f32; 512];
    generator.fill_block(&mut block, SignalKind::AttackRelease);
    tracker.push_block(&block);

    // A 2 ms attack at 44.1 kHz spans ~88 samples, inside the trailing
    // 100-sample estimation window. The estimate is coarse because the
    // carrier zero-crossings perturb the threshold scan.
    let attack = tracker.attack_time_secs();
    assert!(attack > 0.0, "attack time should have been estimated");
    assert!(attack < 0.01, "attack {attack} s is implausibly long");
}

// ===========================================================================
// 4. Performance statistics
// ===========================================================================

#[test]
fn perf_tracker_flags_an_overloaded_block() {
    let mut tracker = PerfTracker::new();

    for _ in 0..20 {
        tracker.push(1.0, 512, 48000.0);
    }
    assert!(tracker.cpu_load_percent() < 15.0);

    tracker.push(50.0, 512, 48000.0);
    assert!(
        tracker.cpu_load_percent() > 100.0,
        "load {}",
        tracker.cpu_load_percent()
    );
    assert!((tracker.peak_ms() - 50.0).abs() < 1e-6);
}
