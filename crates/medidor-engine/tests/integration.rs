//! Integration tests for medidor-engine.
//!
//! Drives the controller the way a host would: configure, load a unit
//! under test, pump audio blocks, and read results back through the
//! accessor surface and the scope ring.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use medidor_core::Effect;
use medidor_engine::{AnalysisController, AnalysisMode, EngineConfig, EngineEvent};

/// Memoryless cubic soft clipper, a deliberately distorting unit.
struct SoftClipper {
    drive: f32,
}

impl Effect for SoftClipper {
    fn prepare(&mut self, _sample_rate: f32, _block_size: usize) {}

    fn process_stereo(&mut self, left: &mut [f32], right: &mut [f32]) {
        for s in left.iter_mut().chain(right.iter_mut()) {
            let x = (*s * self.drive).clamp(-1.0, 1.0);
            *s = x - x * x * x / 3.0;
        }
    }

    fn reset(&mut self) {}
}

/// Gain staircase that halves level changes in dB, i.e. a 2:1 compressor
/// with an instant attack, applied per block from the block's own RMS.
struct BlockCompressor {
    threshold_db: f32,
}

impl Effect for BlockCompressor {
    fn prepare(&mut self, _sample_rate: f32, _block_size: usize) {}

    fn process_stereo(&mut self, left: &mut [f32], right: &mut [f32]) {
        let rms = (left.iter().map(|&x| x * x).sum::<f32>() / left.len() as f32).sqrt();
        let level_db = medidor_core::linear_to_db(rms);
        if level_db > self.threshold_db {
            let reduction_db = (level_db - self.threshold_db) / 2.0;
            let gain = medidor_core::db_to_linear(-reduction_db);
            for s in left.iter_mut().chain(right.iter_mut()) {
                *s *= gain;
            }
        }
    }

    fn reset(&mut self) {}
}

#[test]
fn clipper_raises_thd_relative_to_passthrough() {
    let mut clean = AnalysisController::new(44100.0, 512);
    clean.set_mode(AnalysisMode::Harmonic);
    clean.set_frequency(1000.0);
    clean.set_amplitude(0.9);
    while !clean.process_block() {}

    let mut driven = AnalysisController::new(44100.0, 512);
    driven.set_effect(Some(Box::new(SoftClipper { drive: 1.5 })));
    driven.set_mode(AnalysisMode::Harmonic);
    driven.set_frequency(1000.0);
    driven.set_amplitude(0.9);
    while !driven.process_block() {}

    let clean_thd = clean.distortion().thd_percent();
    let driven_thd = driven.distortion().thd_percent();
    assert!(
        driven_thd > clean_thd + 1.0,
        "clipper THD {driven_thd} % should clearly exceed pass-through {clean_thd} %"
    );
}

#[test]
fn dynamics_mode_recovers_compressor_ratio() {
    let mut controller = AnalysisController::new(44100.0, 512);
    controller.set_effect(Some(Box::new(BlockCompressor {
        threshold_db: -60.0,
    })));
    controller.set_mode(AnalysisMode::Dynamics);
    // Default ramp: -60 dB to 0 dB over 2 seconds.
    controller.generator_mut().set_ramp_params(2.0, -60.0, 0.0);

    // Two full ramp passes' worth of blocks.
    let blocks = (44100 * 4) / 512;
    for _ in 0..blocks {
        controller.process_block();
    }

    let ratio = controller.dynamics().compression_ratio();
    assert!(
        (ratio - 2.0).abs() < 0.3,
        "expected ~2:1 compression, measured {ratio}"
    );
}

#[test]
fn config_file_round_trips_through_controller() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("engine.toml");

    let config = EngineConfig {
        buffer_size: 256,
        sample_rate: 48000.0,
        fft_order: 10,
    };
    config.save(&path).unwrap();

    let loaded = EngineConfig::load(&path).unwrap();
    assert_eq!(loaded, config);

    let mut controller = AnalysisController::new(44100.0, 512);
    loaded.apply_to(&mut controller);
    assert_eq!(controller.sample_rate(), 48000.0);
    assert_eq!(controller.block_size(), 256);
    assert_eq!(controller.spectrum().size(), 1024);
}

#[test]
fn malformed_config_is_an_error_not_a_panic() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("engine.toml");
    std::fs::write(&path, "buffer_size = \"many\"").unwrap();

    assert!(EngineConfig::load(&path).is_err());
    assert!(EngineConfig::load(dir.path().join("missing.toml")).is_err());
}

#[test]
fn scope_keeps_up_with_a_polling_consumer() {
    let mut controller = AnalysisController::new(44100.0, 512);
    let mut reader = controller.take_scope_reader().unwrap();

    controller.set_mode(AnalysisMode::SineSweep);

    let mut drained = 0usize;
    let mut out = [0.0_f32; 2048];
    for _ in 0..128 {
        controller.process_block();
        drained += reader.read(&mut out);
    }
    drained += reader.read(&mut out);

    // 128 blocks * 512 samples, nothing lost while the consumer polls
    // at least once per block.
    assert_eq!(drained + reader.available(), 128 * 512);
    assert_eq!(reader.dropped_samples(), 0);
}

#[test]
fn unpolled_scope_drops_but_measurement_continues() {
    let mut controller = AnalysisController::new(44100.0, 512);
    let reader = controller.take_scope_reader().unwrap();

    controller.set_mode(AnalysisMode::WhiteNoise);
    // 32768-sample ring fills after 64 blocks; everything after drops.
    let mut completions = 0;
    for _ in 0..128 {
        if controller.process_block() {
            completions += 1;
        }
    }

    assert_eq!(reader.dropped_samples(), 64 * 512);
    assert_eq!(completions, 32, "analysis is unaffected by scope overflow");
}

#[test]
fn events_fire_for_transforms_and_effect_swaps() {
    let spectra = Arc::new(AtomicUsize::new(0));
    let swaps = Arc::new(AtomicUsize::new(0));

    let mut controller = AnalysisController::new(44100.0, 512);
    let spectra_count = Arc::clone(&spectra);
    let swap_count = Arc::clone(&swaps);
    controller.add_observer(Box::new(move |event| match event {
        EngineEvent::SpectrumReady => {
            spectra_count.fetch_add(1, Ordering::Relaxed);
        }
        EngineEvent::EffectChanged => {
            swap_count.fetch_add(1, Ordering::Relaxed);
        }
    }));

    controller.set_effect(Some(Box::new(SoftClipper { drive: 1.0 })));
    controller.set_effect(None);
    assert_eq!(swaps.load(Ordering::Relaxed), 2);

    controller.set_mode(AnalysisMode::Harmonic);
    for _ in 0..8 {
        controller.process_block();
    }
    assert_eq!(spectra.load(Ordering::Relaxed), 2);
}

#[test]
fn reconfiguring_order_mid_run_restarts_accumulation() {
    let mut controller = AnalysisController::new(44100.0, 512);
    controller.set_mode(AnalysisMode::Harmonic);
    controller.process_block();
    assert_eq!(controller.spectrum().pending_samples(), 512);

    controller.set_order(12);
    assert_eq!(controller.spectrum().pending_samples(), 0);
    assert_eq!(controller.spectrum().size(), 4096);

    // The next full window transforms at the new size.
    let mut completed = false;
    for _ in 0..8 {
        completed |= controller.process_block();
    }
    assert!(completed);
    assert_eq!(
        controller.spectrum().left().unwrap().magnitude_db.len(),
        2048
    );
}
