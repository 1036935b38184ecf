//! Offline measurement command: drives the controller for a fixed
//! duration and prints the resulting metrics.

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::Args;
use medidor_engine::{AnalysisController, AnalysisMode, EngineConfig};

use crate::effects;

#[derive(Args)]
pub struct MeasureArgs {
    /// Analysis mode (linear, harmonic, hammerstein, white-noise,
    /// sine-sweep, thd-sweep, imd, dynamics, performance)
    #[arg(long, default_value = "harmonic")]
    mode: AnalysisMode,

    /// Measurement duration in seconds
    #[arg(long, default_value = "2.0")]
    seconds: f64,

    /// Built-in effect to measure (see `medidor effects`)
    #[arg(long)]
    effect: Option<String>,

    /// Engine config file (TOML); flags below are ignored when set
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sample rate in Hz
    #[arg(long, default_value = "44100.0")]
    sample_rate: f64,

    /// Audio block size in frames
    #[arg(long, default_value = "512")]
    buffer_size: usize,

    /// Analysis FFT order (8-15)
    #[arg(long, default_value = "11")]
    fft_order: u32,

    /// Test frequency in Hz
    #[arg(long, default_value = "1000.0")]
    freq: f64,

    /// Stimulus amplitude (0-1)
    #[arg(long, default_value = "0.5")]
    amplitude: f32,
}

pub fn run(args: MeasureArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => EngineConfig {
            buffer_size: args.buffer_size,
            sample_rate: args.sample_rate,
            fft_order: args.fft_order,
        },
    };

    let mut controller = AnalysisController::new(config.sample_rate, config.buffer_size);
    config.apply_to(&mut controller);
    controller.set_frequency(args.freq);
    controller.set_amplitude(args.amplitude);

    let mut scope = controller
        .take_scope_reader()
        .context("scope reader already taken")?;

    if let Some(name) = &args.effect {
        let Some(effect) = effects::build(name) else {
            bail!("unknown effect '{name}', see `medidor effects`");
        };
        controller.set_effect(Some(effect));
    }

    controller.set_mode(args.mode);
    if args.mode == AnalysisMode::Linear {
        controller.trigger_impulse_response();
    }

    println!("Measuring: mode {}, {:.2}s", args.mode, args.seconds);
    println!(
        "  {} Hz sample rate, {}-frame blocks, N = {}",
        config.sample_rate,
        config.buffer_size,
        controller.spectrum().size()
    );

    let blocks = (args.seconds * config.sample_rate / config.buffer_size as f64).ceil() as usize;
    let mut transforms = 0usize;
    let mut scope_samples = 0usize;
    let mut drain = vec![0.0_f32; config.buffer_size];
    for _ in 0..blocks {
        if controller.process_block() {
            transforms += 1;
        }
        // Emulate the display consumer so the ring never overflows.
        scope_samples += scope.read(&mut drain);
    }

    println!();
    println!("Results ({transforms} completed transforms):");
    print_spectrum_summary(&controller);
    match args.mode {
        AnalysisMode::Harmonic | AnalysisMode::ThdSweep => print_distortion(&controller),
        AnalysisMode::Imd => {
            println!("  IMD: {:.3} %", controller.distortion().imd_percent());
        }
        AnalysisMode::Dynamics => {
            println!(
                "  compression ratio: {:.2}:1 ({} level pairs)",
                controller.dynamics().compression_ratio(),
                controller.dynamics().len()
            );
        }
        AnalysisMode::Hammerstein => {
            println!(
                "  attack time: {:.2} ms",
                controller.envelope().attack_time_secs() * 1000.0
            );
        }
        _ => {}
    }
    let perf = controller.performance();
    println!(
        "  processing: avg {:.4} ms, peak {:.4} ms, CPU load {:.2} %",
        perf.average_ms(),
        perf.peak_ms(),
        perf.cpu_load_percent()
    );
    println!(
        "  scope: {scope_samples} samples streamed, {} dropped",
        scope.dropped_samples()
    );

    Ok(())
}

fn print_spectrum_summary(controller: &AnalysisController) {
    let Some(spectrum) = controller.spectrum().left() else {
        println!("  no spectrum captured (nothing to analyze yet)");
        return;
    };

    let bin_width = controller.spectrum().bin_width(controller.sample_rate());
    let (peak_bin, peak_db) = spectrum
        .magnitude_db
        .iter()
        .enumerate()
        .skip(1)
        .map(|(i, &db)| (i, db))
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .unwrap_or((0, f32::NEG_INFINITY));

    println!(
        "  spectrum peak: {:.1} Hz at {:.1} dB (bin {peak_bin}, width {bin_width:.2} Hz)",
        peak_bin as f64 * bin_width,
        peak_db
    );
}

fn print_distortion(controller: &AnalysisController) {
    let distortion = controller.distortion();
    println!("  THD:   {:.4} %", distortion.thd_percent());
    println!("  THD+N: {:.4} %", distortion.thd_plus_n_percent());
    for (i, &level_db) in distortion.harmonic_levels_db().iter().enumerate() {
        if level_db > medidor_analysis::SPECTRUM_FLOOR_DB {
            println!("    harmonic {}: {level_db:.1} dB", i + 2);
        }
    }
}
