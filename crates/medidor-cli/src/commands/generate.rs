//! Test stimulus rendering command.

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use medidor_signal::{SignalGenerator, SignalKind};

/// Stimulus types exposed on the command line.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum CliSignal {
    Impulse,
    #[default]
    Sine,
    WhiteNoise,
    SineSweep,
    Ramp,
    AttackRelease,
}

impl From<CliSignal> for SignalKind {
    fn from(signal: CliSignal) -> Self {
        match signal {
            CliSignal::Impulse => SignalKind::Impulse,
            CliSignal::Sine => SignalKind::Sine,
            CliSignal::WhiteNoise => SignalKind::WhiteNoise,
            CliSignal::SineSweep => SignalKind::SineSweep,
            CliSignal::Ramp => SignalKind::Ramp,
            CliSignal::AttackRelease => SignalKind::AttackRelease,
        }
    }
}

#[derive(Args)]
pub struct GenerateArgs {
    /// Output WAV file
    #[arg(short, long, value_name = "OUTPUT")]
    output: PathBuf,

    /// Stimulus type
    #[arg(long, value_enum, default_value = "sine")]
    signal: CliSignal,

    /// Duration in seconds
    #[arg(long, default_value = "1.0")]
    seconds: f64,

    /// Sample rate in Hz
    #[arg(long, default_value = "44100")]
    sample_rate: u32,

    /// Amplitude (0-1)
    #[arg(long, default_value = "0.5")]
    amplitude: f32,

    /// Tone frequency in Hz (sine, ramp, attack-release)
    #[arg(long, default_value = "1000.0")]
    freq: f64,

    /// Sweep start frequency in Hz
    #[arg(long, default_value = "20.0")]
    sweep_start: f64,

    /// Sweep end frequency in Hz
    #[arg(long, default_value = "20000.0")]
    sweep_end: f64,

    /// Sweep duration in seconds
    #[arg(long, default_value = "5.0")]
    sweep_duration: f64,
}

pub fn run(args: GenerateArgs) -> anyhow::Result<()> {
    let signal_name = format!("{:?}", args.signal).to_lowercase();
    println!("Generating {signal_name} stimulus...");
    println!("  {:.2}s at {} Hz", args.seconds, args.sample_rate);

    let mut generator = SignalGenerator::new(f64::from(args.sample_rate));
    generator.set_amplitude(args.amplitude);
    generator.set_frequency(args.freq);
    generator.set_sweep_params(args.sweep_start, args.sweep_end, args.sweep_duration);

    let num_samples = (args.seconds * f64::from(args.sample_rate)) as usize;
    let mut samples = vec![0.0_f32; num_samples];
    // One pass; block splitting is irrelevant offline.
    generator.fill_block(&mut samples, args.signal.into());

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: args.sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(&args.output, spec)?;
    for &sample in &samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    println!(
        "Wrote {} samples to {}",
        samples.len(),
        args.output.display()
    );
    Ok(())
}
