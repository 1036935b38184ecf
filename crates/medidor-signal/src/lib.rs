//! Medidor Signal - test-signal generators for the measurement engine
//!
//! One [`SignalGenerator`] produces every stimulus the analysis modes need:
//! a one-shot impulse, a continuous sine, white noise, an exponential sine
//! sweep, a dB-linear ramp for dynamics measurement, and an attack/release
//! envelope burst for envelope measurement.
//!
//! All generators that carry a sine share a single phase accumulator with
//! one wrap discipline (wrap at exactly 2π), so switching stimulus types
//! never introduces a phase discontinuity.
//!
//! # Example
//!
//! ```rust
//! use medidor_signal::{SignalGenerator, SignalKind};
//!
//! let mut generator = SignalGenerator::new(48000.0);
//! generator.set_frequency(1000.0);
//! generator.set_amplitude(0.5);
//!
//! let mut block = [0.0_f32; 512];
//! generator.fill_block(&mut block, SignalKind::Sine);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

mod generator;

pub use generator::{SignalGenerator, SignalKind, sweep_frequency};
