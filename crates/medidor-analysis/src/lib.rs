//! Medidor Analysis - the measurement engine's number crunching
//!
//! This crate turns blocks of audio coming back from a unit under test into
//! the metrics the engine reports:
//!
//! - [`fft`] - window functions and a cached FFT plan
//! - [`spectrum`] - block accumulation and magnitude/phase extraction
//! - [`distortion`] - THD / THD+N from a completed spectrum
//! - [`dynamics`] - compression-ratio and attack-time estimation
//! - [`performance`] - per-block processing-time statistics
//!
//! Everything here is built to run inside a hard real-time audio callback:
//! after construction (or an explicit cold-path reconfiguration) no method
//! on these types allocates.
//!
//! ## Example
//!
//! ```rust
//! use medidor_analysis::{SpectrumAnalyzer, Window};
//!
//! let mut analyzer = SpectrumAnalyzer::new(11); // N = 2048
//! analyzer.set_window(Window::Hann);
//!
//! let left = vec![0.0_f32; 512];
//! let right = vec![0.0_f32; 512];
//! for _ in 0..4 {
//!     analyzer.accumulate(&left, &right);
//! }
//! assert!(analyzer.left().is_some());
//! ```

pub mod distortion;
pub mod dynamics;
pub mod fft;
pub mod performance;
pub mod spectrum;

pub use distortion::{DistortionAnalyzer, MAX_HARMONICS};
pub use dynamics::{DynamicsTracker, EnvelopeTracker};
pub use fft::{Fft, Window};
pub use performance::PerfTracker;
pub use spectrum::{ChannelSpectrum, SpectrumAnalyzer, MAX_FFT_ORDER, MIN_FFT_ORDER, SPECTRUM_FLOOR_DB};
