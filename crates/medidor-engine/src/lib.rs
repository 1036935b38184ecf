//! Measurement engine orchestration for medidor.
//!
//! This crate ties the stimulus generators and the analysis pipeline into
//! one controller that a host drives once per audio block:
//!
//! - **[`AnalysisController`]**: owns all real-time state, implements the
//!   per-mode state machine, and runs stimulus → effect → metrics for each
//!   block without allocating.
//! - **[`AnalysisMode`]**: the nine measurement modes and their stimulus,
//!   windowing, and metric predicates.
//! - **[`scope_buffer`]**: a lock-free SPSC ring carrying post-effect
//!   samples to a slower oscilloscope consumer.
//! - **[`EngineConfig`]**: TOML-backed engine options.
//!
//! # Example
//!
//! ```rust
//! use medidor_engine::{AnalysisController, AnalysisMode};
//!
//! let mut controller = AnalysisController::new(44100.0, 512);
//! controller.set_mode(AnalysisMode::Harmonic);
//! controller.set_frequency(1000.0);
//!
//! // Drive until one full analysis window has been transformed.
//! while !controller.process_block() {}
//! println!("THD: {:.3} %", controller.distortion().thd_percent());
//! ```

pub mod config;
pub mod controller;
pub mod mode;
pub mod scope;

pub use config::{ConfigError, EngineConfig};
pub use controller::{AnalysisController, DEFAULT_FFT_ORDER, EngineEvent};
pub use mode::{AnalysisMode, UnknownMode};
pub use scope::{DEFAULT_SCOPE_CAPACITY, ScopeReader, ScopeWriter, scope_buffer};
