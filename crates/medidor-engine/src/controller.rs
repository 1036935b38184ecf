//! The analysis controller: per-mode state machine and block drive loop.

use std::time::Instant;

use medidor_analysis::{
    DistortionAnalyzer, DynamicsTracker, EnvelopeTracker, PerfTracker, SpectrumAnalyzer, Window,
};
use medidor_core::Effect;
use medidor_signal::SignalGenerator;
use tracing::debug;

use crate::mode::AnalysisMode;
use crate::scope::{DEFAULT_SCOPE_CAPACITY, ScopeReader, ScopeWriter, scope_buffer};

/// Notification token posted to observers.
///
/// Carries no payload; observers pull current state through the
/// controller's accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// A full analysis window was transformed and the metrics refreshed.
    SpectrumReady,
    /// The unit under test was swapped (loaded or cleared).
    EffectChanged,
}

type Observer = Box<dyn FnMut(EngineEvent) + Send>;

/// Orchestrates one measurement: stimulus out, unit under test, metrics in.
///
/// The controller owns every buffer the real-time path touches. After
/// [`prepare`] has sized them, [`process_block`] neither allocates nor
/// blocks, so it is safe to call from an audio callback.
///
/// Reconfiguration ([`prepare`], [`set_order`]) resizes those buffers and
/// therefore must not race the callback. Both take `&mut self`, so the
/// borrow checker enforces the quiesce: whoever drives the callback has to
/// give up its exclusive borrow before anyone can reconfigure.
///
/// [`prepare`]: AnalysisController::prepare
/// [`set_order`]: AnalysisController::set_order
/// [`process_block`]: AnalysisController::process_block
pub struct AnalysisController {
    mode: AnalysisMode,
    sample_rate: f64,
    block_size: usize,
    analyzing: bool,

    generator: SignalGenerator,
    spectrum: SpectrumAnalyzer,
    distortion: DistortionAnalyzer,
    dynamics: DynamicsTracker,
    envelope: EnvelopeTracker,
    performance: PerfTracker,

    effect: Option<Box<dyn Effect + Send>>,
    scope: ScopeWriter,
    scope_reader: Option<ScopeReader>,
    observers: Vec<Observer>,

    left: Vec<f32>,
    right: Vec<f32>,
    pre_effect: Vec<f32>,
}

/// Default analysis FFT order (N = 2048).
pub const DEFAULT_FFT_ORDER: u32 = 11;

impl AnalysisController {
    /// Create a controller sized for `sample_rate` and `block_size`.
    ///
    /// Starts in [`AnalysisMode::Linear`] with no effect loaded and the
    /// impulse capture unarmed.
    pub fn new(sample_rate: f64, block_size: usize) -> Self {
        let (scope, scope_reader) = scope_buffer(DEFAULT_SCOPE_CAPACITY);
        let mut controller = Self {
            mode: AnalysisMode::Linear,
            sample_rate,
            block_size,
            analyzing: false,
            generator: SignalGenerator::new(sample_rate),
            spectrum: SpectrumAnalyzer::new(DEFAULT_FFT_ORDER),
            distortion: DistortionAnalyzer::new(),
            dynamics: DynamicsTracker::new(),
            envelope: EnvelopeTracker::new(sample_rate),
            performance: PerfTracker::new(),
            effect: None,
            scope,
            scope_reader: Some(scope_reader),
            observers: Vec::new(),
            left: Vec::new(),
            right: Vec::new(),
            pre_effect: Vec::new(),
        };
        controller.prepare(sample_rate, block_size);
        controller
    }

    /// Size all scratch buffers and prepare the generator and effect.
    ///
    /// This is the quiesce point: it must not run while an audio callback
    /// is inside [`process_block`], which `&mut self` already guarantees
    /// within safe code.
    ///
    /// [`process_block`]: AnalysisController::process_block
    pub fn prepare(&mut self, sample_rate: f64, block_size: usize) {
        self.sample_rate = sample_rate;
        self.block_size = block_size;

        self.left.resize(block_size, 0.0);
        self.right.resize(block_size, 0.0);
        self.pre_effect.resize(block_size, 0.0);

        self.generator.prepare(sample_rate);
        self.envelope = EnvelopeTracker::new(sample_rate);
        self.spectrum.reset_accumulation();

        if let Some(effect) = self.effect.as_mut() {
            effect.prepare(sample_rate as f32, block_size);
        }

        debug!(sample_rate, block_size, "controller prepared");
    }

    /// Switch the measurement mode.
    ///
    /// Selecting the current mode again is a no-op; whatever partial
    /// window has accumulated keeps accumulating. A real change discards
    /// all partial state: accumulation, generator phase, and the metric
    /// series the new mode will refill.
    pub fn set_mode(&mut self, mode: AnalysisMode) {
        if mode == self.mode {
            return;
        }
        debug!(from = %self.mode, to = %mode, "mode change");
        self.mode = mode;

        self.spectrum.reset_accumulation();
        self.spectrum.set_window(if mode.is_windowed() {
            Window::Hann
        } else {
            Window::Rectangular
        });
        self.generator.reset();
        self.distortion.reset();
        self.dynamics.clear();
        self.envelope.clear();
        self.performance.clear();

        self.analyzing = mode.runs_continuously();
    }

    /// Arm a one-shot impulse capture.
    ///
    /// Only meaningful in [`AnalysisMode::Linear`]; other modes run
    /// continuously and ignore the trigger.
    pub fn trigger_impulse_response(&mut self) {
        if self.mode == AnalysisMode::Linear {
            self.generator.reset();
            self.spectrum.reset_accumulation();
            self.analyzing = true;
        }
    }

    /// Load (or clear) the unit under test.
    ///
    /// The new effect is prepared for the current rates, analysis is
    /// re-armed from a clean accumulator, and observers are notified.
    pub fn set_effect(&mut self, effect: Option<Box<dyn Effect + Send>>) {
        self.effect = effect;
        if let Some(effect) = self.effect.as_mut() {
            effect.prepare(self.sample_rate as f32, self.block_size);
        }
        self.generator.reset();
        self.spectrum.reset_accumulation();
        self.analyzing = true;
        self.notify(EngineEvent::EffectChanged);
    }

    /// Drive one audio block through the full pipeline.
    ///
    /// Generates the stimulus, runs it through the effect under timing
    /// capture, updates the mode's metrics, feeds the spectrum
    /// accumulator and the scope ring. Returns `true` when this call
    /// completed a transform (observers have already been notified).
    pub fn process_block(&mut self) -> bool {
        if !self.analyzing {
            return false;
        }

        self.generator
            .fill_block(&mut self.left, self.mode.stimulus());
        self.right.copy_from_slice(&self.left);
        self.pre_effect.copy_from_slice(&self.left);

        let started = Instant::now();
        if let Some(effect) = self.effect.as_mut() {
            effect.process_stereo(&mut self.left, &mut self.right);
        }
        let processing_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.performance
            .push(processing_ms, self.block_size, self.sample_rate);

        match self.mode {
            AnalysisMode::Dynamics => self.dynamics.push_block(&self.pre_effect, &self.left),
            AnalysisMode::Hammerstein => self.envelope.push_block(&self.left),
            _ => {}
        }

        let completed = self.spectrum.accumulate(&self.left, &self.right);
        self.scope.write(&self.left);

        if completed {
            self.update_distortion();
            if self.mode == AnalysisMode::Linear {
                // One-shot capture complete; wait for the next trigger.
                self.analyzing = false;
            }
            self.notify(EngineEvent::SpectrumReady);
        }
        completed
    }

    fn update_distortion(&mut self) {
        let Some(spectrum) = self.spectrum.left() else {
            return;
        };
        if self.mode.measures_thd() {
            self.distortion.update_thd(
                &spectrum.magnitude_db,
                self.generator.frequency(),
                self.sample_rate,
            );
        } else if self.mode.measures_imd() {
            let (f1, f2) = self.generator.imd_frequencies();
            self.distortion.update_imd(&spectrum.magnitude_db, f1, f2);
        }
    }

    fn notify(&mut self, event: EngineEvent) {
        for observer in &mut self.observers {
            observer(event);
        }
    }

    /// Register an observer for engine events.
    pub fn add_observer(&mut self, observer: Observer) {
        self.observers.push(observer);
    }

    /// Hand the scope consumer half to the display context.
    ///
    /// Returns `None` after the first call; there is exactly one reader.
    pub fn take_scope_reader(&mut self) -> Option<ScopeReader> {
        self.scope_reader.take()
    }

    /// Change the analysis FFT order (log2 of the window length).
    ///
    /// Orders outside 8..=15 are ignored. A valid change discards any
    /// partial accumulation; this resizes buffers and is a quiesce point
    /// like [`prepare`](AnalysisController::prepare).
    pub fn set_order(&mut self, order: u32) {
        self.spectrum.set_order(order);
    }

    /// Set the single-tone test frequency (clamped to 20 Hz..20 kHz).
    pub fn set_frequency(&mut self, frequency: f64) {
        self.generator.set_frequency(frequency);
    }

    /// Set the stimulus amplitude (clamped to 0..=1).
    pub fn set_amplitude(&mut self, amplitude: f32) {
        self.generator.set_amplitude(amplitude);
    }

    /// Active measurement mode.
    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    /// Whether the drive loop is currently generating and analyzing.
    pub fn is_analyzing(&self) -> bool {
        self.analyzing
    }

    /// Configured sample rate.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Configured audio block size in frames.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Whether a unit under test is loaded.
    pub fn has_effect(&self) -> bool {
        self.effect.is_some()
    }

    /// Spectrum snapshot access.
    pub fn spectrum(&self) -> &SpectrumAnalyzer {
        &self.spectrum
    }

    /// Distortion metrics snapshot access.
    pub fn distortion(&self) -> &DistortionAnalyzer {
        &self.distortion
    }

    /// Dynamics metrics snapshot access.
    pub fn dynamics(&self) -> &DynamicsTracker {
        &self.dynamics
    }

    /// Envelope metrics snapshot access.
    pub fn envelope(&self) -> &EnvelopeTracker {
        &self.envelope
    }

    /// Performance metrics snapshot access.
    pub fn performance(&self) -> &PerfTracker {
        &self.performance
    }

    /// Stimulus generator access, for sweep/ramp/burst parameters.
    pub fn generator_mut(&mut self) -> &mut SignalGenerator {
        &mut self.generator
    }
}
