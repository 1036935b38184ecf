//! Analysis mode state machine values.

use medidor_signal::SignalKind;

/// What the engine is currently measuring.
///
/// Exactly one mode is active at a time; the controller performs a full
/// reset whenever the mode changes. Every mode except [`Linear`] runs
/// continuously once selected; Linear waits for an explicit impulse
/// trigger.
///
/// [`Linear`]: AnalysisMode::Linear
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AnalysisMode {
    /// Impulse response capture (one-shot, triggered).
    #[default]
    Linear,
    /// Single-tone harmonic distortion measurement.
    Harmonic,
    /// Burst stimulus for attack/release envelope measurement.
    Hammerstein,
    /// Broadband noise response.
    WhiteNoise,
    /// Exponential sine sweep response.
    SineSweep,
    /// THD tracked against a swept fundamental.
    ThdSweep,
    /// Dual-tone intermodulation measurement.
    Imd,
    /// Level-ramp stimulus for compression-ratio measurement.
    Dynamics,
    /// Processing-time measurement under a steady tone.
    Performance,
}

impl AnalysisMode {
    /// All modes, in presentation order.
    pub const ALL: [AnalysisMode; 9] = [
        AnalysisMode::Linear,
        AnalysisMode::Harmonic,
        AnalysisMode::Hammerstein,
        AnalysisMode::WhiteNoise,
        AnalysisMode::SineSweep,
        AnalysisMode::ThdSweep,
        AnalysisMode::Imd,
        AnalysisMode::Dynamics,
        AnalysisMode::Performance,
    ];

    /// Stimulus the generator produces in this mode.
    pub fn stimulus(self) -> SignalKind {
        match self {
            AnalysisMode::Linear => SignalKind::Impulse,
            AnalysisMode::Harmonic | AnalysisMode::Imd | AnalysisMode::Performance => {
                SignalKind::Sine
            }
            AnalysisMode::Hammerstein => SignalKind::AttackRelease,
            AnalysisMode::WhiteNoise => SignalKind::WhiteNoise,
            AnalysisMode::SineSweep | AnalysisMode::ThdSweep => SignalKind::SineSweep,
            AnalysisMode::Dynamics => SignalKind::Ramp,
        }
    }

    /// Whether the spectrum is windowed before transforming.
    ///
    /// Impulse capture stays unwindowed; tapering would corrupt the
    /// impulse response.
    pub fn is_windowed(self) -> bool {
        self != AnalysisMode::Linear
    }

    /// Whether the mode generates and analyzes every block once selected.
    pub fn runs_continuously(self) -> bool {
        self != AnalysisMode::Linear
    }

    /// Whether completed spectra feed the single-tone THD metrics.
    pub fn measures_thd(self) -> bool {
        matches!(self, AnalysisMode::Harmonic | AnalysisMode::ThdSweep)
    }

    /// Whether completed spectra feed the dual-tone IMD metric.
    pub fn measures_imd(self) -> bool {
        self == AnalysisMode::Imd
    }

    /// Human-readable mode name.
    pub fn name(self) -> &'static str {
        match self {
            AnalysisMode::Linear => "linear",
            AnalysisMode::Harmonic => "harmonic",
            AnalysisMode::Hammerstein => "hammerstein",
            AnalysisMode::WhiteNoise => "white-noise",
            AnalysisMode::SineSweep => "sine-sweep",
            AnalysisMode::ThdSweep => "thd-sweep",
            AnalysisMode::Imd => "imd",
            AnalysisMode::Dynamics => "dynamics",
            AnalysisMode::Performance => "performance",
        }
    }
}

impl core::fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

impl core::str::FromStr for AnalysisMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnalysisMode::ALL
            .iter()
            .copied()
            .find(|mode| mode.name() == s)
            .ok_or_else(|| UnknownMode(s.to_string()))
    }
}

/// Returned when parsing an unrecognized mode name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown analysis mode: {0}")]
pub struct UnknownMode(pub String);
