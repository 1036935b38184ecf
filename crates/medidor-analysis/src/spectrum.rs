//! Block accumulation and magnitude/phase spectrum extraction.
//!
//! Incoming audio arrives in arbitrary block sizes that rarely line up with
//! the analysis length N. [`SpectrumAnalyzer`] absorbs that mismatch: it
//! copies whatever fits into per-channel accumulators, transforms whenever
//! an accumulator fills, and carries any remainder of the incoming block
//! straight into the next accumulation cycle.

use medidor_core::linear_to_db_floor;
use rustfft::num_complex::Complex;

use crate::fft::{Fft, Window};

/// Smallest supported FFT order (N = 256).
pub const MIN_FFT_ORDER: u32 = 8;
/// Largest supported FFT order (N = 32768).
pub const MAX_FFT_ORDER: u32 = 15;
/// Magnitude floor for the dB spectrum.
pub const SPECTRUM_FLOOR_DB: f32 = -120.0;

/// Magnitude (dB) and phase (radians) for one channel, N/2 bins each.
///
/// Bin 0 is DC: its magnitude derives from the real component only and its
/// phase is fixed at 0. Every produced bin is computed directly from the
/// complex transform output; the true Nyquist bin (index N/2) is excluded
/// by construction.
#[derive(Debug, Clone)]
pub struct ChannelSpectrum {
    /// Per-bin magnitude in dB, floored at [`SPECTRUM_FLOOR_DB`].
    pub magnitude_db: Vec<f32>,
    /// Per-bin phase in radians, in (−π, π].
    pub phase: Vec<f32>,
}

impl ChannelSpectrum {
    fn sized(bins: usize) -> Self {
        Self {
            magnitude_db: vec![SPECTRUM_FLOOR_DB; bins],
            phase: vec![0.0; bins],
        }
    }

    /// Number of bins.
    pub fn len(&self) -> usize {
        self.magnitude_db.len()
    }

    /// True when the spectrum has no bins.
    pub fn is_empty(&self) -> bool {
        self.magnitude_db.is_empty()
    }
}

/// Stereo block-accumulation FFT analyzer.
///
/// Owns fixed-length accumulators for both channels, a cached FFT plan and
/// working storage. `accumulate` is allocation-free; `set_order` and
/// `set_window` are cold-path reconfigurations.
pub struct SpectrumAnalyzer {
    order: u32,
    size: usize,
    window: Window,
    window_coeffs: Vec<f32>,
    fft: Fft,
    accum_left: Vec<f32>,
    accum_right: Vec<f32>,
    fill: usize,
    work: Vec<Complex<f32>>,
    left: ChannelSpectrum,
    right: ChannelSpectrum,
    has_data: bool,
}

impl SpectrumAnalyzer {
    /// Create an analyzer with the given FFT order (log2 of N).
    ///
    /// Orders outside [`MIN_FFT_ORDER`]..=[`MAX_FFT_ORDER`] are clamped.
    pub fn new(order: u32) -> Self {
        let order = order.clamp(MIN_FFT_ORDER, MAX_FFT_ORDER);
        let size = 1usize << order;
        Self {
            order,
            size,
            window: Window::Hann,
            window_coeffs: Window::Hann.coefficients(size),
            fft: Fft::new(size),
            accum_left: vec![0.0; size],
            accum_right: vec![0.0; size],
            fill: 0,
            work: vec![Complex::new(0.0, 0.0); size],
            left: ChannelSpectrum::sized(size / 2),
            right: ChannelSpectrum::sized(size / 2),
            has_data: false,
        }
    }

    /// Change the FFT order. Values outside [8, 15] are ignored with no
    /// state change; valid changes reallocate, invalidate both spectra and
    /// reset accumulation.
    ///
    /// Not real-time safe: quiesce the audio callback first.
    pub fn set_order(&mut self, order: u32) {
        if !(MIN_FFT_ORDER..=MAX_FFT_ORDER).contains(&order) || order == self.order {
            return;
        }
        self.order = order;
        self.size = 1usize << order;
        self.fft.set_size(self.size);
        self.window_coeffs = self.window.coefficients(self.size);
        self.accum_left = vec![0.0; self.size];
        self.accum_right = vec![0.0; self.size];
        self.work = vec![Complex::new(0.0, 0.0); self.size];
        self.left = ChannelSpectrum::sized(self.size / 2);
        self.right = ChannelSpectrum::sized(self.size / 2);
        self.fill = 0;
        self.has_data = false;
    }

    /// Select the analysis window. Takes effect from the next completed
    /// transform; in-flight accumulation is kept.
    pub fn set_window(&mut self, window: Window) {
        if window != self.window {
            self.window = window;
            self.window_coeffs = window.coefficients(self.size);
        }
    }

    /// Active analysis window.
    pub fn window(&self) -> Window {
        self.window
    }

    /// FFT order (log2 of N).
    pub fn order(&self) -> u32 {
        self.order
    }

    /// Analysis block length N.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of spectrum bins (N/2).
    pub fn bins(&self) -> usize {
        self.size / 2
    }

    /// Frequency resolution in Hz for the given sample rate.
    pub fn bin_width(&self, sample_rate: f64) -> f64 {
        sample_rate / self.size as f64
    }

    /// Samples currently sitting in the accumulator, in [0, N).
    pub fn pending_samples(&self) -> usize {
        self.fill
    }

    /// True once at least one transform has completed since construction
    /// or the last `set_order`.
    pub fn has_data(&self) -> bool {
        self.has_data
    }

    /// Left-channel spectrum, or `None` while no transform has completed.
    ///
    /// "No data yet" is distinct from a floor-level spectrum: consumers
    /// should skip rendering on `None` rather than draw a flat line.
    pub fn left(&self) -> Option<&ChannelSpectrum> {
        self.has_data.then_some(&self.left)
    }

    /// Right-channel spectrum, or `None` while no transform has completed.
    pub fn right(&self) -> Option<&ChannelSpectrum> {
        self.has_data.then_some(&self.right)
    }

    /// Discard any partially accumulated samples. Completed spectra are
    /// kept on display until the next transform overwrites them.
    pub fn reset_accumulation(&mut self) {
        self.fill = 0;
        self.accum_left.fill(0.0);
        self.accum_right.fill(0.0);
    }

    /// Feed one stereo block. Copies `min(remaining capacity, len)` samples
    /// per cycle; when an accumulator fills, both channels are windowed,
    /// transformed and extracted, then the remainder of the block flows
    /// into the next cycle.
    ///
    /// Returns true when at least one transform completed during this call.
    pub fn accumulate(&mut self, left: &[f32], right: &[f32]) -> bool {
        debug_assert_eq!(left.len(), right.len());

        let mut completed = false;
        let mut offset = 0;
        while offset < left.len() {
            let take = (self.size - self.fill).min(left.len() - offset);
            self.accum_left[self.fill..self.fill + take]
                .copy_from_slice(&left[offset..offset + take]);
            self.accum_right[self.fill..self.fill + take]
                .copy_from_slice(&right[offset..offset + take]);
            self.fill += take;
            offset += take;

            if self.fill == self.size {
                self.transform();
                completed = true;
                self.fill = 0;
                self.accum_left.fill(0.0);
                self.accum_right.fill(0.0);
            }
        }
        completed
    }

    fn transform(&mut self) {
        extract_channel(
            &mut self.fft,
            &mut self.work,
            &self.accum_left,
            &self.window_coeffs,
            &mut self.left,
        );
        extract_channel(
            &mut self.fft,
            &mut self.work,
            &self.accum_right,
            &self.window_coeffs,
            &mut self.right,
        );
        self.has_data = true;
    }
}

/// Window, transform and extract one channel into `out`.
fn extract_channel(
    fft: &mut Fft,
    work: &mut [Complex<f32>],
    accum: &[f32],
    coeffs: &[f32],
    out: &mut ChannelSpectrum,
) {
    for (w, (&s, &c)) in work.iter_mut().zip(accum.iter().zip(coeffs.iter())) {
        *w = Complex::new(s * c, 0.0);
    }
    fft.process(work);

    let bins = accum.len() / 2;
    for i in 0..bins {
        let re = work[i].re;
        let im = work[i].im;
        let (mag, phase) = if i == 0 {
            // DC is purely real; phase pinned to 0.
            (re.abs(), 0.0)
        } else {
            ((re * re + im * im).sqrt(), im.atan2(re))
        };
        out.magnitude_db[i] = linear_to_db_floor(mag, SPECTRUM_FLOOR_DB);
        out.phase[i] = phase;
    }
}
