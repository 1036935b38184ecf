//! FFT plan caching and window functions.

use rustfft::{FftPlanner, num_complex::Complex};
use std::f32::consts::PI;
use std::sync::Arc;

/// Analysis window applied before transforming.
///
/// Continuous stimuli (sine, noise, sweep, ramp, burst) get a Hann window
/// to contain spectral leakage; impulse capture stays rectangular because
/// tapering would corrupt the impulse response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Window {
    /// No windowing (impulse capture).
    Rectangular,
    /// Hann window (raised cosine), the default for continuous stimuli.
    #[default]
    Hann,
}

impl Window {
    /// Apply the window to a buffer in place.
    pub fn apply(&self, buffer: &mut [f32]) {
        match self {
            Window::Rectangular => {}
            Window::Hann => {
                let n = buffer.len();
                for (i, sample) in buffer.iter_mut().enumerate() {
                    let w = 0.5 * (1.0 - (2.0 * PI * i as f32 / n as f32).cos());
                    *sample *= w;
                }
            }
        }
    }

    /// Window coefficients for a given size.
    pub fn coefficients(&self, size: usize) -> Vec<f32> {
        let mut coeffs = vec![1.0; size];
        self.apply(&mut coeffs);
        coeffs
    }
}

/// Forward FFT with a cached plan and pre-sized scratch space.
///
/// `process` is allocation-free; changing the size re-plans and re-sizes
/// scratch, which is a cold-path operation.
pub struct Fft {
    planner: FftPlanner<f32>,
    fft: Arc<dyn rustfft::Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    size: usize,
}

impl Fft {
    /// Create a forward FFT plan for the given size.
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];
        Self {
            planner,
            fft,
            scratch,
            size,
        }
    }

    /// FFT size.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Re-plan for a new size. No-op when the size is unchanged.
    pub fn set_size(&mut self, size: usize) {
        if size != self.size {
            self.fft = self.planner.plan_fft_forward(size);
            self.scratch
                .resize(self.fft.get_inplace_scratch_len(), Complex::new(0.0, 0.0));
            self.size = size;
        }
    }

    /// Forward transform in place. `buffer.len()` must equal `size()`.
    pub fn process(&mut self, buffer: &mut [Complex<f32>]) {
        debug_assert_eq!(buffer.len(), self.size);
        self.fft.process_with_scratch(buffer, &mut self.scratch);
    }
}
