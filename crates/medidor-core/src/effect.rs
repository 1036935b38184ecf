//! The [`Effect`] trait - the seam to the audio unit under test.
//!
//! The measurement engine stimulates an opaque processing unit and analyzes
//! whatever comes back. This trait is the entire contract with that unit:
//! it gets prepared once, then mutates stereo blocks in place. How concrete
//! implementations are discovered or instantiated is not this crate's
//! concern.
//!
//! ## Design Decisions
//!
//! - **In-place stereo blocks**: the engine always feeds two channels of
//!   equal length; mono units simply process both. No return value - the
//!   unit's only output is the mutated buffer.
//!
//! - **Object-safe**: the engine holds `Box<dyn Effect + Send>` so units
//!   can be swapped at runtime.
//!
//! - **No allocations**: `process_stereo` runs inside a hard real-time
//!   callback. Implementations must do all their allocation in `prepare`.

/// An audio processing unit under test.
///
/// # Example
///
/// ```rust
/// use medidor_core::Effect;
///
/// struct Gain {
///     gain: f32,
/// }
///
/// impl Effect for Gain {
///     fn prepare(&mut self, _sample_rate: f32, _block_size: usize) {}
///
///     fn process_stereo(&mut self, left: &mut [f32], right: &mut [f32]) {
///         for s in left.iter_mut().chain(right.iter_mut()) {
///             *s *= self.gain;
///         }
///     }
///
///     fn reset(&mut self) {}
/// }
/// ```
pub trait Effect {
    /// Prepare for processing.
    ///
    /// Called once before any `process_stereo` call and again after every
    /// reconfiguration (sample rate or block size change). Implementations
    /// should size internal buffers and recalculate coefficients here;
    /// this is the only place allocation is allowed.
    ///
    /// # Arguments
    /// * `sample_rate` - Sample rate in Hz (e.g. 44100.0, 48000.0)
    /// * `block_size` - Maximum number of samples per channel per block
    fn prepare(&mut self, sample_rate: f32, block_size: usize);

    /// Process one stereo block in place.
    ///
    /// Called once per audio block with two equal-length channel slices.
    /// Must not allocate, lock, or perform I/O.
    fn process_stereo(&mut self, left: &mut [f32], right: &mut [f32]);

    /// Clear internal state (delay lines, envelopes, filter history)
    /// without changing parameters.
    fn reset(&mut self);

    /// Processing latency in samples introduced by this unit.
    ///
    /// Default returns 0 (no latency).
    fn latency_samples(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Inverter;

    impl Effect for Inverter {
        fn prepare(&mut self, _sample_rate: f32, _block_size: usize) {}

        fn process_stereo(&mut self, left: &mut [f32], right: &mut [f32]) {
            for s in left.iter_mut().chain(right.iter_mut()) {
                *s = -*s;
            }
        }

        fn reset(&mut self) {}
    }

    #[test]
    fn process_mutates_in_place() {
        let mut fx = Inverter;
        let mut left = [1.0, -0.5];
        let mut right = [0.25, 0.0];
        fx.process_stereo(&mut left, &mut right);
        assert_eq!(left, [-1.0, 0.5]);
        assert_eq!(right, [-0.25, 0.0]);
    }

    #[test]
    fn default_latency_is_zero() {
        let fx = Inverter;
        assert_eq!(fx.latency_samples(), 0);
    }

    #[test]
    fn trait_is_object_safe() {
        let mut boxed: Box<dyn Effect + Send> = Box::new(Inverter);
        boxed.prepare(48000.0, 512);
        let mut l = [0.5];
        let mut r = [0.5];
        boxed.process_stereo(&mut l, &mut r);
        assert_eq!(l[0], -0.5);
    }
}
