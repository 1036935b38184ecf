//! Per-block processing-time statistics.

use std::collections::VecDeque;

/// Number of block timings retained for the rolling statistics.
const MAX_TIMINGS: usize = 100;

/// Rolling processing-time statistics for the device under test.
///
/// Fed one measurement per audio block: how long the effect took to process
/// it. CPU load relates that to the real-time budget the block represents,
/// so 100% means the effect consumed the entire callback interval.
#[derive(Debug, Clone)]
pub struct PerfTracker {
    timings_ms: VecDeque<f32>,
    average_ms: f32,
    peak_ms: f32,
    cpu_load_percent: f32,
}

impl Default for PerfTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PerfTracker {
    /// Create an empty tracker with capacity for 100 timings.
    pub fn new() -> Self {
        Self {
            timings_ms: VecDeque::with_capacity(MAX_TIMINGS),
            average_ms: 0.0,
            peak_ms: 0.0,
            cpu_load_percent: 0.0,
        }
    }

    /// Record one block timing and refresh the derived statistics.
    ///
    /// `processing_ms` is the wall-clock time the effect spent on a block
    /// of `block_size` frames at `sample_rate`. The available time for
    /// that block is `block_size / sample_rate * 1000` ms; CPU load is the
    /// latest timing as a percentage of that budget.
    pub fn push(&mut self, processing_ms: f64, block_size: usize, sample_rate: f64) {
        if self.timings_ms.len() == MAX_TIMINGS {
            self.timings_ms.pop_front();
        }
        #[allow(clippy::cast_possible_truncation)]
        self.timings_ms.push_back(processing_ms as f32);

        let sum: f32 = self.timings_ms.iter().sum();
        self.average_ms = sum / self.timings_ms.len() as f32;
        self.peak_ms = self
            .timings_ms
            .iter()
            .copied()
            .fold(0.0_f32, f32::max);

        if sample_rate > 0.0 && block_size > 0 {
            let available_ms = block_size as f64 / sample_rate * 1000.0;
            #[allow(clippy::cast_possible_truncation)]
            {
                self.cpu_load_percent = (processing_ms / available_ms * 100.0) as f32;
            }
        }
    }

    /// Rolling average processing time in milliseconds.
    pub fn average_ms(&self) -> f32 {
        self.average_ms
    }

    /// Peak processing time in milliseconds over the retained window.
    pub fn peak_ms(&self) -> f32 {
        self.peak_ms
    }

    /// Latest CPU load as a percentage of the real-time budget.
    pub fn cpu_load_percent(&self) -> f32 {
        self.cpu_load_percent
    }

    /// Number of retained timings.
    pub fn len(&self) -> usize {
        self.timings_ms.len()
    }

    /// True when no timings have been recorded.
    pub fn is_empty(&self) -> bool {
        self.timings_ms.is_empty()
    }

    /// Drop all timings and zero the statistics.
    pub fn clear(&mut self) {
        self.timings_ms.clear();
        self.average_ms = 0.0;
        self.peak_ms = 0.0;
        self.cpu_load_percent = 0.0;
    }
}
