//! Lock-free sample transport to the oscilloscope display.
//!
//! A single-producer/single-consumer ring: the audio callback writes
//! post-effect samples, a display loop at a much lower rate drains them.
//! When the display falls behind and the ring fills, new samples are
//! dropped rather than blocking the producer; the drop count is visible
//! on the reader side.
//!
//! Slots store f32 bit patterns in `AtomicU32`s. The release store of the
//! write cursor publishes the slot contents to the reader's acquire load,
//! so slot accesses themselves stay relaxed.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};

/// Default ring capacity in samples.
pub const DEFAULT_SCOPE_CAPACITY: usize = 32768;

struct Shared {
    slots: Vec<AtomicU32>,
    mask: usize,
    // Monotonic sample counts; slot index = count & mask.
    write_pos: AtomicUsize,
    read_pos: AtomicUsize,
    dropped: AtomicU64,
}

/// Producer half of the scope ring. Held by the analysis controller.
pub struct ScopeWriter {
    shared: Arc<Shared>,
}

/// Consumer half of the scope ring. Held by the display context.
pub struct ScopeReader {
    shared: Arc<Shared>,
}

/// Create a connected writer/reader pair.
///
/// `capacity` is rounded up to the next power of two (minimum 2) so slot
/// indexing is a mask.
pub fn scope_buffer(capacity: usize) -> (ScopeWriter, ScopeReader) {
    let capacity = capacity.max(2).next_power_of_two();
    let slots = (0..capacity).map(|_| AtomicU32::new(0)).collect();
    let shared = Arc::new(Shared {
        slots,
        mask: capacity - 1,
        write_pos: AtomicUsize::new(0),
        read_pos: AtomicUsize::new(0),
        dropped: AtomicU64::new(0),
    });
    (
        ScopeWriter {
            shared: Arc::clone(&shared),
        },
        ScopeReader { shared },
    )
}

impl ScopeWriter {
    /// Copy as many samples as fit into free slots, in order.
    ///
    /// Returns the number of samples accepted. Samples that do not fit are
    /// dropped and counted; the call never blocks.
    pub fn write(&mut self, samples: &[f32]) -> usize {
        let read = self.shared.read_pos.load(Ordering::Acquire);
        let write = self.shared.write_pos.load(Ordering::Relaxed);
        let free = self.shared.slots.len() - write.wrapping_sub(read);

        let accepted = samples.len().min(free);
        for (i, &sample) in samples[..accepted].iter().enumerate() {
            let slot = &self.shared.slots[write.wrapping_add(i) & self.shared.mask];
            slot.store(sample.to_bits(), Ordering::Relaxed);
        }
        self.shared
            .write_pos
            .store(write.wrapping_add(accepted), Ordering::Release);

        let dropped = samples.len() - accepted;
        if dropped > 0 {
            self.shared
                .dropped
                .fetch_add(dropped as u64, Ordering::Relaxed);
        }
        accepted
    }

    /// Ring capacity in samples.
    pub fn capacity(&self) -> usize {
        self.shared.slots.len()
    }

    /// Free slots at this instant. The consumer may free more at any time.
    pub fn free(&self) -> usize {
        let read = self.shared.read_pos.load(Ordering::Acquire);
        let write = self.shared.write_pos.load(Ordering::Relaxed);
        self.shared.slots.len() - write.wrapping_sub(read)
    }
}

impl ScopeReader {
    /// Copy up to `out.len()` buffered samples into `out`, oldest first.
    ///
    /// Returns the number of samples read, possibly zero.
    pub fn read(&mut self, out: &mut [f32]) -> usize {
        let write = self.shared.write_pos.load(Ordering::Acquire);
        let read = self.shared.read_pos.load(Ordering::Relaxed);
        let available = write.wrapping_sub(read);

        let count = out.len().min(available);
        for (i, slot_out) in out[..count].iter_mut().enumerate() {
            let slot = &self.shared.slots[read.wrapping_add(i) & self.shared.mask];
            *slot_out = f32::from_bits(slot.load(Ordering::Relaxed));
        }
        self.shared
            .read_pos
            .store(read.wrapping_add(count), Ordering::Release);
        count
    }

    /// Samples buffered at this instant. The producer may add more at any
    /// time.
    pub fn available(&self) -> usize {
        let write = self.shared.write_pos.load(Ordering::Acquire);
        let read = self.shared.read_pos.load(Ordering::Relaxed);
        write.wrapping_sub(read)
    }

    /// Ring capacity in samples.
    pub fn capacity(&self) -> usize {
        self.shared.slots.len()
    }

    /// Total samples the producer has dropped because the ring was full.
    pub fn dropped_samples(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }
}
