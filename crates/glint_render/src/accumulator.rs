//! Wide-integer accumulation of 8-bit frames.

use rayon::prelude::*;

/// Running per-channel sum of every frame added so far.
///
/// Cells are `u64` so the sum of any realistic number of 8-bit frames fits
/// without wrapping; a `u16` would overflow after 257 frames of white.
#[derive(Debug, Clone)]
pub struct Accumulator {
    sums: Vec<u64>,
    batches: u32,
}

impl Accumulator {
    /// Create an accumulator for frames of `len` bytes.
    pub fn new(len: usize) -> Self {
        Self {
            sums: vec![0; len],
            batches: 0,
        }
    }

    /// Add one frame. `frame` must be exactly as long as the accumulator.
    pub fn add(&mut self, frame: &[u8]) {
        assert_eq!(
            frame.len(),
            self.sums.len(),
            "frame size does not match accumulator"
        );
        self.sums
            .par_iter_mut()
            .zip(frame.par_iter())
            .for_each(|(sum, &byte)| *sum += u64::from(byte));
        self.batches += 1;
    }

    /// Number of frames added.
    pub fn batches(&self) -> u32 {
        self.batches
    }

    pub fn sums(&self) -> &[u64] {
        &self.sums
    }

    /// Divide every cell by the number of frames added, truncating.
    /// An empty accumulator averages to zero.
    pub fn average(self) -> Vec<u8> {
        let divisor = u64::from(self.batches.max(1));
        self.sums
            .into_par_iter()
            .map(|sum| (sum / divisor) as u8)
            .collect()
    }
}
