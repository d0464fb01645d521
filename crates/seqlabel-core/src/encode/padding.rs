//! # Sequence Padding
//!
//! Fixed-width normalization: sequences are padded on the left with the
//! zero value and truncated from the front, keeping their tail.

use candle_core::{Device, Tensor};

use crate::error::Result;

/// Left-pad `sequence` with `T::default()` or keep its last `target_len`
/// elements, so the result always has exactly `target_len` elements.
pub fn pad<T: Copy + Default>(sequence: &[T], target_len: usize) -> Vec<T> {
    if sequence.len() >= target_len {
        return sequence[sequence.len() - target_len..].to_vec();
    }
    let mut padded = vec![T::default(); target_len - sequence.len()];
    padded.extend_from_slice(sequence);
    padded
}

/// Pad every sequence to `target_len`, keeping their order.
pub fn pad_batch<S: AsRef<[u32]>>(sequences: &[S], target_len: usize) -> PaddedBatch {
    PaddedBatch {
        width: target_len,
        rows: sequences
            .iter()
            .map(|seq| pad(seq.as_ref(), target_len))
            .collect(),
    }
}

/// Equal-width rows of raw indices, shaped `(rows, width)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaddedBatch {
    width: usize,
    rows: Vec<Vec<u32>>,
}

impl PaddedBatch {
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.width)
    }

    pub fn rows(&self) -> &[Vec<u32>] {
        &self.rows
    }

    pub fn row(&self, idx: usize) -> Option<&[u32]> {
        self.rows.get(idx).map(Vec::as_slice)
    }

    /// Row-major copy of every value.
    pub fn flatten(&self) -> Vec<u32> {
        self.rows.iter().flatten().copied().collect()
    }

    /// `(rows, width)` tensor of `u32`.
    pub fn to_tensor(&self, device: &Device) -> Result<Tensor> {
        Ok(Tensor::from_vec(self.flatten(), self.shape(), device)?)
    }
}
