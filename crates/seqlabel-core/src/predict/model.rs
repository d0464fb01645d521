//! # Model Boundary
//!
//! The tagger itself is opaque: it receives index tensors and returns
//! per-timestep class scores.

use candle_core::Tensor;

use crate::error::Result;

/// A sequence tagger with a fixed input width.
///
/// `inputs` holds one `(batch, max_len)` `u32` tensor per stream, token
/// indices first. The result must be shaped `(batch, max_len, num_labels)`.
pub trait TaggerModel {
    fn predict_batch(&self, inputs: &[Tensor]) -> Result<Tensor>;
}

impl<F> TaggerModel for F
where
    F: Fn(&[Tensor]) -> Result<Tensor>,
{
    fn predict_batch(&self, inputs: &[Tensor]) -> Result<Tensor> {
        self(inputs)
    }
}

/// Scores label `sum(stream values) % num_labels` highest at every position.
#[cfg(test)]
pub(crate) fn modulo_model(num_labels: usize) -> impl Fn(&[Tensor]) -> Result<Tensor> {
    use candle_core::Device;

    move |inputs: &[Tensor]| {
        let (batch, width) = inputs[0].dims2()?;
        let mut sums = vec![0u32; batch * width];
        for input in inputs {
            let values = input.flatten_all()?.to_vec1::<u32>()?;
            for (sum, value) in sums.iter_mut().zip(values) {
                *sum += value;
            }
        }
        let mut scores = vec![0f32; batch * width * num_labels];
        for (pos, sum) in sums.iter().enumerate() {
            scores[pos * num_labels + *sum as usize % num_labels] = 1.0;
        }
        Ok(Tensor::from_vec(scores, (batch, width, num_labels), &Device::Cpu)?)
    }
}
