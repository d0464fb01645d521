//! # Chunked Prediction
//!
//! The model accepts exactly `max_sentence_len` positions. Longer sentences
//! are cut into consecutive, non-overlapping chunks that are inferred
//! independently in one batch and flattened back in order, so every
//! prediction stays aligned with its token.

use std::ops::Range;

use candle_core::{D, Device};
use tracing::debug;

use crate::encode::padding::pad_batch;
use crate::error::{Result, SeqLabelError};
use crate::index::registry::IndexRegistry;
use crate::predict::model::TaggerModel;
use crate::types::Slot;

/// The predicted label of one padded input position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prediction {
    pub token: Slot,
    pub label: u32,
}

/// Split `len` positions into model-width chunks.
///
/// Sequences that fit give a single span. Otherwise `len / width` full spans
/// are followed, when `len % width != 0`, by the tail
/// `(len / width) * width .. len`, which is left-padded before inference.
pub fn chunk_spans(len: usize, width: usize) -> Vec<Range<usize>> {
    if len <= width || width == 0 {
        return vec![0..len];
    }

    let full = len / width;
    let mut spans: Vec<Range<usize>> = (0..full).map(|i| i * width..(i + 1) * width).collect();
    if len % width != 0 {
        spans.push(full * width..len);
    }
    spans
}

/// Runs a [`TaggerModel`] over sentences of any length.
pub struct ChunkedPredictor<'a, M: ?Sized> {
    registry: &'a IndexRegistry,
    model: &'a M,
    device: Device,
}

impl<'a, M: TaggerModel + ?Sized> ChunkedPredictor<'a, M> {
    /// Create a predictor that builds its input tensors on the CPU.
    pub fn new(registry: &'a IndexRegistry, model: &'a M) -> Self {
        Self {
            registry,
            model,
            device: Device::Cpu,
        }
    }

    /// Build input tensors on `device` instead.
    pub fn with_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    pub fn registry(&self) -> &'a IndexRegistry {
        self.registry
    }

    /// Predict raw tokens; unseen tokens are fed as `UNKNOWN`.
    ///
    /// Returns one [`Prediction`] per padded position, padding included.
    pub fn predict_tokens<S: AsRef<str>>(&self, raw_tokens: &[S]) -> Result<Vec<Prediction>> {
        let tokens: Vec<u32> = raw_tokens
            .iter()
            .map(|token| self.registry.token_slot(token.as_ref()).raw())
            .collect();
        self.run(&[tokens.as_slice()])
    }

    /// Predict parallel index streams, token indices first, chunking all of
    /// them at the same boundaries.
    pub fn predict_with_features<S: AsRef<[u32]>>(&self, streams: &[S]) -> Result<Vec<Prediction>> {
        let streams: Vec<&[u32]> = streams.iter().map(AsRef::as_ref).collect();
        self.run(&streams)
    }

    fn run(&self, streams: &[&[u32]]) -> Result<Vec<Prediction>> {
        let Some(tokens) = streams.first() else {
            return Err(SeqLabelError::ModelOutput("no input streams".into()));
        };
        let len = tokens.len();
        if let Some(stream) = streams.iter().find(|stream| stream.len() != len) {
            return Err(SeqLabelError::MisalignedStreams {
                expected: len,
                found: stream.len(),
            });
        }

        let width = self.registry.max_sentence_len();
        let spans = chunk_spans(len, width);
        debug!("Predicting {} positions in {} chunk(s)", len, spans.len());

        let batches: Vec<_> = streams
            .iter()
            .map(|stream| {
                let chunks: Vec<&[u32]> = spans.iter().map(|span| &stream[span.clone()]).collect();
                pad_batch(&chunks, width)
            })
            .collect();
        let inputs = batches
            .iter()
            .map(|batch| batch.to_tensor(&self.device))
            .collect::<Result<Vec<_>>>()?;

        let scores = self.model.predict_batch(&inputs)?;
        match scores.dims() {
            [chunks, positions, _] if *chunks == spans.len() && *positions == width => {}
            dims => {
                return Err(SeqLabelError::ModelOutput(format!(
                    "expected scores shaped ({}, {}, labels), got {:?}",
                    spans.len(),
                    width,
                    dims
                )));
            }
        }

        let labels = scores.argmax(D::Minus1)?.flatten_all()?.to_vec1::<u32>()?;
        Ok(batches[0]
            .flatten()
            .into_iter()
            .zip(labels)
            .map(|(token, label)| Prediction {
                token: Slot::from_raw(token),
                label,
            })
            .collect())
    }
}
