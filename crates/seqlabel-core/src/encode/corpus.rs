//! # Corpus Encoding
//!
//! Turns CoNLL corpora into index sequences and fixed-width batches.

use std::path::Path;

use candle_core::{Device, Tensor};
use tracing::{debug, info};

use crate::encode::conll::{ConllCorpus, ConllRow, LoadMode};
use crate::encode::padding::{PaddedBatch, pad_batch};
use crate::error::{Result, SeqLabelError};
use crate::index::registry::IndexRegistry;
use crate::types::Slot;

/// A sentence mapped through the registry, before padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedSentence {
    pub tokens: Vec<Slot>,
    /// One stream per feature column; empty when features were not loaded.
    pub features: Vec<Vec<Slot>>,
    /// Label indices in labeled mode.
    pub labels: Option<Vec<u32>>,
}

impl EncodedSentence {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Token stream followed by every feature stream, as raw indices.
    pub fn streams(&self) -> Vec<Vec<u32>> {
        std::iter::once(&self.tokens)
            .chain(self.features.iter())
            .map(|stream| raw_stream(stream))
            .collect()
    }
}

fn raw_stream(stream: &[Slot]) -> Vec<u32> {
    stream.iter().map(|slot| slot.raw()).collect()
}

/// A corpus padded to `max_sentence_len`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedCorpus {
    pub tokens: PaddedBatch,
    pub features: Vec<PaddedBatch>,
    pub labels: Option<PaddedBatch>,
}

impl EncodedCorpus {
    /// Number of sentences.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Labels carry a trailing singleton axis to line up with per-timestep
    /// class scores: `(sentences, max_sentence_len, 1)`.
    pub fn label_shape(&self) -> Option<(usize, usize, usize)> {
        self.labels.as_ref().map(|labels| {
            let (rows, width) = labels.shape();
            (rows, width, 1)
        })
    }

    /// Token tensor followed by one tensor per feature column.
    pub fn input_tensors(&self, device: &Device) -> Result<Vec<Tensor>> {
        std::iter::once(&self.tokens)
            .chain(self.features.iter())
            .map(|batch| batch.to_tensor(device))
            .collect()
    }

    /// `(sentences, max_sentence_len, 1)` label tensor.
    pub fn label_tensor(&self, device: &Device) -> Result<Option<Tensor>> {
        match &self.labels {
            Some(labels) => Ok(Some(labels.to_tensor(device)?.unsqueeze(2)?)),
            None => Ok(None),
        }
    }

    /// Every tensor under a stable name: `tokens`, `feature_<i>`, `labels`.
    pub fn named_tensors(&self, device: &Device) -> Result<Vec<(String, Tensor)>> {
        let mut named = vec![("tokens".to_string(), self.tokens.to_tensor(device)?)];
        for (column, batch) in self.features.iter().enumerate() {
            named.push((format!("feature_{column}"), batch.to_tensor(device)?));
        }
        if let Some(labels) = self.label_tensor(device)? {
            named.push(("labels".to_string(), labels));
        }
        Ok(named)
    }
}

/// Encodes corpora with a borrowed registry.
#[derive(Debug, Clone, Copy)]
pub struct CorpusEncoder<'a> {
    registry: &'a IndexRegistry,
}

impl<'a> CorpusEncoder<'a> {
    pub fn new(registry: &'a IndexRegistry) -> Self {
        Self { registry }
    }

    /// Token, feature and label tensors of a labeled corpus.
    pub fn load_labeled(&self, path: impl AsRef<Path>, with_features: bool) -> Result<EncodedCorpus> {
        let sentences = self.read_sentences(path, LoadMode::Labeled, with_features)?;
        self.pad(&sentences, LoadMode::Labeled, with_features)
    }

    /// Token and feature tensors of an unlabeled corpus.
    pub fn load_unlabeled(
        &self,
        path: impl AsRef<Path>,
        with_features: bool,
    ) -> Result<EncodedCorpus> {
        let sentences = self.read_sentences(path, LoadMode::Unlabeled, with_features)?;
        self.pad(&sentences, LoadMode::Unlabeled, with_features)
    }

    /// Encode every sentence of `path` without padding.
    pub fn read_sentences(
        &self,
        path: impl AsRef<Path>,
        mode: LoadMode,
        with_features: bool,
    ) -> Result<Vec<EncodedSentence>> {
        let corpus = ConllCorpus::read(path)?;
        let sentences = corpus
            .sentences()
            .iter()
            .map(|rows| self.encode_sentence(&corpus, rows, mode, with_features))
            .collect::<Result<Vec<_>>>()?;
        info!("Loaded {} sentences from {:?}", sentences.len(), corpus.path());
        Ok(sentences)
    }

    /// Pad every stream of `sentences` to `max_sentence_len`.
    ///
    /// With `with_features` there is one feature batch per registered column,
    /// even for an empty corpus. Labels are kept in labeled mode only. A
    /// sentence whose streams do not match fails with
    /// [`SeqLabelError::MisalignedStreams`].
    pub fn pad(
        &self,
        sentences: &[EncodedSentence],
        mode: LoadMode,
        with_features: bool,
    ) -> Result<EncodedCorpus> {
        let width = self.registry.max_sentence_len();
        let columns = if with_features {
            self.registry.num_feature_columns()
        } else {
            0
        };

        let mut tokens = Vec::with_capacity(sentences.len());
        let mut features = vec![Vec::with_capacity(sentences.len()); columns];
        let mut labels = Vec::with_capacity(sentences.len());
        for sentence in sentences {
            if with_features && sentence.features.len() != columns {
                return Err(SeqLabelError::MisalignedStreams {
                    expected: columns,
                    found: sentence.features.len(),
                });
            }
            tokens.push(raw_stream(&sentence.tokens));
            for (column, stream) in features.iter_mut().zip(&sentence.features) {
                if stream.len() != sentence.len() {
                    return Err(SeqLabelError::MisalignedStreams {
                        expected: sentence.len(),
                        found: stream.len(),
                    });
                }
                column.push(raw_stream(stream));
            }
            if mode == LoadMode::Labeled {
                let sentence_labels = sentence.labels.as_deref().unwrap_or_default();
                if sentence_labels.len() != sentence.len() {
                    return Err(SeqLabelError::MisalignedStreams {
                        expected: sentence.len(),
                        found: sentence_labels.len(),
                    });
                }
                labels.push(sentence_labels.to_vec());
            }
        }

        let corpus = EncodedCorpus {
            tokens: pad_batch(&tokens, width),
            features: features.iter().map(|rows| pad_batch(rows, width)).collect(),
            labels: (mode == LoadMode::Labeled).then(|| pad_batch(&labels, width)),
        };
        debug!("Encoded corpus: {:?}", corpus.tokens.shape());
        Ok(corpus)
    }

    fn encode_sentence(
        &self,
        corpus: &ConllCorpus,
        rows: &[ConllRow],
        mode: LoadMode,
        with_features: bool,
    ) -> Result<EncodedSentence> {
        let columns = self.registry.num_feature_columns();
        let mut tokens = Vec::with_capacity(rows.len());
        let mut features = if with_features {
            vec![Vec::with_capacity(rows.len()); columns]
        } else {
            Vec::new()
        };
        let mut labels = match mode {
            LoadMode::Labeled => Some(Vec::with_capacity(rows.len())),
            LoadMode::Unlabeled => None,
        };

        for row in rows {
            self.check_fields(corpus, row, mode, with_features)?;

            tokens.push(self.registry.token_slot(row.token()));

            if with_features {
                for (column, value) in row.features(mode).iter().enumerate() {
                    features[column].push(self.registry.feature_slot(column, value));
                }
            }

            if let Some(labels) = labels.as_mut() {
                let tag = row.tag().unwrap_or_default();
                let index = self.registry.label_index(tag).ok_or_else(|| {
                    SeqLabelError::UnknownLabel {
                        label: tag.to_string(),
                        path: corpus.path().to_path_buf(),
                        line: row.line,
                    }
                })?;
                labels.push(index);
            }
        }

        Ok(EncodedSentence {
            tokens,
            features,
            labels,
        })
    }

    fn check_fields(
        &self,
        corpus: &ConllCorpus,
        row: &ConllRow,
        mode: LoadMode,
        with_features: bool,
    ) -> Result<()> {
        let found = row.fields.len();
        if with_features {
            let expected = mode.fixed_fields() + self.registry.num_feature_columns();
            if found != expected {
                return Err(corpus.malformed(
                    row,
                    format!("expected {expected} fields, found {found}"),
                ));
            }
        } else if found < mode.fixed_fields() {
            return Err(corpus.malformed(
                row,
                format!("expected at least {} fields, found {found}", mode.fixed_fields()),
            ));
        }
        Ok(())
    }
}
