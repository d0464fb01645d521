//! # Word Embedding Initialization
//!
//! Builds the token-index → vector matrix from a pretrained table, falling
//! back to a lemmatized lookup and then to a seeded random vector.

use std::collections::HashMap;

use candle_core::{Device, Tensor};
use candle_nn::Embedding;
use oorandom::Rand32;
use tracing::{debug, info};

use crate::error::{Result, SeqLabelError};
use crate::index::vocab::Vocabulary;
use crate::types::Slot;

/// Half-width of the uniform range used for tokens without a pretrained vector.
pub const RANDOM_INIT_RANGE: f32 = 0.25;

/// Pretrained vectors keyed by lowercase word.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PretrainedVectors {
    dim: usize,
    vectors: HashMap<String, Vec<f32>>,
}

impl PretrainedVectors {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            vectors: HashMap::new(),
        }
    }

    /// Add a vector; its length must equal [`PretrainedVectors::dim`].
    pub fn insert(&mut self, word: impl Into<String>, vector: Vec<f32>) -> Result<()> {
        let word = word.into();
        if vector.len() != self.dim {
            return Err(SeqLabelError::InvalidConfig(format!(
                "vector for {word:?} has {} dimensions, expected {}",
                vector.len(),
                self.dim
            )));
        }
        self.vectors.insert(word, vector);
        Ok(())
    }

    pub fn get(&self, word: &str) -> Option<&[f32]> {
        self.vectors.get(word).map(Vec::as_slice)
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

/// Reduces a word to its dictionary form for a second pretrained lookup.
pub trait Lemmatizer {
    fn lemmatize(&self, word: &str) -> String;
}

/// Regular English noun plurals, longest suffix first.
const PLURAL_RULES: &[(&str, &str)] = &[
    ("ches", "ch"),
    ("shes", "sh"),
    ("ies", "y"),
    ("ses", "s"),
    ("xes", "x"),
    ("zes", "z"),
    ("men", "man"),
    ("s", ""),
];

/// Strips regular plural suffixes from words longer than three characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct SuffixLemmatizer;

impl Lemmatizer for SuffixLemmatizer {
    fn lemmatize(&self, word: &str) -> String {
        if word.chars().count() <= 3 || word.ends_with("ss") {
            return word.to_string();
        }
        for (suffix, replacement) in PLURAL_RULES {
            if let Some(stem) = word.strip_suffix(suffix) {
                return format!("{stem}{replacement}");
            }
        }
        word.to_string()
    }
}

/// How the embedding rows were sourced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmbeddingReport {
    /// Rows drawn at random because neither lookup matched.
    pub not_in_pretrained: usize,
    /// Rows found only after lemmatization.
    pub found_lemmatized: usize,
}

/// Dense `(vocab, dim)` matrix; row `i` belongs to token index `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingMatrix {
    dim: usize,
    rows: Vec<Vec<f32>>,
}

impl EmbeddingMatrix {
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, idx: usize) -> Option<&[f32]> {
        self.rows.get(idx).map(Vec::as_slice)
    }

    pub fn to_tensor(&self, device: &Device) -> Result<Tensor> {
        let flat: Vec<f32> = self.rows.iter().flatten().copied().collect();
        Ok(Tensor::from_vec(flat, (self.rows.len(), self.dim), device)?)
    }

    /// Embedding layer initialized with this matrix.
    pub fn to_embedding(&self, device: &Device) -> Result<Embedding> {
        Ok(Embedding::new(self.to_tensor(device)?, self.dim))
    }
}

/// Build one embedding row per token index, in ascending index order.
///
/// Real tokens are lowercased before the lookup. The reserved entries are
/// looked up under their literal names (`PADDING`, `UNKNOWN`), which almost
/// always misses and yields a random row.
pub fn build_matrix<L: Lemmatizer + ?Sized>(
    tokens: &Vocabulary,
    pretrained: &PretrainedVectors,
    lemmatizer: &L,
    dimension: usize,
    rng: &mut Rand32,
) -> Result<(EmbeddingMatrix, EmbeddingReport)> {
    if pretrained.dim() != dimension {
        return Err(SeqLabelError::InvalidConfig(format!(
            "pretrained vectors have {} dimensions, expected {dimension}",
            pretrained.dim()
        )));
    }

    let mut report = EmbeddingReport::default();
    let mut rows = Vec::with_capacity(tokens.len());

    for (idx, token) in tokens.iter() {
        let key = if idx >= Slot::FIRST_REAL {
            token.to_lowercase()
        } else {
            token.to_string()
        };

        let row = if let Some(vector) = pretrained.get(&key) {
            vector.to_vec()
        } else if let Some(vector) = pretrained.get(&lemmatizer.lemmatize(&key)) {
            report.found_lemmatized += 1;
            vector.to_vec()
        } else {
            report.not_in_pretrained += 1;
            random_row(rng, dimension)
        };
        rows.push(row);
    }

    info!("Tokens not in pretrained: {}", report.not_in_pretrained);
    info!("Lemmatized token in pretrained: {}", report.found_lemmatized);
    debug!("Word embedding: ({}, {})", rows.len(), dimension);

    Ok((
        EmbeddingMatrix {
            dim: dimension,
            rows,
        },
        report,
    ))
}

fn random_row(rng: &mut Rand32, dim: usize) -> Vec<f32> {
    (0..dim)
        .map(|_| -RANDOM_INIT_RANGE + 2.0 * RANDOM_INIT_RANGE * rng.rand_float())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> PretrainedVectors {
        let mut table = PretrainedVectors::new(2);
        table.insert("berlin", vec![1.0, 1.0]).unwrap();
        table.insert("city", vec![2.0, 2.0]).unwrap();
        table
    }

    #[test]
    fn test_lookup_order() {
        let vocab = Vocabulary::from_values(["Berlin", "cities", "zzzq"], true);
        let mut rng = Rand32::new(7);
        let (matrix, report) =
            build_matrix(&vocab, &table(), &SuffixLemmatizer, 2, &mut rng).unwrap();

        assert_eq!(matrix.len(), 5);
        assert_eq!(matrix.row(2), Some(&[1.0, 1.0][..]));
        assert_eq!(matrix.row(3), Some(&[2.0, 2.0][..]));
        // PADDING, UNKNOWN and zzzq
        assert_eq!(report.not_in_pretrained, 3);
        assert_eq!(report.found_lemmatized, 1);
    }

    #[test]
    fn test_reserved_rows_use_literal_names() {
        let mut pretrained = PretrainedVectors::new(2);
        pretrained.insert("PADDING", vec![5.0, 5.0]).unwrap();
        pretrained.insert("unknown", vec![6.0, 6.0]).unwrap();
        let vocab = Vocabulary::with_unknown();
        let (matrix, report) =
            build_matrix(&vocab, &pretrained, &SuffixLemmatizer, 2, &mut Rand32::new(1)).unwrap();

        assert_eq!(matrix.row(0), Some(&[5.0, 5.0][..]));
        assert_ne!(matrix.row(1), Some(&[6.0, 6.0][..]));
        assert_eq!(report.not_in_pretrained, 1);
    }

    #[test]
    fn test_random_rows_in_range_and_seeded() {
        let vocab = Vocabulary::from_values(["a", "b", "c"], true);
        let empty = PretrainedVectors::new(50);
        let (first, _) = build_matrix(&vocab, &empty, &SuffixLemmatizer, 50, &mut Rand32::new(3)).unwrap();
        let (second, _) = build_matrix(&vocab, &empty, &SuffixLemmatizer, 50, &mut Rand32::new(3)).unwrap();
        assert_eq!(first, second);
        for idx in 0..first.len() {
            assert!(first.row(idx).unwrap().iter().all(|v| (-0.25..0.25).contains(v)));
        }
    }

    #[test]
    fn test_dimension_mismatch() {
        let vocab = Vocabulary::with_unknown();
        assert!(build_matrix(&vocab, &table(), &SuffixLemmatizer, 3, &mut Rand32::new(0)).is_err());
        let mut pretrained = PretrainedVectors::new(2);
        assert!(pretrained.insert("x", vec![0.0]).is_err());
    }

    #[test]
    fn test_suffix_lemmatizer() {
        let lem = SuffixLemmatizer;
        assert_eq!(lem.lemmatize("cities"), "city");
        assert_eq!(lem.lemmatize("churches"), "church");
        assert_eq!(lem.lemmatize("boxes"), "box");
        assert_eq!(lem.lemmatize("women"), "woman");
        assert_eq!(lem.lemmatize("dogs"), "dog");
        assert_eq!(lem.lemmatize("glass"), "glass");
        assert_eq!(lem.lemmatize("bus"), "bus");
    }

    #[test]
    fn test_embedding_tensor() {
        let vocab = Vocabulary::from_values(["berlin"], true);
        let (matrix, _) =
            build_matrix(&vocab, &table(), &SuffixLemmatizer, 2, &mut Rand32::new(0)).unwrap();
        let tensor = matrix.to_tensor(&Device::Cpu).unwrap();
        assert_eq!(tensor.dims(), &[3, 2]);
        assert!(matrix.to_embedding(&Device::Cpu).is_ok());
    }
}
