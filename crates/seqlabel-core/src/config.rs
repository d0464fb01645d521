//! # Registry Configuration
//!
//! Knobs fixed once when the index registry and lookup tables are built.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SeqLabelError};

/// Configuration for building an [`IndexRegistry`](crate::IndexRegistry)
/// and its lookup tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Minimum corpus frequency for a token to get its own index.
    pub freq_cutoff: usize,
    /// Share of vocabulary entries whose characters fit `max_token_len`.
    pub token_len_coverage: f64,
    /// Share of sentences whose tokens fit `max_sentence_len`.
    pub sentence_len_coverage: f64,
    /// Width of the word-embedding matrix.
    pub embedding_dim: usize,
    /// Seed for randomly initialized embedding rows.
    pub seed: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            freq_cutoff: 1,
            token_len_coverage: 0.99,
            sentence_len_coverage: 0.999,
            embedding_dim: 100,
            seed: 42,
        }
    }
}

impl RegistryConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a JSON configuration file. Missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| SeqLabelError::missing_file(path, e))?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the token frequency cutoff.
    pub fn with_freq_cutoff(mut self, cutoff: usize) -> Self {
        self.freq_cutoff = cutoff;
        self
    }

    /// Set the coverage ratio used to pick `max_token_len`.
    pub fn with_token_len_coverage(mut self, ratio: f64) -> Self {
        self.token_len_coverage = ratio;
        self
    }

    /// Set the coverage ratio used to pick `max_sentence_len`.
    pub fn with_sentence_len_coverage(mut self, ratio: f64) -> Self {
        self.sentence_len_coverage = ratio;
        self
    }

    /// Set the embedding width.
    pub fn with_embedding_dim(mut self, dim: usize) -> Self {
        self.embedding_dim = dim;
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Reject ratios outside `(0, 1]` and a zero embedding width.
    pub fn validate(&self) -> Result<()> {
        for (name, ratio) in [
            ("token_len_coverage", self.token_len_coverage),
            ("sentence_len_coverage", self.sentence_len_coverage),
        ] {
            if !(ratio > 0.0 && ratio <= 1.0) {
                return Err(SeqLabelError::InvalidConfig(format!(
                    "{name} must be in (0, 1], got {ratio}"
                )));
            }
        }
        if self.embedding_dim == 0 {
            return Err(SeqLabelError::InvalidConfig(
                "embedding_dim must be positive".into(),
            ));
        }
        Ok(())
    }
}
