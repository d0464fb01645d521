//! # Padding Length Selection
//!
//! Picks a fixed tensor width that covers a given share of observed lengths.

use std::collections::BTreeMap;

use crate::index::vocab::Vocabulary;

/// Histogram of observed lengths: length → number of occurrences.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LengthDistribution {
    counts: BTreeMap<usize, usize>,
}

impl LengthDistribution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more occurrence of `len`.
    pub fn record(&mut self, len: usize) {
        *self.counts.entry(len).or_insert(0) += 1;
    }

    /// Total number of recorded occurrences.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn counts(&self) -> &BTreeMap<usize, usize> {
        &self.counts
    }

    /// Smallest length covering `coverage_ratio` of the distribution.
    pub fn select(&self, coverage_ratio: f64) -> usize {
        select_length(&self.counts, coverage_ratio)
    }

    /// Character lengths of every non-reserved entry of `vocab`.
    pub fn of_token_lengths(vocab: &Vocabulary) -> Self {
        vocab
            .iter_real()
            .map(|(_, token)| token.chars().count())
            .collect()
    }
}

impl FromIterator<usize> for LengthDistribution {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut dist = Self::new();
        for len in iter {
            dist.record(len);
        }
        dist
    }
}

impl From<BTreeMap<usize, usize>> for LengthDistribution {
    fn from(counts: BTreeMap<usize, usize>) -> Self {
        Self { counts }
    }
}

/// Return the smallest `L` such that the occurrences with length `<= L` make
/// up at least `coverage_ratio` of all occurrences.
///
/// An empty distribution selects 0. A ratio above 1 selects the largest
/// observed length.
pub fn select_length(distribution: &BTreeMap<usize, usize>, coverage_ratio: f64) -> usize {
    let total: usize = distribution.values().sum();
    // Absorbs the rounding of the product, e.g. 0.07 * 100 = 7.000000000000001.
    let threshold = coverage_ratio * total as f64 - 4.0 * f64::EPSILON * total as f64;

    let mut cumulative = 0usize;
    for (&len, &count) in distribution {
        cumulative += count;
        if cumulative as f64 >= threshold {
            return len;
        }
    }

    distribution.keys().next_back().copied().unwrap_or(0)
}
