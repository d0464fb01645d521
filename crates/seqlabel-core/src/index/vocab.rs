//! # Vocabulary
//!
//! Bijection between strings and dense indices with reserved low slots.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{PADDING_TOKEN, Slot, UNKNOWN_TOKEN};

/// A string ↔ index map.
///
/// Index 0 is always `PADDING`. Token and feature vocabularies also reserve
/// index 1 for `UNKNOWN`; label vocabularies do not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "VocabularyRepr", into = "VocabularyRepr")]
pub struct Vocabulary {
    entries: Vec<String>,
    lookup: HashMap<String, u32>,
    reserves_unknown: bool,
}

#[derive(Serialize, Deserialize)]
struct VocabularyRepr {
    reserves_unknown: bool,
    entries: Vec<String>,
}

impl From<VocabularyRepr> for Vocabulary {
    fn from(repr: VocabularyRepr) -> Self {
        let first_real = reserved_count(repr.reserves_unknown);
        let lookup = repr
            .entries
            .iter()
            .enumerate()
            .skip(first_real as usize)
            .map(|(idx, value)| (value.clone(), idx as u32))
            .collect();
        Self {
            entries: repr.entries,
            lookup,
            reserves_unknown: repr.reserves_unknown,
        }
    }
}

fn reserved_count(reserves_unknown: bool) -> u32 {
    if reserves_unknown { Slot::FIRST_REAL } else { 1 }
}

impl From<Vocabulary> for VocabularyRepr {
    fn from(vocab: Vocabulary) -> Self {
        Self {
            reserves_unknown: vocab.reserves_unknown,
            entries: vocab.entries,
        }
    }
}

impl Vocabulary {
    /// Vocabulary with `PADDING` = 0 and `UNKNOWN` = 1 (tokens, features).
    ///
    /// Reserved names only serve reverse lookup; a real value spelled
    /// `PADDING` or `UNKNOWN` still gets its own index.
    pub fn with_unknown() -> Self {
        Self {
            entries: vec![PADDING_TOKEN.to_string(), UNKNOWN_TOKEN.to_string()],
            lookup: HashMap::new(),
            reserves_unknown: true,
        }
    }

    /// Vocabulary with only `PADDING` = 0 (labels).
    pub fn padding_only() -> Self {
        Self {
            entries: vec![PADDING_TOKEN.to_string()],
            lookup: HashMap::new(),
            reserves_unknown: false,
        }
    }

    /// Build from values in the order given, skipping values already present.
    pub fn from_values<I, S>(values: I, reserves_unknown: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut vocab = if reserves_unknown {
            Self::with_unknown()
        } else {
            Self::padding_only()
        };
        for value in values {
            vocab.insert(value.as_ref());
        }
        vocab
    }

    /// Append `value` if absent; returns its index either way.
    pub fn insert(&mut self, value: &str) -> u32 {
        if let Some(&idx) = self.lookup.get(value) {
            return idx;
        }
        let idx = self.entries.len() as u32;
        self.entries.push(value.to_string());
        self.lookup.insert(value.to_string(), idx);
        idx
    }

    /// Raw index of a real `value`, if registered. Never a reserved index.
    pub fn get(&self, value: &str) -> Option<u32> {
        self.lookup.get(value).copied()
    }

    /// Look up `value`, degrading to [`Slot::Unknown`] when it is absent.
    pub fn slot(&self, value: &str) -> Slot {
        self.get(value).map_or(Slot::Unknown, Slot::from_raw)
    }

    /// String stored at `index`.
    pub fn value(&self, index: u32) -> Option<&str> {
        self.entries.get(index as usize).map(String::as_str)
    }

    /// Number of entries including the reserved ones.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Never true: `PADDING` is always present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn reserves_unknown(&self) -> bool {
        self.reserves_unknown
    }

    /// Index of the first non-reserved entry.
    pub fn first_real(&self) -> u32 {
        reserved_count(self.reserves_unknown)
    }

    /// All `(index, value)` pairs in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(idx, value)| (idx as u32, value.as_str()))
    }

    /// Non-reserved `(index, value)` pairs in ascending index order.
    pub fn iter_real(&self) -> impl Iterator<Item = (u32, &str)> {
        let first = self.first_real();
        self.iter().filter(move |(idx, _)| *idx >= first)
    }
}
