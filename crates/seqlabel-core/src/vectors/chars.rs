//! # Character Vectors
//!
//! Maps every token index to a fixed-width vector of character indices.

use std::collections::HashMap;

use tracing::debug;

use crate::encode::padding::{PaddedBatch, pad_batch};
use crate::index::vocab::Vocabulary;
use crate::types::Slot;

/// Characters indexed by [`CharIndex::default`], starting at 2.
pub const DEFAULT_ALPHABET: &str = " 0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ.,-_()[]{}!?:;#'\"/\\%$`&=*+@^~|";

/// Character → index map with `PADDING` = 0 and `UNKNOWN` = 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharIndex {
    char_to_idx: HashMap<char, u32>,
}

impl CharIndex {
    /// Index the distinct characters of `alphabet` in order, from 2.
    pub fn from_alphabet(alphabet: &str) -> Self {
        let mut char_to_idx = HashMap::new();
        for c in alphabet.chars() {
            let next = char_to_idx.len() as u32 + Slot::FIRST_REAL;
            char_to_idx.entry(c).or_insert(next);
        }
        Self { char_to_idx }
    }

    /// Index of `c`, `UNKNOWN` for characters outside the alphabet.
    pub fn get(&self, c: char) -> u32 {
        self.char_to_idx
            .get(&c)
            .copied()
            .unwrap_or(Slot::UNKNOWN_INDEX)
    }

    pub fn encode(&self, token: &str) -> Vec<u32> {
        token.chars().map(|c| self.get(c)).collect()
    }

    /// Size of the index space, reserved entries included.
    pub fn vocab_size(&self) -> usize {
        self.char_to_idx.len() + Slot::FIRST_REAL as usize
    }
}

impl Default for CharIndex {
    fn default() -> Self {
        Self::from_alphabet(DEFAULT_ALPHABET)
    }
}

/// One row per token index, `max_token_len` wide.
///
/// Reserved tokens start as `[0]` and so pad out to all `PADDING`.
pub fn build_char_vectors(
    tokens: &Vocabulary,
    char_index: &CharIndex,
    max_token_len: usize,
) -> PaddedBatch {
    let raw: Vec<Vec<u32>> = tokens
        .iter()
        .map(|(idx, token)| {
            if idx >= Slot::FIRST_REAL {
                char_index.encode(token)
            } else {
                vec![Slot::PADDING_INDEX]
            }
        })
        .collect();

    let table = pad_batch(&raw, max_token_len);
    debug!("Char vector table: {:?}", table.shape());
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_index_reserves_low_slots() {
        let index = CharIndex::from_alphabet("ab");
        assert_eq!(index.get('a'), 2);
        assert_eq!(index.get('b'), 3);
        assert_eq!(index.get('z'), 1);
        assert_eq!(index.vocab_size(), 4);
    }

    #[test]
    fn test_duplicate_alphabet_chars_keep_first_index() {
        let index = CharIndex::from_alphabet("aba");
        assert_eq!(index.get('a'), 2);
        assert_eq!(index.get('b'), 3);
    }

    #[test]
    fn test_reserved_tokens_are_all_padding() {
        let vocab = Vocabulary::from_values(["ab"], true);
        let table = build_char_vectors(&vocab, &CharIndex::from_alphabet("ab"), 4);
        assert_eq!(table.row(0), Some(&[0, 0, 0, 0][..]));
        assert_eq!(table.row(1), Some(&[0, 0, 0, 0][..]));
        assert_eq!(table.row(2), Some(&[0, 0, 2, 3][..]));
    }

    #[test]
    fn test_long_tokens_keep_their_tail() {
        let vocab = Vocabulary::from_values(["abcab"], true);
        let table = build_char_vectors(&vocab, &CharIndex::from_alphabet("abc"), 3);
        assert_eq!(table.row(2), Some(&[4, 2, 3][..]));
    }

    #[test]
    fn test_unknown_chars() {
        let index = CharIndex::default();
        assert_eq!(index.encode("aé"), vec![index.get('a'), 1]);
    }
}
