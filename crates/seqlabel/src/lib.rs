//! # seqlabel
//!
//! Data preparation and chunked inference for sequence taggers trained on
//! CoNLL-style corpora. This crate re-exports [`seqlabel_core`].

pub use seqlabel_core::*;
