//! # Seqlabel Core
//!
//! Data-preparation and inference plumbing for neural sequence labelers:
//! index registries built from CoNLL corpora, padded index tensors, lookup
//! tables for characters, casing and word embeddings, and chunked
//! prediction over sentences longer than the model's input width.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use seqlabel_core::{CorpusEncoder, RegistryBuilder, RegistryConfig};
//!
//! let registry = RegistryBuilder::new(RegistryConfig::default())
//!     .with_training(["train.conll"])
//!     .build()
//!     .unwrap();
//!
//! let encoder = CorpusEncoder::new(&registry);
//! let corpus = encoder.load_labeled("dev.conll", false).unwrap();
//! assert_eq!(corpus.tokens.width(), registry.max_sentence_len());
//! ```
pub mod config;
pub mod encode;
pub mod error;
pub mod index;
pub mod predict;
pub mod types;
pub mod vectors;

// Re-export primary API
pub use config::RegistryConfig;
pub use encode::{
    ConllCorpus, CorpusEncoder, EncodedCorpus, EncodedSentence, LoadMode, PaddedBatch, pad,
    pad_batch,
};
pub use error::{Result, SeqLabelError};
pub use index::{IndexRegistry, LengthDistribution, RegistryBuilder, Vocabulary, select_length};
pub use predict::{
    ChunkedPredictor, Prediction, PredictionRecord, PredictionWriter, TaggerModel, chunk_spans,
    predict_corpus, predict_csv, validate_predictions,
};
pub use types::{PADDING_TOKEN, Slot, UNKNOWN_TOKEN};
pub use vectors::{
    Casing, CasingClassifier, CharIndex, EmbeddingMatrix, EmbeddingReport, Lemmatizer,
    LookupTables, PretrainedVectors, SuffixLemmatizer, WordShapeCasing,
};
