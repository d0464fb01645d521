pub mod conll;
pub mod corpus;
pub mod padding;

pub use conll::{ConllCorpus, ConllRow, LoadMode};
pub use corpus::{CorpusEncoder, EncodedCorpus, EncodedSentence};
pub use padding::{PaddedBatch, pad, pad_batch};
