pub mod chunked;
pub mod model;
pub mod validate;
pub mod writer;

pub use chunked::{ChunkedPredictor, Prediction, chunk_spans};
pub use model::TaggerModel;
pub use validate::validate_predictions;
pub use writer::{
    PredictionRecord, PredictionWriter, predict_corpus, predict_csv, sentence_records,
};
