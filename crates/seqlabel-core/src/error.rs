use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while indexing, encoding or predicting.
#[derive(Debug, Error)]
pub enum SeqLabelError {
    /// An input corpus could not be opened or read.
    #[error("cannot read {path:?}: {source}")]
    MissingFile {
        /// The path that failed.
        path: PathBuf,
        /// The underlying I/O failure.
        source: std::io::Error,
    },

    /// A corpus row has a field count that does not fit the load mode.
    #[error("malformed row at {path:?}:{line}: {reason}")]
    MalformedRow {
        /// File containing the row.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// What was wrong with the row.
        reason: String,
    },

    /// A tag was not seen when the label index was built.
    #[error("unknown label {label:?} at {path:?}:{line}")]
    UnknownLabel {
        /// The unregistered tag.
        label: String,
        /// File containing the tag.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
    },

    /// A prediction record disagrees with the original test row.
    #[error("prediction mismatch at record {line}: expected {expected:?}, found {found:?}")]
    ValidationMismatch {
        /// 1-based prediction record number.
        line: usize,
        /// Fields taken from the original test file.
        expected: String,
        /// Fields taken from the prediction file.
        found: String,
    },

    /// Parallel input streams of one sentence differ in length.
    #[error("misaligned input streams: token stream has {expected} positions, another has {found}")]
    MisalignedStreams {
        /// Length of the token stream.
        expected: usize,
        /// Length of the offending stream.
        found: usize,
    },

    /// The model returned scores of an unexpected shape.
    #[error("model output error: {0}")]
    ModelOutput(String),

    /// Candle tensor error.
    #[error("tensor error: {0}")]
    Tensor(String),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV test file could not be parsed.
    #[error("CSV error: {0}")]
    Csv(String),

    /// A registry or config file could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl SeqLabelError {
    /// Wrap an I/O failure on `path` as [`SeqLabelError::MissingFile`].
    pub fn missing_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SeqLabelError::MissingFile {
            path: path.into(),
            source,
        }
    }
}

impl From<candle_core::Error> for SeqLabelError {
    fn from(err: candle_core::Error) -> Self {
        SeqLabelError::Tensor(err.to_string())
    }
}

impl From<csv::Error> for SeqLabelError {
    fn from(err: csv::Error) -> Self {
        SeqLabelError::Csv(err.to_string())
    }
}

impl From<serde_json::Error> for SeqLabelError {
    fn from(err: serde_json::Error) -> Self {
        SeqLabelError::Serialization(err.to_string())
    }
}

/// Result type alias for seqlabel operations.
pub type Result<T> = std::result::Result<T, SeqLabelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = SeqLabelError::UnknownLabel {
            label: "B-MISC".into(),
            path: PathBuf::from("train.conll"),
            line: 12,
        };
        assert!(err.to_string().contains("B-MISC"));
        assert!(err.to_string().contains(":12"));

        let err = SeqLabelError::MalformedRow {
            path: PathBuf::from("train.conll"),
            line: 3,
            reason: "expected 3 fields, found 2".into(),
        };
        assert!(err.to_string().contains("expected 3 fields"));
    }

    #[test]
    fn missing_file_keeps_path() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = SeqLabelError::missing_file("nope.conll", io);
        assert!(matches!(err, SeqLabelError::MissingFile { ref path, .. } if path.ends_with("nope.conll")));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SeqLabelError>();
    }
}
