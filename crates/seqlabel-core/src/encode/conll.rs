//! # CoNLL Reader
//!
//! Reads tab-separated, token-per-line corpora. A blank line closes a
//! sentence and the end of the file closes the last one.

use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};

use crate::error::{Result, SeqLabelError};

/// Whether the last field of every row is a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// `token [features...] tag`
    Labeled,
    /// `token [features...]`
    Unlabeled,
}

impl LoadMode {
    /// Fields per row that are not features.
    pub fn fixed_fields(self) -> usize {
        match self {
            LoadMode::Labeled => 2,
            LoadMode::Unlabeled => 1,
        }
    }
}

/// One non-blank line of a corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConllRow {
    /// 1-based line number in the source file.
    pub line: usize,
    pub fields: Vec<String>,
}

impl ConllRow {
    pub fn token(&self) -> &str {
        &self.fields[0]
    }

    /// Last field, when the row has more than one.
    pub fn tag(&self) -> Option<&str> {
        match self.fields.len() {
            0 | 1 => None,
            n => Some(&self.fields[n - 1]),
        }
    }

    /// Fields between the token and, in labeled mode, the tag.
    pub fn features(&self, mode: LoadMode) -> &[String] {
        let n = self.fields.len();
        match mode {
            LoadMode::Labeled if n >= 2 => &self.fields[1..n - 1],
            LoadMode::Labeled => &[],
            LoadMode::Unlabeled => &self.fields[1..],
        }
    }
}

/// A parsed corpus file.
#[derive(Debug, Clone)]
pub struct ConllCorpus {
    path: PathBuf,
    sentences: Vec<Vec<ConllRow>>,
}

impl ConllCorpus {
    /// Read and split `path` into sentences.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| SeqLabelError::missing_file(path, e))?;
        Self::parse(path, BufReader::new(file))
    }

    /// Split an already opened corpus; `path` is only used in errors.
    pub fn parse<R: BufRead>(path: impl Into<PathBuf>, reader: R) -> Result<Self> {
        let path = path.into();
        let mut sentences = Vec::new();
        let mut current = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| match e.kind() {
                ErrorKind::InvalidData => SeqLabelError::MalformedRow {
                    path: path.clone(),
                    line: idx + 1,
                    reason: e.to_string(),
                },
                _ => SeqLabelError::Io(e),
            })?;
            let line = line.strip_suffix('\r').unwrap_or(&line);

            if line.is_empty() {
                // Consecutive blank lines do not produce empty sentences
                if !current.is_empty() {
                    sentences.push(std::mem::take(&mut current));
                }
                continue;
            }

            current.push(ConllRow {
                line: idx + 1,
                fields: line.split('\t').map(str::to_string).collect(),
            });
        }

        if !current.is_empty() {
            sentences.push(current);
        }

        Ok(Self { path, sentences })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sentences(&self) -> &[Vec<ConllRow>] {
        &self.sentences
    }

    /// Number of sentences.
    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    /// Every row of every sentence, in file order.
    pub fn rows(&self) -> impl Iterator<Item = &ConllRow> {
        self.sentences.iter().flatten()
    }

    pub(crate) fn malformed(&self, row: &ConllRow, reason: impl Into<String>) -> SeqLabelError {
        SeqLabelError::MalformedRow {
            path: self.path.clone(),
            line: row.line,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> ConllCorpus {
        ConllCorpus::parse("mem.conll", text.as_bytes()).unwrap()
    }

    #[test]
    fn test_sentences_split_on_blank_lines() {
        let corpus = parse("EU\tNNP\tB-ORG\nrejects\tVBZ\tO\n\nPeter\tNNP\tB-PER\n");
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.sentences()[0].len(), 2);
        assert_eq!(corpus.sentences()[1][0].token(), "Peter");
        assert_eq!(corpus.sentences()[1][0].line, 4);
    }

    #[test]
    fn test_trailing_and_repeated_blank_lines() {
        let corpus = parse("a\tO\n\n\n\nb\tO\n\n");
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.rows().count(), 2);
    }

    #[test]
    fn test_crlf_is_stripped() {
        let corpus = parse("a\tO\r\n\r\nb\tB-LOC\r\n");
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.sentences()[1][0].tag(), Some("B-LOC"));
    }

    #[test]
    fn test_feature_slices() {
        let corpus = parse("EU\tNNP\tI-NP\tB-ORG\n");
        let row = &corpus.sentences()[0][0];
        assert_eq!(row.features(LoadMode::Labeled), ["NNP", "I-NP"]);
        assert_eq!(row.features(LoadMode::Unlabeled), ["NNP", "I-NP", "B-ORG"]);
        assert_eq!(row.tag(), Some("B-ORG"));
    }

    #[test]
    fn test_single_field_row() {
        let corpus = parse("alone\n");
        let row = &corpus.sentences()[0][0];
        assert_eq!(row.tag(), None);
        assert!(row.features(LoadMode::Labeled).is_empty());
    }

    #[test]
    fn test_invalid_utf8_names_the_line() {
        let bytes: &[u8] = b"a\tO\nb\xff\tO\n";
        let err = ConllCorpus::parse("bad.conll", bytes).unwrap_err();
        assert!(matches!(err, SeqLabelError::MalformedRow { line: 2, .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = ConllCorpus::read("/definitely/not/here.conll").unwrap_err();
        assert!(matches!(err, SeqLabelError::MissingFile { .. }));
    }
}
