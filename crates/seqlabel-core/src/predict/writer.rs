//! # Prediction Output
//!
//! Maps predicted indices back to strings and writes one tab-separated
//! record per real token: `sentence_id, position, label, token`.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::encode::corpus::EncodedSentence;
use crate::error::{Result, SeqLabelError};
use crate::index::registry::IndexRegistry;
use crate::predict::chunked::{ChunkedPredictor, Prediction};
use crate::predict::model::TaggerModel;

/// One line of prediction output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionRecord {
    pub sentence_id: u64,
    /// Position among the emitted records of the sentence.
    pub position: usize,
    pub label: String,
    pub token: String,
}

impl fmt::Display for PredictionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}",
            self.sentence_id, self.position, self.label, self.token
        )
    }
}

/// Records for the non-padding predictions of one sentence.
pub fn sentence_records(
    registry: &IndexRegistry,
    sentence_id: u64,
    predictions: &[Prediction],
) -> Result<Vec<PredictionRecord>> {
    predictions
        .iter()
        .filter(|p| !p.token.is_padding())
        .enumerate()
        .map(|(position, p)| {
            let token = registry.token_str(p.token).ok_or_else(|| {
                SeqLabelError::ModelOutput(format!("token index {} is not registered", p.token.raw()))
            })?;
            let label = registry.label_str(p.label).ok_or_else(|| {
                SeqLabelError::ModelOutput(format!("label index {} is out of range", p.label))
            })?;
            Ok(PredictionRecord {
                sentence_id,
                position,
                label: label.to_string(),
                token: token.to_string(),
            })
        })
        .collect()
}

/// Streams prediction records to `W`.
pub struct PredictionWriter<'a, W: Write> {
    registry: &'a IndexRegistry,
    out: W,
    written: usize,
}

impl<'a, W: Write> PredictionWriter<'a, W> {
    pub fn new(registry: &'a IndexRegistry, out: W) -> Self {
        Self {
            registry,
            out,
            written: 0,
        }
    }

    /// Write the records of one sentence; returns how many were written.
    pub fn write_sentence(&mut self, sentence_id: u64, predictions: &[Prediction]) -> Result<usize> {
        let records = sentence_records(self.registry, sentence_id, predictions)?;
        for record in &records {
            writeln!(self.out, "{record}")?;
        }
        self.written += records.len();
        Ok(records.len())
    }

    /// Records written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush and hand back the sink.
    pub fn finish(mut self) -> Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

/// Predict every sentence of a CSV test file and write the records to
/// `output`.
///
/// The header row is skipped; column 0 holds an integer sentence id and the
/// last column the raw token. Sentences are processed in ascending id order.
pub fn predict_csv<M: TaggerModel + ?Sized>(
    predictor: &ChunkedPredictor<'_, M>,
    test_csv: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> Result<usize> {
    info!("Begin predict...");
    let sentences = read_csv_sentences(test_csv.as_ref())?;

    let out = BufWriter::new(File::create(output.as_ref())?);
    let mut writer = PredictionWriter::new(predictor.registry(), out);
    for (sentence_id, tokens) in &sentences {
        let predictions = predictor.predict_tokens(tokens)?;
        writer.write_sentence(*sentence_id, &predictions)?;
    }

    let written = writer.written();
    writer.finish()?;
    info!("Finish prediction: {} sentences, {} records", sentences.len(), written);
    Ok(written)
}

/// Predict encoded sentences with all their streams and write the records
/// to `output`, numbering sentences from 0 in the given order.
pub fn predict_corpus<M: TaggerModel + ?Sized>(
    predictor: &ChunkedPredictor<'_, M>,
    sentences: &[EncodedSentence],
    output: impl AsRef<Path>,
) -> Result<usize> {
    info!("Begin predict...");
    let out = BufWriter::new(File::create(output.as_ref())?);
    let mut writer = PredictionWriter::new(predictor.registry(), out);
    for (sentence_id, sentence) in sentences.iter().enumerate() {
        let predictions = predictor.predict_with_features(&sentence.streams())?;
        writer.write_sentence(sentence_id as u64, &predictions)?;
    }

    let written = writer.written();
    writer.finish()?;
    info!("Finish prediction: {} sentences, {} records", sentences.len(), written);
    Ok(written)
}

fn read_csv_sentences(path: &Path) -> Result<BTreeMap<u64, Vec<String>>> {
    let file = File::open(path).map_err(|e| SeqLabelError::missing_file(path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let mut sentences: BTreeMap<u64, Vec<String>> = BTreeMap::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |pos| pos.line() as usize);
        let malformed = |reason: String| SeqLabelError::MalformedRow {
            path: path.to_path_buf(),
            line,
            reason,
        };

        if record.len() < 2 {
            return Err(malformed(format!(
                "expected a sentence id and a token, found {} field(s)",
                record.len()
            )));
        }
        let sentence_id: u64 = record[0]
            .trim()
            .parse()
            .map_err(|_| malformed(format!("sentence id {:?} is not an integer", &record[0])))?;
        let token = &record[record.len() - 1];
        sentences
            .entry(sentence_id)
            .or_default()
            .push(token.to_string());
    }
    Ok(sentences)
}
