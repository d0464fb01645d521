//! # Prediction Validation
//!
//! Cross-checks a prediction file against the test CSV it was produced from.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::info;

use crate::error::{Result, SeqLabelError};
use crate::types::UNKNOWN_TOKEN;

/// Pair prediction records with the CSV rows (header skipped) in order.
///
/// For every record whose token is not `UNKNOWN`, sentence id, position and
/// token must equal CSV column 0, column 1 and the last column. Returns the
/// number of records compared.
pub fn validate_predictions(
    predictions: impl AsRef<Path>,
    original_csv: impl AsRef<Path>,
) -> Result<usize> {
    let predictions = predictions.as_ref();
    let original_csv = original_csv.as_ref();

    let pred_file =
        File::open(predictions).map_err(|e| SeqLabelError::missing_file(predictions, e))?;
    let csv_file =
        File::open(original_csv).map_err(|e| SeqLabelError::missing_file(original_csv, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_file);

    let mut compared = 0;
    for (idx, (line, record)) in BufReader::new(pred_file)
        .lines()
        .zip(reader.records())
        .enumerate()
    {
        let line = line?;
        let record = record?;
        let found: Vec<&str> = line.trim_end_matches(['\r', '\n']).split('\t').collect();
        if found.len() < 4 {
            return Err(SeqLabelError::MalformedRow {
                path: predictions.to_path_buf(),
                line: idx + 1,
                reason: format!("expected 4 tab-separated fields, found {}", found.len()),
            });
        }
        if found[3] == UNKNOWN_TOKEN {
            continue;
        }

        let expected = [
            record.get(0).unwrap_or_default(),
            record.get(1).unwrap_or_default(),
            record.iter().last().unwrap_or_default(),
        ];
        let actual = [found[0], found[1], found[3]];
        if expected != actual {
            return Err(SeqLabelError::ValidationMismatch {
                line: idx + 1,
                expected: expected.join("\t"),
                found: actual.join("\t"),
            });
        }
        compared += 1;
    }

    info!("Validated {} prediction records", compared);
    Ok(compared)
}
