//! # Casing Vectors
//!
//! Coarse capitalization classes encoded as one-hot rows per token index.

use candle_core::{Device, Tensor};
use tracing::debug;

use crate::error::{Result, SeqLabelError};
use crate::index::vocab::Vocabulary;
use crate::types::Slot;

/// Classifies a token into one of `num_classes()` casing classes.
///
/// Class 0 is reserved: it marks the `UNKNOWN` token and must never be
/// returned for real tokens.
pub trait CasingClassifier {
    fn num_classes(&self) -> usize;

    fn classify(&self, token: &str) -> usize;

    /// One-hot row for `token`; all zeros when the class is out of range.
    fn one_hot(&self, token: &str) -> Vec<f32> {
        let mut row = vec![0.0; self.num_classes()];
        if let Some(slot) = row.get_mut(self.classify(token)) {
            *slot = 1.0;
        }
        row
    }
}

/// Casing classes of [`WordShapeCasing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Casing {
    /// Slot of the `UNKNOWN` token.
    Reserved,
    Numeric,
    MainlyNumeric,
    AllLower,
    AllUpper,
    InitialUpper,
    ContainsDigit,
    Other,
}

impl Casing {
    pub const NUM_CLASSES: usize = 8;

    pub fn all() -> &'static [Casing] {
        &[
            Casing::Reserved,
            Casing::Numeric,
            Casing::MainlyNumeric,
            Casing::AllLower,
            Casing::AllUpper,
            Casing::InitialUpper,
            Casing::ContainsDigit,
            Casing::Other,
        ]
    }

    pub fn index(&self) -> usize {
        match self {
            Casing::Reserved => 0,
            Casing::Numeric => 1,
            Casing::MainlyNumeric => 2,
            Casing::AllLower => 3,
            Casing::AllUpper => 4,
            Casing::InitialUpper => 5,
            Casing::ContainsDigit => 6,
            Casing::Other => 7,
        }
    }
}

/// Digit share and letter case based casing classifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordShapeCasing;

impl WordShapeCasing {
    pub fn casing(&self, token: &str) -> Casing {
        let len = token.chars().count();
        if len == 0 {
            return Casing::Other;
        }

        let digits = token.chars().filter(|c| c.is_numeric()).count();
        let has_lower = token.chars().any(char::is_lowercase);
        let has_upper = token.chars().any(char::is_uppercase);

        if digits == len {
            Casing::Numeric
        } else if digits as f64 / len as f64 > 0.5 {
            Casing::MainlyNumeric
        } else if has_lower && !has_upper {
            Casing::AllLower
        } else if has_upper && !has_lower {
            Casing::AllUpper
        } else if token.chars().next().is_some_and(char::is_uppercase) {
            Casing::InitialUpper
        } else if digits > 0 {
            Casing::ContainsDigit
        } else {
            Casing::Other
        }
    }
}

impl CasingClassifier for WordShapeCasing {
    fn num_classes(&self) -> usize {
        Casing::NUM_CLASSES
    }

    fn classify(&self, token: &str) -> usize {
        self.casing(token).index()
    }
}

/// One-hot casing row per token index.
#[derive(Debug, Clone, PartialEq)]
pub struct CasingTable {
    width: usize,
    rows: Vec<Vec<f32>>,
}

impl CasingTable {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn rows(&self) -> &[Vec<f32>] {
        &self.rows
    }

    pub fn row(&self, idx: usize) -> Option<&[f32]> {
        self.rows.get(idx).map(Vec::as_slice)
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.width)
    }

    /// `(vocab, classes)` tensor of `f32`.
    pub fn to_tensor(&self, device: &Device) -> Result<Tensor> {
        let flat: Vec<f32> = self.rows.iter().flatten().copied().collect();
        Ok(Tensor::from_vec(flat, self.shape(), device)?)
    }
}

/// Casing rows for every token index: `PADDING` gets all zeros, `UNKNOWN`
/// only the reserved slot 0, real tokens their classified class.
///
/// Fails with [`SeqLabelError::InvalidConfig`] when the classifier has no
/// classes or puts a token outside `1..num_classes()`.
pub fn build_casing_vectors<C: CasingClassifier + ?Sized>(
    tokens: &Vocabulary,
    classifier: &C,
) -> Result<CasingTable> {
    let width = classifier.num_classes();
    if width == 0 {
        return Err(SeqLabelError::InvalidConfig(
            "casing classifier must have at least the reserved class".into(),
        ));
    }

    let mut rows = Vec::with_capacity(tokens.len());
    for (idx, token) in tokens.iter() {
        let mut row = vec![0.0; width];
        match Slot::from_raw(idx) {
            Slot::Real(_) => {
                let class = classifier.classify(token);
                if class == 0 || class >= width {
                    return Err(SeqLabelError::InvalidConfig(format!(
                        "casing class {class} of {token:?} is outside 1..{width}"
                    )));
                }
                row[class] = 1.0;
            }
            Slot::Unknown => row[0] = 1.0,
            Slot::Padding => {}
        }
        rows.push(row);
    }

    let table = CasingTable { width, rows };
    debug!("Casing vector table: {:?}", table.shape());
    Ok(table)
}
