use std::fmt;

use serde::{Deserialize, Serialize};

/// Name stored at index 0 of every vocabulary.
pub const PADDING_TOKEN: &str = "PADDING";

/// Name stored at index 1 of token and feature vocabularies.
pub const UNKNOWN_TOKEN: &str = "UNKNOWN";

/// A looked-up token or feature value.
///
/// Index 0 and 1 are reserved in every token and feature vocabulary. The raw
/// integer form only exists at the tensor boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Slot {
    /// Empty position introduced by length normalization.
    Padding,
    /// A real input value missing from the vocabulary.
    Unknown,
    /// A vocabulary entry, always `>= Slot::FIRST_REAL`.
    Real(u32),
}

impl Slot {
    /// Raw index of [`Slot::Padding`].
    pub const PADDING_INDEX: u32 = 0;
    /// Raw index of [`Slot::Unknown`].
    pub const UNKNOWN_INDEX: u32 = 1;
    /// Smallest raw index assigned to a real value.
    pub const FIRST_REAL: u32 = 2;

    /// Decode a raw tensor value.
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            Self::PADDING_INDEX => Slot::Padding,
            Self::UNKNOWN_INDEX => Slot::Unknown,
            n => Slot::Real(n),
        }
    }

    /// Encode for a tensor.
    pub fn raw(self) -> u32 {
        match self {
            Slot::Padding => Self::PADDING_INDEX,
            Slot::Unknown => Self::UNKNOWN_INDEX,
            Slot::Real(n) => n,
        }
    }

    pub fn is_padding(self) -> bool {
        matches!(self, Slot::Padding)
    }
}

impl From<Slot> for u32 {
    fn from(slot: Slot) -> Self {
        slot.raw()
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Padding => write!(f, "{PADDING_TOKEN}"),
            Slot::Unknown => write!(f, "{UNKNOWN_TOKEN}"),
            Slot::Real(n) => write!(f, "#{n}"),
        }
    }
}
