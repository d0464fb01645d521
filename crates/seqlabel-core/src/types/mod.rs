pub mod slot;

pub use slot::{PADDING_TOKEN, Slot, UNKNOWN_TOKEN};
