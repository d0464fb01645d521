pub mod length;
pub mod registry;
pub mod vocab;

pub use length::{LengthDistribution, select_length};
pub use registry::{
    IndexRegistry, RegistryBuilder, assign_feature_label_indices, assign_token_indices,
};
pub use vocab::Vocabulary;
