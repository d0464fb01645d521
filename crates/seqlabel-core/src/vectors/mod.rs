pub mod casing;
pub mod chars;
pub mod embedding;

pub use casing::{Casing, CasingClassifier, CasingTable, WordShapeCasing, build_casing_vectors};
pub use chars::{CharIndex, DEFAULT_ALPHABET, build_char_vectors};
pub use embedding::{
    EmbeddingMatrix, EmbeddingReport, Lemmatizer, PretrainedVectors, SuffixLemmatizer,
    build_matrix,
};

use oorandom::Rand32;

use crate::config::RegistryConfig;
use crate::encode::padding::PaddedBatch;
use crate::error::Result;
use crate::index::registry::IndexRegistry;

/// Per-token-index tables fed to the model next to the index tensors.
#[derive(Debug, Clone)]
pub struct LookupTables {
    pub char_vectors: PaddedBatch,
    pub casing_vectors: CasingTable,
    pub embedding: EmbeddingMatrix,
    pub embedding_report: EmbeddingReport,
}

impl LookupTables {
    /// Build every table for `registry` with the default character index,
    /// casing classifier and lemmatizer.
    pub fn build(
        registry: &IndexRegistry,
        config: &RegistryConfig,
        pretrained: &PretrainedVectors,
    ) -> Result<Self> {
        Self::build_with(
            registry,
            config,
            pretrained,
            &CharIndex::default(),
            &WordShapeCasing,
            &SuffixLemmatizer,
        )
    }

    /// Build every table with caller supplied collaborators.
    pub fn build_with<C, L>(
        registry: &IndexRegistry,
        config: &RegistryConfig,
        pretrained: &PretrainedVectors,
        char_index: &CharIndex,
        casing: &C,
        lemmatizer: &L,
    ) -> Result<Self>
    where
        C: CasingClassifier + ?Sized,
        L: Lemmatizer + ?Sized,
    {
        config.validate()?;
        let tokens = registry.tokens();
        let char_vectors = build_char_vectors(tokens, char_index, registry.max_token_len());
        let mut rng = Rand32::new(config.seed);
        let (embedding, embedding_report) =
            build_matrix(tokens, pretrained, lemmatizer, config.embedding_dim, &mut rng)?;
        let casing_vectors = build_casing_vectors(tokens, casing)?;

        Ok(Self {
            char_vectors,
            casing_vectors,
            embedding,
            embedding_report,
        })
    }
}
