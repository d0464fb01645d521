//! # Index Registry
//!
//! Owns every string ↔ index map plus the two padding lengths. Built once
//! by [`RegistryBuilder::build`] and read-only afterwards.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::RegistryConfig;
use crate::encode::conll::{ConllCorpus, LoadMode};
use crate::error::{Result, SeqLabelError};
use crate::index::length::LengthDistribution;
use crate::index::vocab::Vocabulary;
use crate::types::Slot;

/// Token, feature and label indices shared by encoding and prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRegistry {
    tokens: Vocabulary,
    features: Vec<Vocabulary>,
    labels: Vocabulary,
    max_token_len: usize,
    max_sentence_len: usize,
}

impl IndexRegistry {
    /// Assemble a registry from prebuilt parts.
    ///
    /// Both lengths must be positive, token and feature vocabularies must
    /// reserve `UNKNOWN` and the label vocabulary must not.
    pub fn from_parts(
        tokens: Vocabulary,
        features: Vec<Vocabulary>,
        labels: Vocabulary,
        max_token_len: usize,
        max_sentence_len: usize,
    ) -> Result<Self> {
        if max_token_len == 0 || max_sentence_len == 0 {
            return Err(SeqLabelError::InvalidConfig(format!(
                "padding lengths must be positive (token {max_token_len}, sentence {max_sentence_len})"
            )));
        }
        if !tokens.reserves_unknown() || features.iter().any(|f| !f.reserves_unknown()) {
            return Err(SeqLabelError::InvalidConfig(
                "token and feature vocabularies must reserve UNKNOWN".into(),
            ));
        }
        if labels.reserves_unknown() {
            return Err(SeqLabelError::InvalidConfig(
                "label vocabulary must not reserve UNKNOWN".into(),
            ));
        }
        Ok(Self {
            tokens,
            features,
            labels,
            max_token_len,
            max_sentence_len,
        })
    }

    /// Load a registry written by [`IndexRegistry::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| SeqLabelError::missing_file(path, e))?;
        let registry: Self = serde_json::from_str(&content)?;
        // Re-check the invariants a hand-edited file could break
        Self::from_parts(
            registry.tokens,
            registry.features,
            registry.labels,
            registry.max_token_len,
            registry.max_sentence_len,
        )
    }

    /// Write the registry as JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn tokens(&self) -> &Vocabulary {
        &self.tokens
    }

    pub fn labels(&self) -> &Vocabulary {
        &self.labels
    }

    pub fn features(&self) -> &[Vocabulary] {
        &self.features
    }

    pub fn num_feature_columns(&self) -> usize {
        self.features.len()
    }

    /// Number of token indices, reserved ones included.
    pub fn vocab_size(&self) -> usize {
        self.tokens.len()
    }

    /// Number of label indices, `PADDING` included.
    pub fn label_dim(&self) -> usize {
        self.labels.len()
    }

    pub fn max_token_len(&self) -> usize {
        self.max_token_len
    }

    pub fn max_sentence_len(&self) -> usize {
        self.max_sentence_len
    }

    /// Look up a token, degrading to [`Slot::Unknown`].
    pub fn token_slot(&self, token: &str) -> Slot {
        self.tokens.slot(token)
    }

    /// Look up a value of feature column `column`, degrading to
    /// [`Slot::Unknown`]. Columns past the registered ones are all unknown.
    pub fn feature_slot(&self, column: usize, value: &str) -> Slot {
        self.features
            .get(column)
            .map_or(Slot::Unknown, |vocab| vocab.slot(value))
    }

    /// Index of a registered tag. Tags have no `UNKNOWN` fallback.
    pub fn label_index(&self, label: &str) -> Option<u32> {
        self.labels.get(label)
    }

    /// String form of a token slot.
    pub fn token_str(&self, slot: Slot) -> Option<&str> {
        self.tokens.value(slot.raw())
    }

    /// String form of a label index.
    pub fn label_str(&self, index: u32) -> Option<&str> {
        self.labels.value(index)
    }
}

/// Builds an [`IndexRegistry`] from training and unlabeled corpora.
///
/// Tokens and sentence lengths come from every corpus; features and labels
/// only from the training corpora.
#[derive(Debug, Clone, Default)]
pub struct RegistryBuilder {
    config: RegistryConfig,
    training: Vec<PathBuf>,
    unlabeled: Vec<PathBuf>,
}

impl RegistryBuilder {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            training: Vec::new(),
            unlabeled: Vec::new(),
        }
    }

    /// Add labeled training corpora.
    pub fn with_training<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.training.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Add corpora that only contribute tokens and sentence lengths.
    pub fn with_unlabeled<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.unlabeled.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Read every corpus once and derive all indices and lengths.
    pub fn build(self) -> Result<IndexRegistry> {
        self.config.validate()?;
        if self.training.is_empty() {
            return Err(SeqLabelError::InvalidConfig(
                "at least one training corpus is required".into(),
            ));
        }

        let training = read_all(&self.training)?;
        let unlabeled = read_all(&self.unlabeled)?;
        let all: Vec<&ConllCorpus> = training.iter().chain(unlabeled.iter()).collect();

        let tokens = token_vocabulary(all.iter().copied(), self.config.freq_cutoff);
        let (features, labels) = feature_label_vocabularies(&training)?;

        let max_token_len = LengthDistribution::of_token_lengths(&tokens)
            .select(self.config.token_len_coverage)
            .max(1);
        info!("Max token length: {}", max_token_len);

        let max_sentence_len = all
            .iter()
            .flat_map(|corpus| corpus.sentences())
            .map(Vec::len)
            .collect::<LengthDistribution>()
            .select(self.config.sentence_len_coverage)
            .max(1);
        info!("Max sentence length: {}", max_sentence_len);

        info!("Vocabulary size: {}", tokens.len());
        info!("Label dim: {}", labels.len());
        debug!("Feature columns: {}", features.len());

        IndexRegistry::from_parts(tokens, features, labels, max_token_len, max_sentence_len)
    }
}

/// Count tokens over `corpus_paths` and index those seen at least
/// `freq_cutoff` times, in ascending string order, starting at 2.
pub fn assign_token_indices<P: AsRef<Path>>(
    corpus_paths: &[P],
    freq_cutoff: usize,
) -> Result<Vocabulary> {
    let corpora = read_all(corpus_paths)?;
    Ok(token_vocabulary(corpora.iter(), freq_cutoff))
}

/// Build one vocabulary per feature column and the label vocabulary from
/// labeled `corpus_paths`.
pub fn assign_feature_label_indices<P: AsRef<Path>>(
    corpus_paths: &[P],
) -> Result<(Vec<Vocabulary>, Vocabulary)> {
    let corpora = read_all(corpus_paths)?;
    feature_label_vocabularies(&corpora)
}

fn read_all<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<ConllCorpus>> {
    paths.iter().map(|path| ConllCorpus::read(path)).collect()
}

fn token_vocabulary<'a>(
    corpora: impl Iterator<Item = &'a ConllCorpus>,
    freq_cutoff: usize,
) -> Vocabulary {
    // BTreeMap iteration gives the ascending order the indices depend on
    let mut frequency: BTreeMap<&str, usize> = BTreeMap::new();
    for row in corpora.flat_map(ConllCorpus::rows) {
        *frequency.entry(row.token()).or_insert(0) += 1;
    }

    let kept = frequency
        .into_iter()
        .filter(|&(_, count)| count >= freq_cutoff)
        .map(|(token, _)| token);
    Vocabulary::from_values(kept, true)
}

fn feature_label_vocabularies(corpora: &[ConllCorpus]) -> Result<(Vec<Vocabulary>, Vocabulary)> {
    let mut expected_fields = None;
    let mut feature_values: Vec<BTreeSet<&str>> = Vec::new();
    let mut label_values: BTreeSet<&str> = BTreeSet::new();

    for corpus in corpora {
        for row in corpus.rows() {
            let found = row.fields.len();
            if found < LoadMode::Labeled.fixed_fields() {
                return Err(corpus.malformed(row, "labeled row needs a token and a tag"));
            }
            let expected = *expected_fields.get_or_insert(found);
            if found != expected {
                return Err(corpus.malformed(
                    row,
                    format!("expected {expected} fields, found {found}"),
                ));
            }

            let features = row.features(LoadMode::Labeled);
            if feature_values.len() < features.len() {
                feature_values.resize_with(features.len(), BTreeSet::new);
            }
            for (column, value) in features.iter().enumerate() {
                feature_values[column].insert(value.as_str());
            }
            if let Some(tag) = row.tag() {
                label_values.insert(tag);
            }
        }
    }

    let features = feature_values
        .into_iter()
        .map(|values| Vocabulary::from_values(values, true))
        .collect();
    let labels = Vocabulary::from_values(label_values, false);
    Ok((features, labels))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn fixture(name: &str, content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("seqlabel-registry-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    const TRAIN: &str = "the\tDT\tO\ncat\tNN\tB-ANI\nsat\tVBD\tO\n\nthe\tDT\tO\ndog\tNN\tB-ANI\n";

    #[test]
    fn test_token_indices_sorted_with_cutoff() {
        let path = fixture("tokens.conll", TRAIN);
        let vocab = assign_token_indices(&[&path], 1).unwrap();
        let real: Vec<_> = vocab.iter_real().collect();
        assert_eq!(real, vec![(2, "cat"), (3, "dog"), (4, "sat"), (5, "the")]);

        let vocab = assign_token_indices(&[&path], 2).unwrap();
        assert_eq!(vocab.get("the"), Some(2));
        assert_eq!(vocab.slot("cat"), Slot::Unknown);
    }

    #[test]
    fn test_feature_and_label_indices() {
        let path = fixture("features.conll", TRAIN);
        let (features, labels) = assign_feature_label_indices(&[&path]).unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].get("DT"), Some(2));
        assert_eq!(features[0].get("NN"), Some(3));
        assert_eq!(features[0].get("VBD"), Some(4));
        assert_eq!(labels.value(0), Some("PADDING"));
        assert_eq!(labels.get("B-ANI"), Some(1));
        assert_eq!(labels.get("O"), Some(2));
        assert_eq!(labels.get("UNKNOWN"), None);
    }

    #[test]
    fn test_reserved_names_in_corpus_get_real_indices() {
        let path = fixture("reserved.conll", "PADDING\tO\nUNKNOWN\tO\nword\tPADDING\n");
        let registry = RegistryBuilder::new(RegistryConfig::default())
            .with_training([&path])
            .build()
            .unwrap();

        assert_eq!(registry.token_slot("PADDING"), Slot::Real(2));
        assert_eq!(registry.token_slot("UNKNOWN"), Slot::Real(3));
        assert_eq!(registry.token_slot("word"), Slot::Real(4));
        assert_eq!(registry.token_str(Slot::Padding), Some("PADDING"));
        assert_eq!(registry.token_str(Slot::Real(2)), Some("PADDING"));

        assert_eq!(registry.label_index("O"), Some(1));
        assert_eq!(registry.label_index("PADDING"), Some(2));
        assert_eq!(registry.label_dim(), 3);
    }

    #[test]
    fn test_inconsistent_columns_are_malformed() {
        let path = fixture("ragged.conll", "a\tX\tO\nb\tO\n");
        let err = assign_feature_label_indices(&[&path]).unwrap_err();
        assert!(matches!(err, SeqLabelError::MalformedRow { line: 2, .. }));

        let path = fixture("untagged.conll", "a\n");
        let err = assign_feature_label_indices(&[&path]).unwrap_err();
        assert!(matches!(err, SeqLabelError::MalformedRow { line: 1, .. }));
    }

    #[test]
    fn test_missing_corpus() {
        let err = assign_token_indices(&["/no/such/corpus.conll"], 1).unwrap_err();
        assert!(matches!(err, SeqLabelError::MissingFile { .. }));
    }

    #[test]
    fn test_builder_uses_unlabeled_tokens_and_lengths() {
        let train = fixture("build-train.conll", TRAIN);
        let test = fixture("build-test.conll", "a\tDT\nb\tNN\nc\tNN\nd\tNN\ne\tNN\n");
        let registry = RegistryBuilder::new(RegistryConfig::default().with_sentence_len_coverage(1.0))
            .with_training([&train])
            .with_unlabeled([&test])
            .build()
            .unwrap();

        assert_eq!(registry.token_slot("e"), Slot::Real(8));
        assert_eq!(registry.token_slot("zebra"), Slot::Unknown);
        assert_eq!(registry.max_sentence_len(), 5);
        assert_eq!(registry.max_token_len(), 3);
        assert_eq!(registry.num_feature_columns(), 1);
        assert_eq!(registry.label_dim(), 3);
    }

    #[test]
    fn test_builder_requires_training() {
        let err = RegistryBuilder::new(RegistryConfig::default()).build().unwrap_err();
        assert!(matches!(err, SeqLabelError::InvalidConfig(_)));
    }

    #[test]
    fn test_save_and_load() {
        let train = fixture("save-train.conll", TRAIN);
        let registry = RegistryBuilder::new(RegistryConfig::default())
            .with_training([&train])
            .build()
            .unwrap();
        let out = fixture("registry.json", "");
        registry.save(&out).unwrap();
        let loaded = IndexRegistry::load(&out).unwrap();
        assert_eq!(loaded, registry);
        assert_eq!(loaded.token_str(Slot::Unknown), Some("UNKNOWN"));
    }

    #[test]
    fn test_from_parts_rejects_bad_reservations() {
        let tokens = Vocabulary::with_unknown();
        let err = IndexRegistry::from_parts(
            tokens.clone(),
            vec![],
            Vocabulary::with_unknown(),
            4,
            4,
        )
        .unwrap_err();
        assert!(matches!(err, SeqLabelError::InvalidConfig(_)));
        assert!(IndexRegistry::from_parts(tokens, vec![], Vocabulary::padding_only(), 0, 4).is_err());
    }
}
