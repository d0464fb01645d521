//! End-to-end runs over small corpora written to a temp directory.

use std::fs;
use std::path::{Path, PathBuf};

use candle_core::{Device, Tensor};
use seqlabel_core::{
    ChunkedPredictor, CorpusEncoder, IndexRegistry, LookupTables, PretrainedVectors,
    RegistryBuilder, RegistryConfig, Slot, predict_corpus, predict_csv, validate_predictions,
};

const TRAIN: &str = "Anna\tNNP\tB-PER\nsings\tVBZ\tO\n\nThe\tDT\tO\ncat\tNN\tO\nsaw\tVBD\tO\nRome\tNNP\tB-LOC\n";

fn workdir(test: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("seqlabel-pipeline-{}-{test}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn build_registry(dir: &Path) -> IndexRegistry {
    let train = write(dir, "train.conll", TRAIN);
    RegistryBuilder::new(RegistryConfig::default())
        .with_training([train])
        .build()
        .unwrap()
}

/// Scores label `token % 3 + 1` for real tokens and PADDING elsewhere.
fn token_model(inputs: &[Tensor]) -> seqlabel_core::Result<Tensor> {
    let (batch, width) = inputs[0].dims2()?;
    let tokens = inputs[0].flatten_all()?.to_vec1::<u32>()?;
    let mut scores = vec![0f32; batch * width * 4];
    for (pos, token) in tokens.iter().enumerate() {
        let label = if *token == 0 { 0 } else { (*token % 3 + 1) as usize };
        scores[pos * 4 + label] = 1.0;
    }
    Ok(Tensor::from_vec(scores, (batch, width, 4), &Device::Cpu)?)
}

#[test]
fn test_labeled_corpus_is_left_padded() {
    let dir = workdir("padded");
    let registry = build_registry(&dir);
    assert_eq!(registry.max_sentence_len(), 4);
    assert_eq!(registry.label_dim(), 4);

    let encoder = CorpusEncoder::new(&registry);
    let corpus = encoder
        .load_labeled(dir.join("train.conll"), false)
        .unwrap();

    assert_eq!(corpus.tokens.shape(), (2, 4));
    assert_eq!(corpus.tokens.row(0).unwrap(), &[0, 0, 2, 7]);
    assert_eq!(corpus.tokens.row(1).unwrap(), &[4, 5, 6, 3]);

    let labels = corpus.labels.as_ref().unwrap();
    assert_eq!(labels.shape(), (2, 4));
    assert_eq!(labels.row(0).unwrap(), &[0, 0, 2, 3]);
    assert_eq!(labels.row(1).unwrap(), &[3, 3, 3, 1]);
    assert_eq!(corpus.label_shape(), Some((2, 4, 1)));

    let tensor = corpus.label_tensor(&Device::Cpu).unwrap().unwrap();
    assert_eq!(tensor.dims(), &[2, 4, 1]);
}

#[test]
fn test_feature_tensors_are_named() {
    let dir = workdir("features");
    let registry = build_registry(&dir);
    let corpus = CorpusEncoder::new(&registry)
        .load_labeled(dir.join("train.conll"), true)
        .unwrap();

    assert_eq!(corpus.features.len(), 1);
    assert_eq!(
        corpus.features[0].row(0).unwrap(),
        &[0, 0, registry.feature_slot(0, "NNP").raw(), registry.feature_slot(0, "VBZ").raw()]
    );

    let named = corpus.named_tensors(&Device::Cpu).unwrap();
    let names: Vec<&str> = named.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["tokens", "feature_0", "labels"]);
}

#[test]
fn test_lookup_tables_cover_the_vocabulary() {
    let dir = workdir("tables");
    let registry = build_registry(&dir);
    let config = RegistryConfig::default().with_embedding_dim(4);
    let mut pretrained = PretrainedVectors::new(4);
    pretrained.insert("anna", vec![1.0; 4]).unwrap();
    pretrained.insert("sing", vec![2.0; 4]).unwrap();

    let tables = LookupTables::build(&registry, &config, &pretrained).unwrap();

    assert_eq!(tables.char_vectors.shape(), (registry.vocab_size(), registry.max_token_len()));
    assert!(tables.char_vectors.row(0).unwrap().iter().all(|&c| c == 0));

    let unknown = tables.casing_vectors.row(1).unwrap();
    assert_eq!(unknown[0], 1.0);
    assert_eq!(unknown.iter().filter(|&&v| v != 0.0).count(), 1);
    assert!(tables.casing_vectors.row(0).unwrap().iter().all(|&v| v == 0.0));

    assert_eq!(tables.embedding.len(), registry.vocab_size());
    assert_eq!(tables.embedding.row(2).unwrap(), &[1.0; 4]);
    assert_eq!(tables.embedding.row(7).unwrap(), &[2.0; 4]);
    assert_eq!(tables.embedding_report.found_lemmatized, 1);
    assert_eq!(tables.embedding_report.not_in_pretrained, 6);
}

#[test]
fn test_registry_survives_json_round_trip() {
    let dir = workdir("json");
    let registry = build_registry(&dir);
    let path = dir.join("registry.json");
    registry.save(&path).unwrap();
    let loaded = IndexRegistry::load(&path).unwrap();

    assert_eq!(loaded.token_slot("Rome"), Slot::Real(3));
    assert_eq!(loaded.token_slot("Paris"), Slot::Unknown);
    assert_eq!(loaded.label_index("B-PER"), Some(2));
    assert_eq!(loaded.max_sentence_len(), registry.max_sentence_len());
}

#[test]
fn test_predict_csv_then_validate() {
    let dir = workdir("csv");
    let registry = build_registry(&dir);
    let test_csv = write(
        &dir,
        "test.csv",
        "sentence_id,token_id,token\n\
         0,0,Anna\n0,1,sings\n\
         1,0,The\n1,1,cat\n1,2,saw\n1,3,Anna\n1,4,in\n1,5,Rome\n",
    );
    let output = dir.join("predictions.tsv");

    let model = token_model;
    let predictor = ChunkedPredictor::new(&registry, &model);
    assert_eq!(predict_csv(&predictor, &test_csv, &output).unwrap(), 8);

    let lines: Vec<String> = fs::read_to_string(&output)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect();
    assert_eq!(lines[0], "0\t0\tO\tAnna");
    assert_eq!(lines[6], "1\t4\tB-PER\tUNKNOWN");
    assert_eq!(lines[7], "1\t5\tB-LOC\tRome");

    // "in" is not in the vocabulary and is written as UNKNOWN.
    assert_eq!(validate_predictions(&output, &test_csv).unwrap(), 7);
}

#[test]
fn test_predict_unlabeled_corpus_with_features() {
    let dir = workdir("unlabeled");
    let registry = build_registry(&dir);
    let test = write(&dir, "test.conll", "The\tDT\ncat\tNN\nsaw\tVBD\nAnna\tNNP\nsings\tVBZ\n");
    let sentences = CorpusEncoder::new(&registry)
        .read_sentences(&test, seqlabel_core::LoadMode::Unlabeled, true)
        .unwrap();
    assert_eq!(sentences.len(), 1);
    assert_eq!(sentences[0].features.len(), 1);

    let model = token_model;
    let predictor = ChunkedPredictor::new(&registry, &model);
    let output = dir.join("unlabeled.tsv");
    assert_eq!(predict_corpus(&predictor, &sentences, &output).unwrap(), 5);

    let text = fs::read_to_string(&output).unwrap();
    let tokens: Vec<&str> = text.lines().map(|l| l.rsplit('\t').next().unwrap()).collect();
    assert_eq!(tokens, vec!["The", "cat", "saw", "Anna", "sings"]);
}
