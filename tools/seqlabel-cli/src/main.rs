//! Seqlabel command line
//!
//! Builds index registries from CoNLL corpora, encodes corpora into padded
//! tensors and checks prediction files against their test CSV.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use candle_core::Device;
use clap::{Args, Parser, Subcommand};
use seqlabel_core::{
    CorpusEncoder, IndexRegistry, RegistryBuilder, RegistryConfig, validate_predictions,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// CLI arguments
#[derive(Parser)]
#[command(name = "seqlabel")]
#[command(about = "Prepare CoNLL corpora for sequence labeling models")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index registry and report its dimensions
    Inspect {
        /// Labeled training corpora
        #[arg(long, required = true, num_args = 1..)]
        train: Vec<PathBuf>,

        /// Unlabeled test corpus contributing tokens and sentence lengths
        #[arg(long)]
        test: Option<PathBuf>,

        #[command(flatten)]
        overrides: ConfigArgs,

        /// Write the registry as JSON
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Encode a corpus into padded tensors
    Encode {
        /// Registry JSON written by `inspect --save`
        #[arg(long, env = "SEQLABEL_REGISTRY")]
        registry: PathBuf,

        /// CoNLL corpus to encode
        #[arg(long)]
        input: PathBuf,

        /// Encode the feature columns too
        #[arg(long)]
        features: bool,

        /// The corpus has no tag column
        #[arg(long)]
        unlabeled: bool,

        /// Output safetensors file
        #[arg(long)]
        output: PathBuf,
    },
    /// Check a prediction file against its test CSV
    Validate {
        /// Tab-separated prediction records
        #[arg(long)]
        predictions: PathBuf,

        /// Original test CSV
        #[arg(long)]
        test: PathBuf,
    },
}

/// Registry settings; flags take precedence over the JSON file.
#[derive(Args)]
struct ConfigArgs {
    /// JSON file with registry settings
    #[arg(long, env = "SEQLABEL_CONFIG")]
    config: Option<PathBuf>,

    /// Minimum corpus frequency for a token to be indexed
    #[arg(long)]
    freq_cutoff: Option<usize>,

    /// Fraction of token lengths the character width must cover
    #[arg(long)]
    token_len_coverage: Option<f64>,

    /// Fraction of sentence lengths the model width must cover
    #[arg(long)]
    sentence_len_coverage: Option<f64>,
}

impl ConfigArgs {
    fn resolve(&self) -> Result<RegistryConfig> {
        let mut config = match &self.config {
            Some(path) => RegistryConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => RegistryConfig::default(),
        };
        if let Some(cutoff) = self.freq_cutoff {
            config = config.with_freq_cutoff(cutoff);
        }
        if let Some(ratio) = self.token_len_coverage {
            config = config.with_token_len_coverage(ratio);
        }
        if let Some(ratio) = self.sentence_len_coverage {
            config = config.with_sentence_len_coverage(ratio);
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Inspect {
            train,
            test,
            overrides,
            save,
        } => inspect(train, test, &overrides, save),
        Commands::Encode {
            registry,
            input,
            features,
            unlabeled,
            output,
        } => encode(registry, input, features, unlabeled, output),
        Commands::Validate { predictions, test } => {
            let compared = validate_predictions(&predictions, &test)
                .with_context(|| format!("Validation of {} failed", predictions.display()))?;
            println!("{compared} predictions match {}", test.display());
            Ok(())
        }
    }
}

fn inspect(
    train: Vec<PathBuf>,
    test: Option<PathBuf>,
    overrides: &ConfigArgs,
    save: Option<PathBuf>,
) -> Result<()> {
    let config = overrides.resolve()?;
    let registry = RegistryBuilder::new(config)
        .with_training(train)
        .with_unlabeled(test)
        .build()
        .context("Failed to build index registry")?;

    println!("vocabulary size:   {}", registry.vocab_size());
    println!("label dimension:   {}", registry.label_dim());
    println!("feature columns:   {}", registry.num_feature_columns());
    println!("max token length:  {}", registry.max_token_len());
    println!("max sentence len:  {}", registry.max_sentence_len());

    if let Some(path) = save {
        registry
            .save(&path)
            .with_context(|| format!("Failed to write registry {}", path.display()))?;
        info!("Saved registry to {}", path.display());
    }
    Ok(())
}

fn encode(
    registry: PathBuf,
    input: PathBuf,
    features: bool,
    unlabeled: bool,
    output: PathBuf,
) -> Result<()> {
    let registry = IndexRegistry::load(&registry)
        .with_context(|| format!("Failed to load registry {}", registry.display()))?;
    let encoder = CorpusEncoder::new(&registry);
    let corpus = if unlabeled {
        encoder.load_unlabeled(&input, features)
    } else {
        encoder.load_labeled(&input, features)
    }
    .with_context(|| format!("Failed to encode {}", input.display()))?;

    let tensors: HashMap<String, _> = corpus.named_tensors(&Device::Cpu)?.into_iter().collect();
    candle_core::safetensors::save(&tensors, &output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!(
        "Wrote {} sentences ({} tensors) to {}",
        corpus.len(),
        tensors.len(),
        output.display()
    );
    Ok(())
}
