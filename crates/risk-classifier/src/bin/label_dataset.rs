//! Dataset Labelling Tool
//!
//! Adds (or overwrites) a `MicrobialRisk` column holding the rule-derived
//! risk level of every row. Without `--output` the input file is rewritten.

use anyhow::Context;
use clap::Parser;
use risk_classifier::Dataset;
use rule_engine::LabelDistribution;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

const LABEL_COLUMN: &str = "MicrobialRisk";

/// Label a water-quality CSV with rule-derived microbial-risk levels.
#[derive(Debug, Parser)]
#[command(name = "label-dataset", version, about, long_about = None)]
struct Args {
    /// Reference dataset to label
    #[arg(default_value = "water_potability.csv")]
    input: PathBuf,

    /// Write the labelled CSV here instead of rewriting the input
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Args {
    fn output_path(&self) -> &PathBuf {
        self.output.as_ref().unwrap_or(&self.input)
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let input = &args.input;
    let output = args.output_path();

    let dataset = Dataset::load(input).with_context(|| format!("loading {}", input.display()))?;
    let missing = dataset.missing_columns();
    if !missing.is_empty() {
        info!(
            "Columns absent from dataset (treated as null): {}",
            missing.iter().map(|f| f.as_str()).collect::<Vec<_>>().join(", ")
        );
    }

    let labels: Vec<_> = dataset.labelled().into_iter().map(|s| s.label).collect();
    let distribution = LabelDistribution::from_labels(labels.iter());

    let csv = dataset.to_csv_with_labels(LABEL_COLUMN, &labels)?;
    std::fs::write(output, csv).with_context(|| format!("writing {}", output.display()))?;

    info!("Labelled {} rows -> {}", labels.len(), output.display());
    info!("Label distribution: {}", distribution);
    Ok(())
}
