//! Пакетный прогон: train.csv + test.csv -> submission.csv
//!
//! ```sh
//! cargo run --release --bin submission -- --train train.csv --test test.csv --output submission.csv
//! ```

use std::fs::{self, File};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use passenger_ml::config::AppConfig;
use passenger_ml::io;
use passenger_ml::models::fit_and_predict;
use passenger_ml::preprocessing::{FeaturePipeline, FlagEncoding};

#[derive(Parser, Debug)]
#[command(about = "Derive features, fit a classifier and write predictions")]
struct Args {
    /// Размеченная партиция (с колонкой Transported)
    #[arg(long)]
    train: PathBuf,

    /// Неразмеченная партиция
    #[arg(long)]
    test: PathBuf,

    /// Куда записать PassengerId,Transported
    #[arg(long)]
    output: PathBuf,

    /// Каталог для train_features.csv и test_features.csv
    #[arg(long)]
    features_dir: Option<PathBuf>,

    /// Представление флагов в таблицах признаков
    #[arg(long, value_enum)]
    flag_encoding: Option<FlagEncoding>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut config = AppConfig::load()?;
    if let Some(encoding) = args.flag_encoding {
        config.pipeline.flag_encoding = encoding;
    }

    let labeled = io::read_table_from_path(&args.train)
        .with_context(|| format!("Failed to load {}", args.train.display()))?;
    let unlabeled = io::read_table_from_path(&args.test)
        .with_context(|| format!("Failed to load {}", args.test.display()))?;

    let pipeline = FeaturePipeline::new(config.pipeline.clone());
    let output = pipeline.run(&labeled, &unlabeled)?;
    if !output.report.warnings.is_empty() {
        tracing::info!("Pipeline finished with {} warnings", output.report.warnings.len());
    }

    if let Some(dir) = &args.features_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        let tables = &output.tables;
        let encoding = config.pipeline.flag_encoding;
        io::write_features(
            File::create(dir.join("train_features.csv"))?,
            &tables.labeled,
            Some(tables.labels.as_slice()),
            encoding,
        )?;
        io::write_features(
            File::create(dir.join("test_features.csv"))?,
            &tables.unlabeled,
            None,
            encoding,
        )?;
        tracing::info!("Feature tables written to {}", dir.display());
    }

    let run = fit_and_predict(&output.tables, &config.classifier)?;
    if let Some(holdout) = &run.report.holdout {
        tracing::info!(
            "Holdout accuracy: {:.4} ({} rows)",
            holdout.accuracy,
            holdout.test_rows
        );
    }

    let file = File::create(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    io::write_predictions(file, &run.predictions)?;
    tracing::info!(
        "Wrote {} predictions to {}",
        run.predictions.len(),
        args.output.display()
    );

    Ok(())
}
