//! Train the CNN-LSTM disorder classifier on a preprocessed EEG feature
//! file.
//!
//! Usage:
//! ```bash
//! cargo run --release --bin train -- --data normalized_eeg_data.csv
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use burn::module::AutodiffModule;
use burn_autodiff::Autodiff;
use burn_ndarray::{NdArray, NdArrayDevice};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use eeg_classifier::model::{artifact, evaluate, train_model, ArtifactMeta};
use eeg_classifier::{
    balanced_weights, CsvBatchReader, EegClassifier, ModelConfig, NormalizationMethod, Split,
    SplitPlan, StatsAccumulator, TrainingConfig,
};

type Backend = Autodiff<NdArray<f32>>;

/// Train the EEG disorder classifier.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Preprocessed feature CSV (header row, class label in the last column)
    #[arg(short, long)]
    data: PathBuf,

    /// Directory to write the trained model artifact into
    #[arg(short, long, default_value = "model_artifact")]
    artifact_dir: PathBuf,

    /// Rows per batch
    #[arg(short, long, default_value_t = 32)]
    batch_size: usize,

    /// Epoch budget (early stopping usually ends the run sooner)
    #[arg(short, long, default_value_t = 1000)]
    epochs: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 5e-4)]
    learning_rate: f64,

    /// Epochs without validation improvement before stopping
    #[arg(long, default_value_t = 25)]
    patience: usize,

    /// Base seed for the training shuffle
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Bounded shuffle-buffer size
    #[arg(long, default_value_t = 10_000)]
    shuffle_buffer: usize,

    /// Normalization family: zscore | minmax
    #[arg(long, default_value = "zscore")]
    normalization: String,

    /// Disable class-imbalance weighting of the loss
    #[arg(long)]
    no_class_weights: bool,
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    let normalization = NormalizationMethod::parse(&args.normalization)
        .with_context(|| format!("unknown normalization family {:?}", args.normalization))?;

    let config = TrainingConfig {
        num_epochs: args.epochs,
        batch_size: args.batch_size,
        learning_rate: args.learning_rate,
        patience: args.patience,
        seed: args.seed,
        shuffle_buffer: args.shuffle_buffer,
        use_class_weights: !args.no_class_weights,
        normalization,
        ..Default::default()
    };

    println!("=== EEG Classifier Training ===\n");

    let reader = CsvBatchReader::open(&args.data, config.batch_size)?;
    let total_rows = reader.count_rows()?;
    let plan = SplitPlan::new(total_rows, config.batch_size);

    println!("Data file:  {}", args.data.display());
    println!("Rows:       {total_rows}");
    println!("Features:   {}", reader.feature_count());
    println!(
        "Batches:    {} total -> {} train / {} validation / {} test",
        plan.total_batches, plan.train_batches, plan.val_batches, plan.test_batches
    );

    if plan.is_empty(Split::Train) {
        bail!(
            "not enough data to train: {} rows yield no full training batch",
            total_rows
        );
    }

    // One streaming pass over the training split fits the normalization
    // statistics and counts the realized label distribution.
    println!("\nFitting normalization statistics on the training split...");
    let pb = ProgressBar::new(plan.rows(Split::Train) as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} rows")
            .unwrap()
            .progress_chars("#>-"),
    );

    let mut accumulator = StatsAccumulator::new(reader.feature_count());
    let mut labels = Vec::new();
    for batch in reader.split_batches(&plan, Split::Train, None)? {
        let batch = batch?;
        accumulator.update(&batch);
        labels.extend_from_slice(&batch.labels);
        pb.inc(batch.len() as u64);
    }
    pb.finish_and_clear();

    let stats = accumulator.finalize(config.normalization);
    let counts = eeg_classifier::count_labels(labels);
    // A class without training samples is a fatal configuration error; it
    // must stop the run before any weights are written.
    let mut class_weights = balanced_weights(&counts)?;
    let num_classes = counts.len();
    if !config.use_class_weights {
        warn!("class weighting disabled; using uniform weights");
        class_weights = vec![1.0; num_classes];
    }

    println!("Classes:    {num_classes} (counts: {counts:?})");
    println!("Weights:    {class_weights:?}");

    let model_config = ModelConfig::new(reader.feature_count(), num_classes);
    model_config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid model configuration: {e}"))?;

    let device = NdArrayDevice::default();
    let model: EegClassifier<Backend> = EegClassifier::new(&device, &model_config);

    println!("\n=== Training ===\n");
    let (model, result) = train_model(
        model,
        &reader,
        &plan,
        &stats,
        &class_weights,
        &config,
        &device,
    )?;

    println!(
        "Trained for {} epochs (best validation accuracy {:.4} at epoch {})",
        result.epochs_run,
        result.best_accuracy,
        result.best_epoch + 1
    );

    if plan.is_empty(Split::Test) {
        warn!("test split is empty; skipping final evaluation");
    } else {
        println!("\n=== Test Evaluation ===\n");
        let test_stream = reader.split_batches(&plan, Split::Test, None)?;
        let metrics = evaluate(&model.valid(), test_stream, &stats, num_classes, &device)?;

        println!("Test accuracy: {:.2}%", metrics.accuracy * 100.0);
        println!("Test loss:     {:.4}\n", metrics.loss);
        println!("Classification report:\n{}", metrics.report);
        println!("Confusion matrix:\n{}", metrics.confusion);
    }

    let meta = ArtifactMeta::new(model_config, stats);
    artifact::save(&model, &meta, &args.artifact_dir)?;
    info!(dir = %args.artifact_dir.display(), "training run complete");
    println!("\nModel artifact saved to {}", args.artifact_dir.display());

    Ok(())
}
