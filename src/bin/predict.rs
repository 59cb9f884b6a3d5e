//! Score an EEG feature file with a trained model and print the diagnostic
//! report as JSON.
//!
//! Usage:
//! ```bash
//! cargo run --release --bin predict -- input_features.csv
//! ```
//!
//! Exactly one JSON object goes to stdout: the report on success, or
//! `{"success": false, "error": "..."}` on failure. Logs go to stderr.

use std::path::PathBuf;

use burn_ndarray::{NdArray, NdArrayDevice};
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use eeg_classifier::inference::{failure_report, summarize, DiagnosticReport, ModelInfo};
use eeg_classifier::{DisorderMap, InferenceEngine, PipelineError, ReportOptions};

type Backend = NdArray<f32>;

/// Score EEG feature rows and emit a diagnostic report.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Feature file to score
    input: PathBuf,

    /// Directory containing the trained model artifact
    #[arg(short, long, default_value = "model_artifact")]
    artifact_dir: PathBuf,

    /// Optional JSON file mapping label ids to disorder names
    #[arg(long)]
    labels: Option<PathBuf>,

    /// Label id treated as the normal/healthy class
    #[arg(long, default_value_t = 0)]
    normal_class: usize,
}

fn main() {
    // Keep stdout clean for the JSON contract; diagnostics go to stderr.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::WARN)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let args = Args::parse();
    match run(&args) {
        Ok(report) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&report)
                    .unwrap_or_else(|e| failure_report(&PipelineError::Json(e)).to_string())
            );
        }
        Err(error) => {
            println!("{}", failure_report(&error));
        }
    }
}

fn run(args: &Args) -> Result<DiagnosticReport, PipelineError> {
    let labels = match &args.labels {
        Some(path) => DisorderMap::from_json_file(path)?,
        None => DisorderMap::default(),
    };

    let engine: InferenceEngine<Backend> =
        InferenceEngine::load(&args.artifact_dir, NdArrayDevice::default())?;
    let (predictions, ground_truth) = engine.score_file(&args.input)?;

    let options = ReportOptions {
        normal_class: args.normal_class,
        ..Default::default()
    };
    let model_info = ModelInfo {
        model_path: engine.artifact_dir().display().to_string(),
        model_type: "CNN-LSTM".to_string(),
        version: engine.meta().version.clone(),
    };

    Ok(summarize(
        &predictions,
        ground_truth.as_deref(),
        &labels,
        &options,
        model_info,
    ))
}
