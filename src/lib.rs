//! # EEG Diagnostic Classifier
//!
//! Classifies multi-channel EEG feature recordings into diagnostic
//! categories with a CNN-LSTM model built on the Burn framework.
//!
//! The crate covers two pipelines:
//!
//! - **Training** (`train` binary): streams a tabular feature file in
//!   batches, splits it deterministically into train/validation/test by
//!   batch index, fits per-feature normalization statistics on the training
//!   split only, weights the loss by inverse class frequency, and fits the
//!   classifier with validation-based early stopping.
//! - **Inference** (`predict` binary): loads a persisted artifact (weights
//!   plus frozen normalization statistics), scores new feature rows, and
//!   emits a JSON risk report with the primary diagnosis, confidence
//!   banding and per-class distribution.
//!
//! ## Modules
//!
//! - `data` - streaming reads, splitting, normalization, class weighting
//! - `model` - network architecture, training loop, artifact persistence
//! - `inference` - scoring engine and diagnostic report
//! - `metrics` - accuracy, confusion matrix, classification report
//! - `labels` - label id to diagnosis-name vocabulary

pub mod data;
pub mod error;
pub mod inference;
pub mod labels;
pub mod metrics;
pub mod model;

pub use data::{
    balanced_weights, count_labels, CsvBatchReader, FeatureBatch, NormStats, NormalizationMethod,
    ShuffleConfig, Split, SplitPlan, StatsAccumulator,
};
pub use error::PipelineError;
pub use inference::{DiagnosticReport, InferenceEngine, Prediction, ReportOptions, RiskLevel};
pub use labels::DisorderMap;
pub use model::{ArtifactMeta, EegClassifier, ModelConfig, TrainingConfig};
