//! CNN-LSTM classifier: architecture, training loop and artifact
//! persistence, built on the Burn framework.

pub mod artifact;
mod config;
mod network;
mod training;

pub use artifact::{ArtifactMeta, ARTIFACT_VERSION};
pub use config::{ModelConfig, TrainingConfig};
pub use network::EegClassifier;
pub use training::{evaluate, train_model, EvaluationMetrics, TrainingResult};

pub(crate) use training::features_to_tensor;
