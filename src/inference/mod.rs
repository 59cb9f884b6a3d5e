//! Inference: artifact loading, preprocessing, scoring and the diagnostic
//! report.

mod engine;
mod report;

pub use engine::{InferenceEngine, InputRows, Prediction};
pub use report::{
    failure_report, summarize, ConfidenceDistribution, DetailedPrediction, DiagnosticReport,
    ModelInfo, ReportOptions, RiskLevel, Share, Statistics, HIGH_CONFIDENCE, MEDIUM_CONFIDENCE,
};
