//! Diagnostic report assembly.
//!
//! Turns a batch of predictions into the structured JSON report consumed by
//! the serving layer: primary diagnosis, confidence banding, per-class
//! distribution and, when ground truth accompanied the input, accuracy and
//! a full classification report.

use std::collections::BTreeMap;

use serde::Serialize;

use super::engine::Prediction;
use crate::error::PipelineError;
use crate::labels::DisorderMap;
use crate::metrics::{accuracy, ClassificationReport};

/// High-confidence threshold for banding and overall risk.
pub const HIGH_CONFIDENCE: f32 = 0.80;
/// Medium-confidence threshold for banding and overall risk.
pub const MEDIUM_CONFIDENCE: f32 = 0.60;

/// Confidence-derived risk tier.
///
/// Total over the confidence range: `High` at >= 0.80, `Medium` at
/// >= 0.60, `Low` below. The same thresholds band individual samples and
/// grade the aggregate mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

impl RiskLevel {
    pub fn from_confidence(confidence: f32) -> Self {
        if confidence >= HIGH_CONFIDENCE {
            Self::High
        } else if confidence >= MEDIUM_CONFIDENCE {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// Count plus share of the total, used for class and band distributions.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Share {
    pub count: usize,
    pub percentage: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfidenceDistribution {
    pub high_confidence: Share,
    pub medium_confidence: Share,
    pub low_confidence: Share,
}

/// Aggregate statistics over one scored batch.
#[derive(Debug, Clone, Serialize)]
pub struct Statistics {
    pub total_samples: usize,
    pub unique_predictions: usize,
    pub avg_confidence: f32,
    pub min_confidence: f32,
    pub max_confidence: f32,
    pub std_confidence: f32,
    pub class_distribution: BTreeMap<String, Share>,
    pub confidence_distribution: ConfidenceDistribution,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification_report: Option<ClassificationReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetailedPrediction {
    pub sample_index: usize,
    pub predicted_disorder: String,
    pub confidence: f32,
    pub class_probabilities: BTreeMap<String, f32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub model_path: String,
    pub model_type: String,
    pub version: String,
}

/// The full inference report, serialized verbatim to stdout by `predict`.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticReport {
    pub success: bool,
    pub primary_diagnosis: String,
    /// Mean confidence on a 0-100 scale.
    pub confidence: f32,
    pub risk_level: RiskLevel,
    pub total_samples: usize,
    /// Predictions other than the designated normal class.
    pub abnormal_segments: usize,
    pub statistics: Statistics,
    /// First few samples with their full probability vectors.
    pub detailed_predictions: Vec<DetailedPrediction>,
    pub model_info: ModelInfo,
}

/// Report assembly options.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Label treated as the healthy baseline for `abnormal_segments`.
    pub normal_class: usize,
    /// How many per-sample entries to include.
    pub detail_limit: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            normal_class: 0,
            detail_limit: 10,
        }
    }
}

/// Build the diagnostic report for one scored batch.
///
/// The primary diagnosis is the most frequent predicted label, ties broken
/// towards the lowest label id. Constructed once per inference call and
/// returned to the caller; nothing is retained.
pub fn summarize(
    predictions: &[Prediction],
    ground_truth: Option<&[usize]>,
    labels: &DisorderMap,
    options: &ReportOptions,
    model_info: ModelInfo,
) -> DiagnosticReport {
    let total = predictions.len();
    let denom = total.max(1) as f32;

    let mut class_counts: BTreeMap<usize, usize> = BTreeMap::new();
    for p in predictions {
        *class_counts.entry(p.label).or_insert(0) += 1;
    }

    // Modal label; BTreeMap iteration is ascending, so strict `>` keeps the
    // lowest label on ties.
    let mut primary = 0usize;
    let mut primary_count = 0usize;
    for (&label, &count) in &class_counts {
        if count > primary_count {
            primary = label;
            primary_count = count;
        }
    }

    let confidences: Vec<f32> = predictions.iter().map(|p| p.confidence).collect();
    let avg_confidence = confidences.iter().sum::<f32>() / denom;
    let min_confidence = confidences.iter().copied().fold(f32::INFINITY, f32::min);
    let max_confidence = confidences
        .iter()
        .copied()
        .fold(f32::NEG_INFINITY, f32::max);
    let variance = confidences
        .iter()
        .map(|c| (c - avg_confidence) * (c - avg_confidence))
        .sum::<f32>()
        / denom;
    let std_confidence = variance.sqrt();

    let mut high = 0usize;
    let mut medium = 0usize;
    let mut low = 0usize;
    for &c in &confidences {
        match RiskLevel::from_confidence(c) {
            RiskLevel::High => high += 1,
            RiskLevel::Medium => medium += 1,
            RiskLevel::Low => low += 1,
        }
    }
    let share = |count: usize| Share {
        count,
        percentage: count as f32 / denom * 100.0,
    };

    let class_distribution: BTreeMap<String, Share> = class_counts
        .iter()
        .map(|(&label, &count)| (labels.name(label), share(count)))
        .collect();

    let (accuracy_value, classification_report) = match ground_truth {
        Some(truth) if !truth.is_empty() => {
            let predicted: Vec<usize> = predictions.iter().map(|p| p.label).collect();
            (
                Some(accuracy(truth, &predicted)),
                Some(ClassificationReport::compute(truth, &predicted)),
            )
        }
        _ => (None, None),
    };

    let statistics = Statistics {
        total_samples: total,
        unique_predictions: class_counts.len(),
        avg_confidence,
        min_confidence: if total > 0 { min_confidence } else { 0.0 },
        max_confidence: if total > 0 { max_confidence } else { 0.0 },
        std_confidence,
        class_distribution,
        confidence_distribution: ConfidenceDistribution {
            high_confidence: share(high),
            medium_confidence: share(medium),
            low_confidence: share(low),
        },
        accuracy: accuracy_value,
        classification_report,
    };

    let detailed_predictions = predictions
        .iter()
        .take(options.detail_limit)
        .map(|p| DetailedPrediction {
            sample_index: p.sample_index,
            predicted_disorder: labels.name(p.label),
            confidence: p.confidence,
            class_probabilities: p
                .probabilities
                .iter()
                .enumerate()
                .map(|(class, &prob)| (labels.name(class), prob))
                .collect(),
        })
        .collect();

    let abnormal_segments = predictions
        .iter()
        .filter(|p| p.label != options.normal_class)
        .count();

    DiagnosticReport {
        success: true,
        primary_diagnosis: labels.name(primary),
        confidence: avg_confidence * 100.0,
        risk_level: RiskLevel::from_confidence(avg_confidence),
        total_samples: total,
        abnormal_segments,
        statistics,
        detailed_predictions,
        model_info,
    }
}

/// The failure half of the output contract: `success: false` plus a
/// stringified error, never a panic across the process boundary.
pub fn failure_report(error: &PipelineError) -> serde_json::Value {
    serde_json::json!({
        "success": false,
        "error": error.to_string(),
    })
}
