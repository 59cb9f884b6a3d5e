//! Classification metrics: accuracy, confusion matrix and the per-class
//! precision/recall/F1 report shared by test-set evaluation and the
//! inference statistics block.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

/// Fraction of predictions matching the true labels.
pub fn accuracy(y_true: &[usize], y_pred: &[usize]) -> f32 {
    debug_assert_eq!(y_true.len(), y_pred.len());
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred)
        .filter(|(t, p)| t == p)
        .count();
    correct as f32 / y_true.len() as f32
}

/// Confusion matrix over the sorted distinct true labels actually observed.
///
/// Rows are true labels, columns are predicted labels. Predictions for a
/// class that never occurs as a true label fall outside the matrix.
#[derive(Debug, Clone, Serialize)]
pub struct ConfusionMatrix {
    pub labels: Vec<usize>,
    pub matrix: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    pub fn compute(y_true: &[usize], y_pred: &[usize]) -> Self {
        debug_assert_eq!(y_true.len(), y_pred.len());
        let labels: Vec<usize> = y_true.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        let index: BTreeMap<usize, usize> =
            labels.iter().enumerate().map(|(i, &l)| (l, i)).collect();

        let mut matrix = vec![vec![0usize; labels.len()]; labels.len()];
        for (&t, &p) in y_true.iter().zip(y_pred) {
            let row = index[&t];
            if let Some(&col) = index.get(&p) {
                matrix[row][col] += 1;
            }
        }
        Self { labels, matrix }
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>8}", "true\\pred")?;
        for label in &self.labels {
            write!(f, "{label:>8}")?;
        }
        writeln!(f)?;
        for (label, row) in self.labels.iter().zip(&self.matrix) {
            write!(f, "{label:>8}")?;
            for count in row {
                write!(f, "{count:>8}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Precision, recall, F1 and support for one class.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ClassMetrics {
    pub precision: f32,
    pub recall: f32,
    #[serde(rename = "f1-score")]
    pub f1_score: f32,
    pub support: usize,
}

/// Full classification report in the shape of the familiar per-class table:
/// one entry per observed label plus accuracy and macro/weighted averages.
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationReport {
    #[serde(flatten)]
    pub per_class: BTreeMap<String, ClassMetrics>,
    pub accuracy: f32,
    #[serde(rename = "macro avg")]
    pub macro_avg: ClassMetrics,
    #[serde(rename = "weighted avg")]
    pub weighted_avg: ClassMetrics,
}

impl ClassificationReport {
    pub fn compute(y_true: &[usize], y_pred: &[usize]) -> Self {
        debug_assert_eq!(y_true.len(), y_pred.len());
        // Per-class metrics run over the union of observed labels, so a
        // class that is only ever predicted still shows its zero support.
        let labels: Vec<usize> = y_true
            .iter()
            .chain(y_pred.iter())
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut per_class = BTreeMap::new();
        let mut macro_sum = (0.0f32, 0.0f32, 0.0f32);
        let mut weighted_sum = (0.0f32, 0.0f32, 0.0f32);
        let total = y_true.len();

        for &label in &labels {
            let tp = y_true
                .iter()
                .zip(y_pred)
                .filter(|(&t, &p)| t == label && p == label)
                .count() as f32;
            let predicted = y_pred.iter().filter(|&&p| p == label).count() as f32;
            let support = y_true.iter().filter(|&&t| t == label).count();

            let precision = if predicted > 0.0 { tp / predicted } else { 0.0 };
            let recall = if support > 0 { tp / support as f32 } else { 0.0 };
            let f1_score = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };

            macro_sum.0 += precision;
            macro_sum.1 += recall;
            macro_sum.2 += f1_score;
            weighted_sum.0 += precision * support as f32;
            weighted_sum.1 += recall * support as f32;
            weighted_sum.2 += f1_score * support as f32;

            per_class.insert(
                label.to_string(),
                ClassMetrics {
                    precision,
                    recall,
                    f1_score,
                    support,
                },
            );
        }

        let k = labels.len().max(1) as f32;
        let n = total.max(1) as f32;
        Self {
            per_class,
            accuracy: accuracy(y_true, y_pred),
            macro_avg: ClassMetrics {
                precision: macro_sum.0 / k,
                recall: macro_sum.1 / k,
                f1_score: macro_sum.2 / k,
                support: total,
            },
            weighted_avg: ClassMetrics {
                precision: weighted_sum.0 / n,
                recall: weighted_sum.1 / n,
                f1_score: weighted_sum.2 / n,
                support: total,
            },
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>12} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        for (label, m) in &self.per_class {
            writeln!(
                f,
                "{:>12} {:>10.4} {:>10.4} {:>10.4} {:>10}",
                label, m.precision, m.recall, m.f1_score, m.support
            )?;
        }
        writeln!(f, "{:>12} {:>43.4}", "accuracy", self.accuracy)?;
        for (name, m) in [("macro avg", self.macro_avg), ("weighted avg", self.weighted_avg)] {
            writeln!(
                f,
                "{:>12} {:>10.4} {:>10.4} {:>10.4} {:>10}",
                name, m.precision, m.recall, m.f1_score, m.support
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy() {
        assert_eq!(accuracy(&[0, 1, 2, 1], &[0, 1, 1, 1]), 0.75);
        assert_eq!(accuracy(&[], &[]), 0.0);
    }

    #[test]
    fn test_confusion_matrix_layout() {
        let y_true = vec![0, 0, 1, 2, 2];
        let y_pred = vec![0, 1, 1, 2, 0];
        let cm = ConfusionMatrix::compute(&y_true, &y_pred);

        assert_eq!(cm.labels, vec![0, 1, 2]);
        assert_eq!(cm.matrix[0], vec![1, 1, 0]);
        assert_eq!(cm.matrix[1], vec![0, 1, 0]);
        assert_eq!(cm.matrix[2], vec![1, 0, 1]);
    }

    #[test]
    fn test_perfect_predictions() {
        let y = vec![0, 1, 1, 2];
        let report = ClassificationReport::compute(&y, &y);
        assert_eq!(report.accuracy, 1.0);
        for metrics in report.per_class.values() {
            assert_eq!(metrics.precision, 1.0);
            assert_eq!(metrics.recall, 1.0);
            assert_eq!(metrics.f1_score, 1.0);
        }
    }

    #[test]
    fn test_report_precision_and_recall() {
        // Class 0: tp=2, fp=1 (one true-1 predicted 0), fn=0.
        let y_true = vec![0, 0, 1, 1];
        let y_pred = vec![0, 0, 0, 1];
        let report = ClassificationReport::compute(&y_true, &y_pred);

        let c0 = &report.per_class["0"];
        assert!((c0.precision - 2.0 / 3.0).abs() < 1e-6);
        assert_eq!(c0.recall, 1.0);
        assert_eq!(c0.support, 2);

        let c1 = &report.per_class["1"];
        assert_eq!(c1.precision, 1.0);
        assert_eq!(c1.recall, 0.5);
    }
}
