//! Class-imbalance weighting.
//!
//! Weights are computed from the realized label distribution of the
//! training split after the deterministic split is applied, using the
//! balanced scheme `weight[c] = total / (num_classes * count[c])`.

use crate::error::PipelineError;

/// Fold labels into per-class counts.
///
/// The number of classes is inferred as `max(label) + 1`; any class without
/// samples shows up as a zero count and is rejected by
/// [`balanced_weights`].
pub fn count_labels<I>(labels: I) -> Vec<usize>
where
    I: IntoIterator<Item = usize>,
{
    let mut counts: Vec<usize> = Vec::new();
    for label in labels {
        if label >= counts.len() {
            counts.resize(label + 1, 0);
        }
        counts[label] += 1;
    }
    counts
}

/// Balanced inverse-frequency weights.
///
/// Rarer classes receive strictly larger weights, and
/// `sum(count[c] * weight[c]) == total * num_classes` holds exactly in
/// real arithmetic. A class with zero training samples cannot be weighted
/// and stops training before any model is written.
pub fn balanced_weights(counts: &[usize]) -> Result<Vec<f32>, PipelineError> {
    if counts.is_empty() {
        return Err(PipelineError::EmptyClass(
            "no labels observed in the training split".to_string(),
        ));
    }
    if let Some(class) = counts.iter().position(|&c| c == 0) {
        return Err(PipelineError::EmptyClass(format!(
            "class {class} has no samples in the training split"
        )));
    }

    let total: usize = counts.iter().sum();
    let num_classes = counts.len();
    Ok(counts
        .iter()
        .map(|&count| total as f32 / (num_classes as f32 * count as f32))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balanced_identity() {
        let counts = count_labels([0, 0, 0, 0, 1, 1, 2, 2, 2, 2, 2, 2]);
        assert_eq!(counts, vec![4, 2, 6]);

        let weights = balanced_weights(&counts).unwrap();
        let total: f32 = counts
            .iter()
            .zip(&weights)
            .map(|(&c, &w)| c as f32 * w)
            .sum();
        // sum(count * weight) == total_samples * num_classes
        assert!((total - 12.0 * 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_rarer_class_weighs_more() {
        let weights = balanced_weights(&[100, 10, 1]).unwrap();
        assert!(weights[0] < weights[1]);
        assert!(weights[1] < weights[2]);
    }

    #[test]
    fn test_missing_class_is_rejected() {
        // Label 2 appears but label 1 never does.
        let counts = count_labels([0, 0, 2]);
        assert!(matches!(
            balanced_weights(&counts),
            Err(PipelineError::EmptyClass(_))
        ));
    }

    #[test]
    fn test_empty_training_split_is_rejected() {
        let counts = count_labels(std::iter::empty());
        assert!(matches!(
            balanced_weights(&counts),
            Err(PipelineError::EmptyClass(_))
        ));
    }

    #[test]
    fn test_uniform_distribution_gets_unit_weights() {
        let weights = balanced_weights(&[5, 5, 5, 5]).unwrap();
        assert!(weights.iter().all(|&w| (w - 1.0).abs() < 1e-6));
    }
}
