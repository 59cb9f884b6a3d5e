//! A batch of feature rows with their class labels.

use ndarray::Array2;

/// One batch read from the feature file.
///
/// `features` has shape `[len, feature_count]`; `labels` holds the class
/// label of each row. All batches of a stream have the configured size
/// except possibly the last one, which may be shorter but is never dropped.
#[derive(Debug, Clone)]
pub struct FeatureBatch {
    pub features: Array2<f32>,
    pub labels: Vec<usize>,
}

impl FeatureBatch {
    pub fn new(features: Array2<f32>, labels: Vec<usize>) -> Self {
        debug_assert_eq!(features.nrows(), labels.len());
        Self { features, labels }
    }

    /// Number of rows in the batch.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of feature columns per row.
    pub fn feature_count(&self) -> usize {
        self.features.ncols()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_dimensions() {
        let features = Array2::zeros((4, 7));
        let batch = FeatureBatch::new(features, vec![0, 1, 0, 2]);

        assert_eq!(batch.len(), 4);
        assert_eq!(batch.feature_count(), 7);
        assert!(!batch.is_empty());
    }
}
