//! Feature normalization.
//!
//! Statistics are fit once, from the training split only, by streaming
//! accumulation; applying them is a pure function reused for training,
//! evaluation, and inference. The fitted statistics travel with the model
//! artifact so scoring never refits on new data.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::batch::FeatureBatch;

/// Scale below which a feature is treated as constant.
const MIN_SCALE: f32 = 1e-6;

/// Normalization family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMethod {
    /// Standardize to zero mean, unit variance.
    ZScore,
    /// Rescale into [0, 1] per feature.
    MinMax,
}

impl NormalizationMethod {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "zscore" | "z-score" | "standard" => Some(Self::ZScore),
            "minmax" | "min-max" => Some(Self::MinMax),
            _ => None,
        }
    }
}

/// Frozen per-feature statistics.
///
/// A zero-variance feature stores a standard deviation of 1, so its z-score
/// is the constant 0; a zero-range feature maps to the constant 0.5 under
/// min-max. Both cases are well-defined instead of dividing by zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormStats {
    pub method: NormalizationMethod,
    pub means: Vec<f32>,
    pub stds: Vec<f32>,
    pub mins: Vec<f32>,
    pub maxs: Vec<f32>,
}

impl NormStats {
    pub fn feature_count(&self) -> usize {
        self.means.len()
    }

    /// Apply the frozen statistics to a `[rows, features]` block.
    ///
    /// Pure: the same input and statistics always produce the same output.
    pub fn apply(&self, features: &Array2<f32>) -> Array2<f32> {
        debug_assert_eq!(features.ncols(), self.feature_count());

        let mut out = features.clone();
        for (j, mut column) in out.columns_mut().into_iter().enumerate() {
            match self.method {
                NormalizationMethod::ZScore => {
                    let mean = self.means[j];
                    let std = self.stds[j];
                    column.mapv_inplace(|x| (x - mean) / std);
                }
                NormalizationMethod::MinMax => {
                    let min = self.mins[j];
                    let range = self.maxs[j] - min;
                    if range <= MIN_SCALE {
                        column.fill(0.5);
                    } else {
                        column.mapv_inplace(|x| (x - min) / range);
                    }
                }
            }
        }
        out
    }
}

/// Online accumulator for the streaming fit.
///
/// Keeps running sum, sum of squares, min and max per feature; memory is
/// O(features) regardless of how many rows stream through.
#[derive(Debug, Clone)]
pub struct StatsAccumulator {
    count: u64,
    sum: Vec<f64>,
    sum_sq: Vec<f64>,
    min: Vec<f64>,
    max: Vec<f64>,
}

impl StatsAccumulator {
    pub fn new(feature_count: usize) -> Self {
        Self {
            count: 0,
            sum: vec![0.0; feature_count],
            sum_sq: vec![0.0; feature_count],
            min: vec![f64::INFINITY; feature_count],
            max: vec![f64::NEG_INFINITY; feature_count],
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Fold one batch into the running statistics.
    pub fn update(&mut self, batch: &FeatureBatch) {
        debug_assert_eq!(batch.feature_count(), self.sum.len());
        for row in batch.features.rows() {
            for (j, &value) in row.iter().enumerate() {
                let value = value as f64;
                self.sum[j] += value;
                self.sum_sq[j] += value * value;
                self.min[j] = self.min[j].min(value);
                self.max[j] = self.max[j].max(value);
            }
        }
        self.count += batch.len() as u64;
    }

    /// Freeze the accumulated statistics.
    pub fn finalize(self, method: NormalizationMethod) -> NormStats {
        let features = self.sum.len();
        if self.count == 0 {
            return NormStats {
                method,
                means: vec![0.0; features],
                stds: vec![1.0; features],
                mins: vec![0.0; features],
                maxs: vec![1.0; features],
            };
        }

        let n = self.count as f64;
        let mut means = Vec::with_capacity(features);
        let mut stds = Vec::with_capacity(features);
        for j in 0..features {
            let mean = self.sum[j] / n;
            let variance = (self.sum_sq[j] / n - mean * mean).max(0.0);
            let std = variance.sqrt();
            means.push(mean as f32);
            stds.push(if std < MIN_SCALE as f64 { 1.0 } else { std as f32 });
        }

        NormStats {
            method,
            means,
            stds,
            mins: self.min.iter().map(|&v| v as f32).collect(),
            maxs: self.max.iter().map(|&v| v as f32).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn batch(features: Array2<f32>) -> FeatureBatch {
        let labels = vec![0; features.nrows()];
        FeatureBatch::new(features, labels)
    }

    #[test]
    fn test_streaming_fit_matches_direct_computation() {
        let a = array![[1.0_f32, 10.0], [2.0, 20.0]];
        let b = array![[3.0_f32, 30.0], [4.0, 40.0], [5.0, 50.0]];

        let mut acc = StatsAccumulator::new(2);
        acc.update(&batch(a));
        acc.update(&batch(b));
        let stats = acc.finalize(NormalizationMethod::ZScore);

        assert_eq!(stats.means[0], 3.0);
        assert_eq!(stats.means[1], 30.0);
        // Population std of 1..=5 is sqrt(2).
        assert!((stats.stds[0] - 2.0_f32.sqrt()).abs() < 1e-6);
        assert_eq!(stats.mins[0], 1.0);
        assert_eq!(stats.maxs[1], 50.0);
    }

    #[test]
    fn test_zero_variance_feature_normalizes_to_zero() {
        let data = array![[7.0_f32, 1.0], [7.0, 2.0], [7.0, 3.0]];
        let mut acc = StatsAccumulator::new(2);
        acc.update(&batch(data.clone()));
        let stats = acc.finalize(NormalizationMethod::ZScore);

        let out = stats.apply(&data);
        for i in 0..3 {
            assert_eq!(out[[i, 0]], 0.0);
        }
        assert!(out[[0, 1]] < 0.0 && out[[2, 1]] > 0.0);
    }

    #[test]
    fn test_minmax_zero_range_is_half() {
        let data = array![[7.0_f32], [7.0], [7.0]];
        let mut acc = StatsAccumulator::new(1);
        acc.update(&batch(data.clone()));
        let stats = acc.finalize(NormalizationMethod::MinMax);

        let out = stats.apply(&data);
        assert!(out.iter().all(|&v| v == 0.5));
    }

    #[test]
    fn test_apply_is_pure() {
        let data = array![[1.0_f32, 2.0], [3.0, 4.0]];
        let mut acc = StatsAccumulator::new(2);
        acc.update(&batch(data.clone()));
        let stats = acc.finalize(NormalizationMethod::ZScore);

        let once = stats.apply(&data);
        let twice = stats.apply(&data);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_minmax_rescales_into_unit_interval() {
        let data = array![[0.0_f32], [5.0], [10.0]];
        let mut acc = StatsAccumulator::new(1);
        acc.update(&batch(data.clone()));
        let stats = acc.finalize(NormalizationMethod::MinMax);

        let out = stats.apply(&data);
        assert_eq!(out[[0, 0]], 0.0);
        assert_eq!(out[[1, 0]], 0.5);
        assert_eq!(out[[2, 0]], 1.0);
    }
}
