//! Inference engine: load a trained artifact, preprocess incoming feature
//! rows, and score them.
//!
//! Preprocessing coerces each row to the model's feature width (extra
//! columns are truncated, too few is an error), repairs non-finite values
//! by substituting 0.0, and applies the artifact's frozen normalization
//! statistics. Statistics are never refit on inference data.

use std::path::{Path, PathBuf};

use burn::tensor::backend::Backend;
use ndarray::Array2;
use tracing::{debug, info};

use crate::error::PipelineError;
use crate::model::{self, features_to_tensor, ArtifactMeta, EegClassifier};

/// One scored sample.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub sample_index: usize,
    pub label: usize,
    /// Maximum class probability.
    pub confidence: f32,
    pub probabilities: Vec<f32>,
}

/// Rows read from an inference input file.
///
/// `ground_truth` is present when the file carried a trailing label column
/// (the training-file format).
#[derive(Debug, Clone)]
pub struct InputRows {
    pub features: Vec<Vec<f32>>,
    pub ground_truth: Option<Vec<usize>>,
}

/// A loaded, read-only model artifact ready to score samples.
pub struct InferenceEngine<B: Backend> {
    model: EegClassifier<B>,
    meta: ArtifactMeta,
    device: B::Device,
    artifact_dir: PathBuf,
}

impl<B: Backend> InferenceEngine<B> {
    /// Load an artifact; the engine keeps it immutable for its lifetime.
    pub fn load<P: AsRef<Path>>(artifact_dir: P, device: B::Device) -> Result<Self, PipelineError> {
        let artifact_dir = artifact_dir.as_ref().to_path_buf();
        let (model, meta) = model::artifact::load::<B>(&artifact_dir, &device)?;
        info!(
            features = meta.model.num_features,
            classes = meta.model.num_classes,
            "inference engine ready"
        );
        Ok(Self {
            model,
            meta,
            device,
            artifact_dir,
        })
    }

    pub fn feature_count(&self) -> usize {
        self.meta.model.num_features
    }

    pub fn num_classes(&self) -> usize {
        self.meta.model.num_classes
    }

    pub fn meta(&self) -> &ArtifactMeta {
        &self.meta
    }

    pub fn artifact_dir(&self) -> &Path {
        &self.artifact_dir
    }

    /// Read feature rows from a delimited file with a header row.
    ///
    /// A file whose width is exactly one more than the model's feature
    /// count is treated as carrying ground-truth labels in the last column.
    /// Wider files are truncated to the feature count; narrower files fail
    /// with a shape error. Unparseable cells become NaN and are repaired in
    /// [`InferenceEngine::preprocess`].
    pub fn read_rows<P: AsRef<Path>>(&self, path: P) -> Result<InputRows, PipelineError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PipelineError::FileNotFound(path.to_path_buf()));
        }

        let expected = self.feature_count();
        let mut reader = csv::Reader::from_path(path)?;
        let width = reader.headers()?.len();
        if width < expected {
            return Err(PipelineError::Shape {
                expected,
                actual: width,
            });
        }
        let has_labels = width == expected + 1;

        let mut features = Vec::new();
        let mut ground_truth = if has_labels { Some(Vec::new()) } else { None };
        for record in reader.records() {
            let record = record?;
            let row: Vec<f32> = record
                .iter()
                .take(expected)
                .map(|cell| cell.trim().parse::<f32>().unwrap_or(f32::NAN))
                .collect();
            if row.len() < expected {
                return Err(PipelineError::Shape {
                    expected,
                    actual: row.len(),
                });
            }
            features.push(row);

            if let Some(labels) = ground_truth.as_mut() {
                let cell = record.get(expected).unwrap_or_default().trim();
                let value: f64 = cell.parse().map_err(|_| {
                    PipelineError::Schema(format!("label cell {cell:?} is not numeric"))
                })?;
                if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
                    return Err(PipelineError::Schema(format!(
                        "label cell {cell:?} is not a non-negative integer"
                    )));
                }
                labels.push(value as usize);
            }
        }

        if features.is_empty() {
            return Err(PipelineError::Schema(
                "input file contains no data rows".to_string(),
            ));
        }

        debug!(
            rows = features.len(),
            ground_truth = has_labels,
            "read inference input"
        );
        Ok(InputRows {
            features,
            ground_truth,
        })
    }

    /// Coerce, repair and normalize raw rows into a `[rows, features]`
    /// block ready for the model.
    pub fn preprocess(&self, rows: &[Vec<f32>]) -> Result<Array2<f32>, PipelineError> {
        let expected = self.feature_count();
        let mut data = Vec::with_capacity(rows.len() * expected);
        for row in rows {
            if row.len() < expected {
                return Err(PipelineError::Shape {
                    expected,
                    actual: row.len(),
                });
            }
            // Non-finite values (NaN, +/-inf) are repaired locally, before
            // standardization, never propagated as fatal.
            data.extend(
                row.iter()
                    .take(expected)
                    .map(|&v| if v.is_finite() { v } else { 0.0 }),
            );
        }

        let raw = Array2::from_shape_vec((rows.len(), expected), data)
            .expect("coerced rows match the expected width");
        Ok(self.meta.stats.apply(&raw))
    }

    /// Score normalized rows.
    pub fn predict(&self, normalized: &Array2<f32>) -> Vec<Prediction> {
        let rows = normalized.nrows();
        let classes = self.num_classes();
        let input = features_to_tensor::<B>(normalized, &self.device);
        let probs = self.model.predict_proba(input);
        let flat: Vec<f32> = probs.into_data().iter::<f32>().collect();

        (0..rows)
            .map(|i| {
                let probabilities = flat[i * classes..(i + 1) * classes].to_vec();
                let (label, &best) = probabilities
                    .iter()
                    .enumerate()
                    .max_by(|a, b| a.1.total_cmp(b.1))
                    .expect("probability vector is non-empty");
                Prediction {
                    sample_index: i,
                    label,
                    confidence: best,
                    probabilities,
                }
            })
            .collect()
    }

    /// Read, preprocess and score one input file.
    pub fn score_file<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<(Vec<Prediction>, Option<Vec<usize>>), PipelineError> {
        let input = self.read_rows(path)?;
        let normalized = self.preprocess(&input.features)?;
        Ok((self.predict(&normalized), input.ground_truth))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{NormStats, NormalizationMethod};
    use crate::model::{artifact, ModelConfig};
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    fn engine(features: usize, classes: usize) -> (tempfile::TempDir, InferenceEngine<TestBackend>) {
        let dir = tempfile::tempdir().unwrap();
        let device = Default::default();
        let meta = ArtifactMeta::new(
            ModelConfig::new(features, classes),
            NormStats {
                method: NormalizationMethod::ZScore,
                means: vec![1.0; features],
                stds: vec![2.0; features],
                mins: vec![0.0; features],
                maxs: vec![1.0; features],
            },
        );
        let model: EegClassifier<TestBackend> = EegClassifier::new(&device, &meta.model);
        artifact::save(&model, &meta, dir.path()).unwrap();

        let engine = InferenceEngine::load(dir.path(), device).unwrap();
        (dir, engine)
    }

    #[test]
    fn test_preprocess_repairs_non_finite_values() {
        let (_dir, engine) = engine(4, 2);
        let rows = vec![vec![3.0, f32::NAN, f32::INFINITY, f32::NEG_INFINITY]];
        let out = engine.preprocess(&rows).unwrap();

        // (3 - 1) / 2 = 1; repaired cells land at (0 - 1) / 2 = -0.5.
        assert_eq!(out[[0, 0]], 1.0);
        assert_eq!(out[[0, 1]], -0.5);
        assert_eq!(out[[0, 2]], -0.5);
        assert_eq!(out[[0, 3]], -0.5);
    }

    #[test]
    fn test_preprocess_truncates_extra_columns() {
        let (_dir, engine) = engine(3, 2);
        let rows = vec![vec![1.0, 1.0, 1.0, 99.0, 98.0]];
        let out = engine.preprocess(&rows).unwrap();
        assert_eq!(out.ncols(), 3);
    }

    #[test]
    fn test_preprocess_rejects_narrow_rows() {
        let (_dir, engine) = engine(5, 2);
        let rows = vec![vec![1.0, 2.0]];
        assert!(matches!(
            engine.preprocess(&rows),
            Err(PipelineError::Shape {
                expected: 5,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_predictions_are_deterministic_and_well_formed() {
        let (_dir, engine) = engine(4, 3);
        let rows = vec![vec![0.5, 1.0, f32::NAN, 2.0], vec![1.0, 1.0, 1.0, 1.0]];
        let normalized = engine.preprocess(&rows).unwrap();

        let first = engine.predict(&normalized);
        let second = engine.predict(&normalized);
        assert_eq!(first.len(), 2);
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.label, b.label);
            assert_eq!(a.confidence, b.confidence);
            let sum: f32 = a.probabilities.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5);
            assert!(a.confidence >= 1.0 / 3.0 - 1e-6);
        }
    }

    #[test]
    fn test_read_rows_detects_ground_truth_column() {
        let (_dir, engine) = engine(2, 2);
        let input_dir = tempfile::tempdir().unwrap();

        let with_labels = input_dir.path().join("labeled.csv");
        std::fs::write(&with_labels, "a,b,label\n0.1,0.2,1\n0.3,0.4,0\n").unwrap();
        let rows = engine.read_rows(&with_labels).unwrap();
        assert_eq!(rows.ground_truth, Some(vec![1, 0]));

        let without = input_dir.path().join("plain.csv");
        std::fs::write(&without, "a,b\n0.1,0.2\n").unwrap();
        let rows = engine.read_rows(&without).unwrap();
        assert!(rows.ground_truth.is_none());
    }

    #[test]
    fn test_read_rows_shape_error() {
        let (_dir, engine) = engine(5, 2);
        let input_dir = tempfile::tempdir().unwrap();
        let narrow = input_dir.path().join("narrow.csv");
        std::fs::write(&narrow, "a,b\n0.1,0.2\n").unwrap();

        assert!(matches!(
            engine.read_rows(&narrow),
            Err(PipelineError::Shape { expected: 5, .. })
        ));
    }
}
