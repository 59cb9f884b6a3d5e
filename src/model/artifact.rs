//! Trained-model artifact persistence.
//!
//! The artifact is a directory written once at the end of a training run:
//! `model.mpk` holds the network parameters (full-precision record) and
//! `meta.json` holds everything needed to rebuild and feed the network:
//! model configuration (input width and class count included) and the
//! frozen normalization statistics. Inference opens the artifact read-only
//! and never mutates it.

use std::fs::File;
use std::path::Path;

use burn::module::Module;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder};
use burn::tensor::backend::Backend;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::config::ModelConfig;
use super::network::EegClassifier;
use crate::data::NormStats;
use crate::error::PipelineError;

pub const META_FILE: &str = "meta.json";
pub const WEIGHTS_FILE: &str = "model.mpk";
const WEIGHTS_STEM: &str = "model";

/// Artifact format version, reported in the inference output.
pub const ARTIFACT_VERSION: &str = "1.0";

type Recorder = NamedMpkFileRecorder<FullPrecisionSettings>;

/// Everything about a trained model except the weights themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMeta {
    pub version: String,
    pub model: ModelConfig,
    pub stats: NormStats,
}

impl ArtifactMeta {
    pub fn new(model: ModelConfig, stats: NormStats) -> Self {
        Self {
            version: ARTIFACT_VERSION.to_string(),
            model,
            stats,
        }
    }
}

/// Persist a trained model and its metadata into `dir`.
pub fn save<B: Backend>(
    model: &EegClassifier<B>,
    meta: &ArtifactMeta,
    dir: &Path,
) -> Result<(), PipelineError> {
    std::fs::create_dir_all(dir)?;

    let meta_file = File::create(dir.join(META_FILE))?;
    serde_json::to_writer_pretty(meta_file, meta)?;

    model
        .clone()
        .save_file(dir.join(WEIGHTS_STEM), &Recorder::new())
        .map_err(|e| PipelineError::ArtifactWrite(e.to_string()))?;

    info!(dir = %dir.display(), "saved model artifact");
    Ok(())
}

/// Load a model artifact from `dir`.
pub fn load<B: Backend>(
    dir: &Path,
    device: &B::Device,
) -> Result<(EegClassifier<B>, ArtifactMeta), PipelineError> {
    if !dir.exists() {
        return Err(PipelineError::ArtifactNotFound(dir.to_path_buf()));
    }
    let meta_path = dir.join(META_FILE);
    let weights_path = dir.join(WEIGHTS_FILE);
    if !meta_path.exists() {
        return Err(PipelineError::ArtifactNotFound(meta_path));
    }
    if !weights_path.exists() {
        return Err(PipelineError::ArtifactNotFound(weights_path));
    }

    let meta: ArtifactMeta = serde_json::from_reader(File::open(&meta_path)?)
        .map_err(|e| PipelineError::ArtifactCorrupt(format!("unreadable metadata: {e}")))?;
    meta.model
        .validate()
        .map_err(PipelineError::ArtifactCorrupt)?;
    if meta.stats.feature_count() != meta.model.num_features {
        return Err(PipelineError::ArtifactCorrupt(format!(
            "normalization statistics cover {} features, model expects {}",
            meta.stats.feature_count(),
            meta.model.num_features
        )));
    }

    let model = EegClassifier::new(device, &meta.model)
        .load_file(dir.join(WEIGHTS_STEM), &Recorder::new(), device)
        .map_err(|e| PipelineError::ArtifactCorrupt(format!("unreadable weights: {e}")))?;

    info!(dir = %dir.display(), "loaded model artifact");
    Ok((model, meta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::NormalizationMethod;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    fn test_meta(features: usize, classes: usize) -> ArtifactMeta {
        ArtifactMeta::new(
            ModelConfig::new(features, classes),
            NormStats {
                method: NormalizationMethod::ZScore,
                means: vec![0.0; features],
                stds: vec![1.0; features],
                mins: vec![0.0; features],
                maxs: vec![1.0; features],
            },
        )
    }

    #[test]
    fn test_missing_artifact() {
        let device = Default::default();
        let result = load::<TestBackend>(Path::new("/no/such/dir"), &device);
        assert!(matches!(result, Err(PipelineError::ArtifactNotFound(_))));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let device = Default::default();
        let meta = test_meta(6, 3);
        let model: EegClassifier<TestBackend> = EegClassifier::new(&device, &meta.model);

        save(&model, &meta, dir.path()).unwrap();
        let (_, loaded) = load::<TestBackend>(dir.path(), &device).unwrap();

        assert_eq!(loaded.model.num_features, 6);
        assert_eq!(loaded.model.num_classes, 3);
        assert_eq!(loaded.stats.means.len(), 6);
    }

    #[test]
    fn test_corrupt_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let device = Default::default();
        let meta = test_meta(4, 2);
        let model: EegClassifier<TestBackend> = EegClassifier::new(&device, &meta.model);
        save(&model, &meta, dir.path()).unwrap();

        std::fs::write(dir.path().join(META_FILE), "not json").unwrap();
        let result = load::<TestBackend>(dir.path(), &device);
        assert!(matches!(result, Err(PipelineError::ArtifactCorrupt(_))));
    }
}
