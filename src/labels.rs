//! Disorder label vocabulary.
//!
//! Maps integer class labels to human-readable diagnosis names. The mapping
//! is supplied externally (JSON file) or falls back to the built-in default;
//! labels without an entry render as `Unknown_<id>` rather than failing.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::PipelineError;

/// Label id to diagnosis name mapping.
#[derive(Debug, Clone)]
pub struct DisorderMap {
    names: BTreeMap<usize, String>,
}

impl Default for DisorderMap {
    fn default() -> Self {
        Self::from_pairs(&[
            (0, "Normal/Healthy"),
            (1, "Epilepsy"),
            (2, "Parkinson's Disease"),
            (3, "Autism Spectrum Disorder"),
            (4, "Psychiatric Disorders"),
        ])
    }
}

impl DisorderMap {
    /// Build a map from (label, name) pairs.
    pub fn from_pairs(pairs: &[(usize, &str)]) -> Self {
        Self {
            names: pairs
                .iter()
                .map(|&(id, name)| (id, name.to_string()))
                .collect(),
        }
    }

    /// Load a vocabulary from a JSON object of the form `{"0": "Normal", ...}`.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PipelineError::FileNotFound(path.to_path_buf()));
        }
        let file = std::fs::File::open(path)?;
        let raw: BTreeMap<String, String> = serde_json::from_reader(file)?;

        let mut names = BTreeMap::new();
        for (key, name) in raw {
            let id: usize = key.parse().map_err(|_| {
                PipelineError::Schema(format!("label vocabulary key {key:?} is not an integer"))
            })?;
            names.insert(id, name);
        }
        Ok(Self { names })
    }

    /// Diagnosis name for a label, or `Unknown_<id>` when unmapped.
    pub fn name(&self, id: usize) -> String {
        self.names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("Unknown_{id}"))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_vocabulary() {
        let map = DisorderMap::default();
        assert_eq!(map.name(0), "Normal/Healthy");
        assert_eq!(map.name(1), "Epilepsy");
    }

    #[test]
    fn test_unknown_label() {
        let map = DisorderMap::default();
        assert_eq!(map.name(17), "Unknown_17");
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.json");
        std::fs::write(&path, r#"{"0": "Healthy", "1": "Seizure"}"#).unwrap();

        let map = DisorderMap::from_json_file(&path).unwrap();
        assert_eq!(map.name(1), "Seizure");
        assert_eq!(map.name(2), "Unknown_2");
    }

    #[test]
    fn test_bad_key_is_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.json");
        std::fs::write(&path, r#"{"zero": "Healthy"}"#).unwrap();

        assert!(matches!(
            DisorderMap::from_json_file(&path),
            Err(PipelineError::Schema(_))
        ));
    }
}
