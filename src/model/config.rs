//! Model and training configuration.

use serde::{Deserialize, Serialize};

use crate::data::NormalizationMethod;

/// Architecture configuration for the CNN-LSTM classifier.
///
/// Each sample is one frame of `num_features` values; the network runs two
/// convolution + pooling stages over it, three recurrent layers, and a
/// dense head projecting onto `num_classes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Number of input features per sample.
    pub num_features: usize,
    /// Number of diagnostic classes.
    pub num_classes: usize,
    /// Filters in the first convolution.
    pub conv1_filters: usize,
    /// Filters in the second convolution.
    pub conv2_filters: usize,
    /// Convolution kernel size.
    pub kernel_size: usize,
    /// Pooling window size.
    pub pool_size: usize,
    /// Hidden size of the first bidirectional LSTM.
    pub lstm1_hidden: usize,
    /// Hidden size of the second bidirectional LSTM.
    pub lstm2_hidden: usize,
    /// Hidden size of the final unidirectional LSTM.
    pub lstm3_hidden: usize,
    /// Dense layer size before the output projection.
    pub fc_size: usize,
    /// Dropout rate before the output projection.
    pub dropout: f64,
}

impl ModelConfig {
    pub fn new(num_features: usize, num_classes: usize) -> Self {
        Self {
            num_features,
            num_classes,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.num_features == 0 {
            return Err("num_features must be > 0".to_string());
        }
        if self.num_classes < 2 {
            return Err("num_classes must be >= 2".to_string());
        }
        if self.kernel_size < 2 {
            return Err("kernel_size must be >= 2".to_string());
        }
        if self.pool_size < 2 {
            return Err("pool_size must be >= 2".to_string());
        }
        if !(0.0..=1.0).contains(&self.dropout) {
            return Err("dropout must be in [0, 1]".to_string());
        }
        Ok(())
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            num_features: 54,
            num_classes: 5,
            conv1_filters: 64,
            conv2_filters: 128,
            kernel_size: 3,
            pool_size: 2,
            lstm1_hidden: 128,
            lstm2_hidden: 64,
            lstm3_hidden: 32,
            fc_size: 32,
            dropout: 0.3,
        }
    }
}

/// Training loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Epoch budget; early stopping usually ends the run sooner.
    pub num_epochs: usize,
    /// Rows per batch.
    pub batch_size: usize,
    /// Adam learning rate.
    pub learning_rate: f64,
    /// Epochs without validation improvement before stopping.
    pub patience: usize,
    /// Minimum validation-accuracy gain that counts as improvement.
    pub min_delta: f64,
    /// Weight the loss by inverse class frequency.
    pub use_class_weights: bool,
    /// Bounded shuffle-buffer size for the training split.
    pub shuffle_buffer: usize,
    /// Base seed for the per-epoch shuffle.
    pub seed: u64,
    /// Log every N batches within an epoch.
    pub log_interval: usize,
    /// Normalization family fit on the training split.
    pub normalization: NormalizationMethod,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            num_epochs: 1000,
            batch_size: 32,
            learning_rate: 5e-4,
            patience: 25,
            min_delta: 1e-3,
            use_class_weights: true,
            shuffle_buffer: 10_000,
            seed: 42,
            log_interval: 10,
            normalization: NormalizationMethod::ZScore,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ModelConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_configs_are_rejected() {
        let mut config = ModelConfig::default();
        config.num_classes = 1;
        assert!(config.validate().is_err());

        let mut config = ModelConfig::default();
        config.dropout = 1.5;
        assert!(config.validate().is_err());
    }
}
