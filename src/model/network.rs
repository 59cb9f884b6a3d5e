//! CNN-LSTM classifier architecture.
//!
//! Each sample enters as a single frame of `num_features` values, laid out
//! channels-first as `[batch, features, 1]`. Two convolution + pooling
//! stages extract local feature interactions, two bidirectional LSTMs and a
//! final unidirectional LSTM model context, and a dense head with dropout
//! projects onto the diagnostic classes.

use burn::{
    module::Module,
    nn::{
        conv::{Conv1d, Conv1dConfig},
        pool::{MaxPool1d, MaxPool1dConfig},
        BiLstm, BiLstmConfig, Dropout, DropoutConfig, Linear, LinearConfig, Lstm, LstmConfig,
        PaddingConfig1d, Relu,
    },
    tensor::{activation::softmax, backend::Backend, Tensor},
};

use super::config::ModelConfig;

/// CNN + bidirectional-LSTM diagnostic classifier.
#[derive(Module, Debug)]
pub struct EegClassifier<B: Backend> {
    conv1: Conv1d<B>,
    conv2: Conv1d<B>,
    pool1: MaxPool1d,
    pool2: MaxPool1d,
    bilstm1: BiLstm<B>,
    bilstm2: BiLstm<B>,
    lstm: Lstm<B>,
    fc1: Linear<B>,
    fc2: Linear<B>,
    dropout: Dropout,
    activation: Relu,
}

impl<B: Backend> EegClassifier<B> {
    pub fn new(device: &B::Device, config: &ModelConfig) -> Self {
        let conv1 = Conv1dConfig::new(
            config.num_features,
            config.conv1_filters,
            config.kernel_size,
        )
        .with_padding(PaddingConfig1d::Same)
        .init(device);

        let conv2 = Conv1dConfig::new(
            config.conv1_filters,
            config.conv2_filters,
            config.kernel_size,
        )
        .with_padding(PaddingConfig1d::Same)
        .init(device);

        let pool1 = MaxPool1dConfig::new(config.pool_size)
            .with_padding(PaddingConfig1d::Same)
            .init();
        let pool2 = MaxPool1dConfig::new(config.pool_size)
            .with_padding(PaddingConfig1d::Same)
            .init();

        let bilstm1 = BiLstmConfig::new(config.conv2_filters, config.lstm1_hidden, true).init(device);
        let bilstm2 =
            BiLstmConfig::new(config.lstm1_hidden * 2, config.lstm2_hidden, true).init(device);
        let lstm = LstmConfig::new(config.lstm2_hidden * 2, config.lstm3_hidden, true).init(device);

        let fc1 = LinearConfig::new(config.lstm3_hidden, config.fc_size).init(device);
        let fc2 = LinearConfig::new(config.fc_size, config.num_classes).init(device);
        let dropout = DropoutConfig::new(config.dropout).init();

        Self {
            conv1,
            conv2,
            pool1,
            pool2,
            bilstm1,
            bilstm2,
            lstm,
            fc1,
            fc2,
            dropout,
            activation: Relu::new(),
        }
    }

    /// Forward pass producing class logits.
    ///
    /// `x` has shape `[batch, features, 1]`; output is `[batch, classes]`.
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 2> {
        let x = self.conv1.forward(x);
        let x = self.activation.forward(x);
        let x = self.pool1.forward(x);

        let x = self.conv2.forward(x);
        let x = self.activation.forward(x);
        let x = self.pool2.forward(x);

        // [batch, channels, steps] -> [batch, steps, channels] for the LSTMs.
        let x = x.swap_dims(1, 2);
        let (x, _) = self.bilstm1.forward(x, None);
        let (x, _) = self.bilstm2.forward(x, None);
        let (x, _) = self.lstm.forward(x, None);

        // Keep the last timestep of the hidden sequence.
        let [batch, steps, hidden] = x.dims();
        let x: Tensor<B, 2> = x
            .slice([0..batch, steps - 1..steps, 0..hidden])
            .reshape([batch, hidden]);

        let x = self.fc1.forward(x);
        let x = self.activation.forward(x);
        let x = self.dropout.forward(x);

        self.fc2.forward(x)
    }

    /// Class probability distribution per sample.
    pub fn predict_proba(&self, x: Tensor<B, 3>) -> Tensor<B, 2> {
        softmax(self.forward(x), 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_forward_shape() {
        let device = Default::default();
        let config = ModelConfig::new(19, 4);
        let model: EegClassifier<TestBackend> = EegClassifier::new(&device, &config);

        let input = Tensor::<TestBackend, 3>::zeros([8, 19, 1], &device);
        let logits = model.forward(input);
        assert_eq!(logits.dims(), [8, 4]);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let device = Default::default();
        let config = ModelConfig::new(6, 3);
        let model: EegClassifier<TestBackend> = EegClassifier::new(&device, &config);

        let input = Tensor::<TestBackend, 3>::ones([2, 6, 1], &device);
        let probs = model.predict_proba(input);
        let sums: Vec<f32> = probs.sum_dim(1).into_data().iter::<f32>().collect();
        for sum in sums {
            assert!((sum - 1.0).abs() < 1e-5);
        }
    }
}
