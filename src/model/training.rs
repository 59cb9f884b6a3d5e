//! Training loop and evaluation for the CNN-LSTM classifier.

use burn::{
    module::{AutodiffModule, Module},
    optim::{AdamConfig, GradientsParams, Optimizer},
    tensor::{
        activation::log_softmax,
        backend::{AutodiffBackend, Backend},
        ElementConversion, Int, Tensor, TensorData,
    },
};
use ndarray::Array2;
use tracing::{debug, info, warn};

use super::config::TrainingConfig;
use super::network::EegClassifier;
use crate::data::{BatchIter, CsvBatchReader, NormStats, ShuffleConfig, Split, SplitPlan};
use crate::error::PipelineError;
use crate::metrics::{ClassificationReport, ConfusionMatrix};

/// Per-epoch training history and the early-stopping outcome.
#[derive(Debug, Clone, Default)]
pub struct TrainingResult {
    pub train_losses: Vec<f32>,
    pub val_losses: Vec<f32>,
    pub train_accuracies: Vec<f32>,
    pub val_accuracies: Vec<f32>,
    pub best_epoch: usize,
    pub best_accuracy: f32,
    pub epochs_run: usize,
}

/// Metrics from one evaluation pass.
#[derive(Debug, Clone)]
pub struct EvaluationMetrics {
    pub accuracy: f32,
    pub loss: f32,
    pub report: ClassificationReport,
    pub confusion: ConfusionMatrix,
}

/// Fit the classifier on the training split with validation monitoring.
///
/// Every epoch streams a fresh pass over the training range with a seeded
/// bounded shuffle (seed varies by epoch, so runs are reproducible while
/// batch composition still changes). When the validation split is empty the
/// loop runs the full epoch budget and the final weights are returned.
pub fn train_model<B: AutodiffBackend>(
    mut model: EegClassifier<B>,
    reader: &CsvBatchReader,
    plan: &SplitPlan,
    stats: &NormStats,
    class_weights: &[f32],
    config: &TrainingConfig,
    device: &B::Device,
) -> Result<(EegClassifier<B>, TrainingResult), PipelineError> {
    let num_classes = class_weights.len();
    let has_validation = !plan.is_empty(Split::Validation);
    info!(
        epochs = config.num_epochs,
        train_rows = plan.rows(Split::Train),
        val_rows = plan.rows(Split::Validation),
        "starting training"
    );
    info!(?class_weights, "class weights");
    if !has_validation {
        warn!("validation split is empty; early stopping disabled");
    }

    let mut optimizer = AdamConfig::new().init();
    let mut result = TrainingResult::default();
    let mut patience_counter = 0usize;

    for epoch in 0..config.num_epochs {
        let shuffle = ShuffleConfig {
            buffer_size: config.shuffle_buffer,
            seed: config.seed.wrapping_add(epoch as u64),
        };
        let train_stream = reader.split_batches(plan, Split::Train, Some(shuffle))?;

        let mut loss_sum = 0.0f32;
        let mut correct = 0usize;
        let mut total = 0usize;
        let mut batch_count = 0usize;

        for batch in train_stream {
            let batch = batch?;
            let normalized = stats.apply(&batch.features);
            let features = features_to_tensor::<B>(&normalized, device);
            let targets = labels_to_tensor::<B>(&batch.labels, device);

            let logits = model.forward(features);
            let loss = weighted_cross_entropy(logits.clone(), targets, class_weights, device);

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optimizer.step(config.learning_rate, model, grads);

            let predicted: Vec<i64> = logits.argmax(1).into_data().iter::<i64>().collect();
            correct += predicted
                .iter()
                .zip(&batch.labels)
                .filter(|(&p, &t)| p as usize == t)
                .count();
            total += batch.len();
            loss_sum += loss.into_scalar().elem::<f32>();
            batch_count += 1;

            if batch_count % config.log_interval == 0 {
                debug!(
                    epoch,
                    batch = batch_count,
                    loss = loss_sum / batch_count as f32,
                    "training progress"
                );
            }
        }

        let train_loss = loss_sum / batch_count.max(1) as f32;
        let train_acc = correct as f32 / total.max(1) as f32;
        result.train_losses.push(train_loss);
        result.train_accuracies.push(train_acc);
        result.epochs_run = epoch + 1;

        if has_validation {
            // Score on the inner module so dropout stays inactive.
            let val_stream = reader.split_batches(plan, Split::Validation, None)?;
            let val = evaluate(&model.valid(), val_stream, stats, num_classes, device)?;
            result.val_losses.push(val.loss);
            result.val_accuracies.push(val.accuracy);

            info!(
                epoch = epoch + 1,
                total_epochs = config.num_epochs,
                train_loss,
                train_acc,
                val_loss = val.loss,
                val_acc = val.accuracy,
                "epoch finished"
            );

            if val.accuracy > result.best_accuracy + config.min_delta as f32 {
                result.best_accuracy = val.accuracy;
                result.best_epoch = epoch;
                patience_counter = 0;
            } else {
                patience_counter += 1;
                if patience_counter >= config.patience {
                    info!(epoch = epoch + 1, "early stopping");
                    break;
                }
            }
        } else {
            info!(
                epoch = epoch + 1,
                total_epochs = config.num_epochs,
                train_loss,
                train_acc,
                "epoch finished"
            );
            result.best_epoch = epoch;
            result.best_accuracy = train_acc;
        }
    }

    info!(
        best_accuracy = result.best_accuracy,
        best_epoch = result.best_epoch,
        epochs_run = result.epochs_run,
        "training completed"
    );

    Ok((model, result))
}

/// Evaluate the model over one batch stream.
pub fn evaluate<B: Backend>(
    model: &EegClassifier<B>,
    batches: BatchIter,
    stats: &NormStats,
    num_classes: usize,
    device: &B::Device,
) -> Result<EvaluationMetrics, PipelineError> {
    let uniform = vec![1.0f32; num_classes];
    let mut y_true = Vec::new();
    let mut y_pred = Vec::new();
    let mut loss_sum = 0.0f32;
    let mut batch_count = 0usize;

    for batch in batches {
        let batch = batch?;
        let normalized = stats.apply(&batch.features);
        let features = features_to_tensor::<B>(&normalized, device);
        let targets = labels_to_tensor::<B>(&batch.labels, device);

        let logits = model.forward(features);
        let loss = weighted_cross_entropy(logits.clone(), targets, &uniform, device);
        loss_sum += loss.into_scalar().elem::<f32>();
        batch_count += 1;

        let predicted: Vec<i64> = logits.argmax(1).into_data().iter::<i64>().collect();
        y_pred.extend(predicted.into_iter().map(|p| p as usize));
        y_true.extend(batch.labels);
    }

    let report = ClassificationReport::compute(&y_true, &y_pred);
    let confusion = ConfusionMatrix::compute(&y_true, &y_pred);
    Ok(EvaluationMetrics {
        accuracy: report.accuracy,
        loss: loss_sum / batch_count.max(1) as f32,
        report,
        confusion,
    })
}

/// Convert a normalized `[rows, features]` block into the model's
/// `[batch, features, 1]` input layout.
pub(crate) fn features_to_tensor<B: Backend>(
    features: &Array2<f32>,
    device: &B::Device,
) -> Tensor<B, 3> {
    let (rows, cols) = features.dim();
    let data: Vec<f32> = features.iter().copied().collect();
    Tensor::from_data(TensorData::new(data, [rows, cols, 1]), device)
}

pub(crate) fn labels_to_tensor<B: Backend>(labels: &[usize], device: &B::Device) -> Tensor<B, 1, Int> {
    let data: Vec<i64> = labels.iter().map(|&l| l as i64).collect();
    Tensor::from_data(TensorData::new(data, [labels.len()]), device)
}

/// Cross-entropy over logits with per-class weights.
fn weighted_cross_entropy<B: Backend>(
    logits: Tensor<B, 2>,
    targets: Tensor<B, 1, Int>,
    class_weights: &[f32],
    device: &B::Device,
) -> Tensor<B, 1> {
    let log_probs = log_softmax(logits, 1);

    // Log-probability of each sample's true class.
    let targets_2d = targets.clone().unsqueeze_dim(1);
    let selected: Tensor<B, 1> = log_probs.gather(1, targets_2d).squeeze(1);

    let weights = Tensor::<B, 1>::from_data(
        TensorData::new(class_weights.to_vec(), [class_weights.len()]),
        device,
    );
    let sample_weights = weights.select(0, targets);

    selected.neg().mul(sample_weights).mean()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;
    use ndarray::array;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_tensor_conversion_layout() {
        let device = Default::default();
        let features = array![[1.0_f32, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let tensor = features_to_tensor::<TestBackend>(&features, &device);
        assert_eq!(tensor.dims(), [3, 2, 1]);

        let values: Vec<f32> = tensor.into_data().iter::<f32>().collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_weighted_loss_prefers_correct_class() {
        let device = Default::default();
        let confident = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(vec![5.0_f32, 0.0, 0.0, 5.0], [2, 2]),
            &device,
        );
        let wrong = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(vec![0.0_f32, 5.0, 5.0, 0.0], [2, 2]),
            &device,
        );
        let targets = labels_to_tensor::<TestBackend>(&[0, 1], &device);

        let good = weighted_cross_entropy(confident, targets.clone(), &[1.0, 1.0], &device)
            .into_scalar()
            .elem::<f32>();
        let bad = weighted_cross_entropy(wrong, targets, &[1.0, 1.0], &device)
            .into_scalar()
            .elem::<f32>();
        assert!(good < bad);
    }

    #[test]
    fn test_class_weights_scale_the_loss() {
        let device = Default::default();
        let logits = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(vec![1.0_f32, 0.0], [1, 2]),
            &device,
        );
        let targets = labels_to_tensor::<TestBackend>(&[0], &device);

        let unit = weighted_cross_entropy(logits.clone(), targets.clone(), &[1.0, 1.0], &device)
            .into_scalar()
            .elem::<f32>();
        let doubled = weighted_cross_entropy(logits, targets, &[2.0, 1.0], &device)
            .into_scalar()
            .elem::<f32>();
        assert!((doubled - 2.0 * unit).abs() < 1e-6);
    }
}
