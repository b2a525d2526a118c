use super::siamese::{SiameseNet, SiameseNetConfig};
use super::{batch_accuracy, PairModel, StepMetrics};
use crate::detection::EnrichedBatch;
use crate::error::{Result, TrainError};
use burn::module::AutodiffModule;
use burn::optim::decay::WeightDecayConfig;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::record::{BinFileRecorder, FullPrecisionSettings, Recorder};
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::ElementConversion;
use std::path::Path;

/// Probabilities are clamped to `[EPSILON, 1 - EPSILON]` before the log.
const EPSILON: f32 = 1e-7;

/// Mean binary cross-entropy between `[N, 1]` probabilities and targets.
pub fn binary_cross_entropy<B: Backend>(scores: Tensor<B, 2>, targets: Tensor<B, 2>) -> Tensor<B, 1> {
    let p = scores.clamp(EPSILON, 1.0 - EPSILON);
    let pos = targets.clone() * p.clone().log();
    let neg = (targets.neg() + 1.0) * (p.neg() + 1.0).log();
    (pos + neg).mean().neg()
}

fn targets<B: Backend>(batch: &EnrichedBatch, device: &B::Device) -> Tensor<B, 2> {
    Tensor::<B, 2>::from_data(TensorData::new(batch.labels_f32(), [batch.len(), 1]), device)
}

fn scores_to_vec<B: Backend>(scores: Tensor<B, 2>) -> Result<Vec<f32>> {
    scores
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| TrainError::Model(format!("failed to read scores: {:?}", e)))
}

/// Evaluate `model` on a batch without touching any optimizer state.
fn evaluate<B: Backend>(
    model: &SiameseNet<B>,
    batch: &EnrichedBatch,
    device: &B::Device,
) -> Result<StepMetrics> {
    let scores = model.forward_batch(batch, device);
    let loss = binary_cross_entropy(scores.clone(), targets::<B>(batch, device));
    let loss = loss.into_scalar().elem::<f32>();
    let scores = scores_to_vec(scores)?;

    Ok(StepMetrics {
        loss: loss as f64,
        accuracy: batch_accuracy(&scores, &batch.batch.labels),
    })
}

/// `SiameseNet` plus optimizer, driven by the training loop.
pub struct SiameseLearner<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<SiameseNet<B>, B>,
{
    pub model: SiameseNet<B>,
    optimizer: O,
    learning_rate: f64,
    device: B::Device,
}

impl<B, O> SiameseLearner<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<SiameseNet<B>, B>,
{
    pub fn new(model: SiameseNet<B>, optimizer: O, learning_rate: f64, device: B::Device) -> Self {
        Self {
            model,
            optimizer,
            learning_rate,
            device,
        }
    }

    /// Score a batch with the current parameters.
    pub fn score(&self, batch: &EnrichedBatch) -> Result<Vec<f32>> {
        let device = <B::InnerBackend as Backend>::Device::default();
        score_batch(&self.model.valid(), batch, &device)
    }
}

/// Learner with an Adam optimizer. A frozen encoder receives no gradients.
pub fn adam_learner<B: AutodiffBackend>(
    device: &B::Device,
    config: &SiameseNetConfig,
    learning_rate: f64,
    weight_decay: f64,
    freeze_encoder: bool,
) -> SiameseLearner<B, impl Optimizer<SiameseNet<B>, B>> {
    let mut model = SiameseNet::<B>::new(device, config);
    if freeze_encoder {
        log::info!("Freezing image encoder parameters");
        model.encoder = model.encoder.no_grad();
    }

    let mut adam = AdamConfig::new();
    if weight_decay > 0.0 {
        adam = adam.with_weight_decay(Some(WeightDecayConfig::new(weight_decay)));
    }
    let optimizer = adam.init::<B, SiameseNet<B>>();

    SiameseLearner::new(model, optimizer, learning_rate, device.clone())
}

impl<B, O> PairModel for SiameseLearner<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<SiameseNet<B>, B>,
{
    fn train_step(&mut self, batch: &EnrichedBatch) -> Result<StepMetrics> {
        let scores = self.model.forward_batch(batch, &self.device);
        let loss = binary_cross_entropy(scores.clone(), targets::<B>(batch, &self.device));

        let loss_value = loss.clone().into_scalar().elem::<f32>();
        let accuracy = batch_accuracy(&scores_to_vec(scores)?, &batch.batch.labels);

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.model);
        self.model = self
            .optimizer
            .step(self.learning_rate, self.model.clone(), grads);

        Ok(StepMetrics {
            loss: loss_value as f64,
            accuracy,
        })
    }

    fn eval_step(&self, batch: &EnrichedBatch) -> Result<StepMetrics> {
        let model = self.model.valid();
        let device = <B::InnerBackend as Backend>::Device::default();
        evaluate(&model, batch, &device)
    }

    fn save(&self, path: &Path) -> Result<()> {
        BinFileRecorder::<FullPrecisionSettings>::new()
            .record(self.model.clone().into_record(), path.to_path_buf())
            .map_err(|e| TrainError::Checkpoint {
                name: path.display().to_string(),
                message: format!("{:?}", e),
            })
    }
}

/// Restore a `SiameseNet` written by [`PairModel::save`].
pub fn load_model<B: Backend>(
    path: &Path,
    config: &SiameseNetConfig,
    device: &B::Device,
) -> Result<SiameseNet<B>> {
    let record = BinFileRecorder::<FullPrecisionSettings>::new()
        .load(path.to_path_buf(), device)
        .map_err(|e| TrainError::Checkpoint {
            name: path.display().to_string(),
            message: format!("{:?}", e),
        })?;
    Ok(SiameseNet::new(device, config).load_record(record))
}

/// Score every pair of a batch with a loaded model.
pub fn score_batch<B: Backend>(
    model: &SiameseNet<B>,
    batch: &EnrichedBatch,
    device: &B::Device,
) -> Result<Vec<f32>> {
    scores_to_vec(model.forward_batch(batch, device))
}
