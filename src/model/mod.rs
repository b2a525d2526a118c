pub mod blocks;
pub mod learner;
pub mod siamese;

pub use learner::{adam_learner, binary_cross_entropy, load_model, score_batch, SiameseLearner};
pub use siamese::{SiameseNet, SiameseNetConfig};

use crate::detection::EnrichedBatch;
use crate::error::Result;
use std::path::Path;

/// Probability at or above which a pair is predicted to be in order.
pub const DECISION_THRESHOLD: f32 = 0.5;

/// Loss and accuracy of a single training or validation step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepMetrics {
    pub loss: f64,
    pub accuracy: f64,
}

/// The trainable pair scorer the training loop drives.
pub trait PairModel {
    /// Forward pass, loss, gradient update.
    fn train_step(&mut self, batch: &EnrichedBatch) -> Result<StepMetrics>;

    /// Forward pass and loss only. Parameters are left untouched.
    fn eval_step(&self, batch: &EnrichedBatch) -> Result<StepMetrics>;

    /// Persist the current parameters under `path`.
    fn save(&self, path: &Path) -> Result<()>;
}

/// Fraction of pairs whose thresholded score matches the label.
pub fn batch_accuracy(scores: &[f32], labels: &[u8]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    let correct = scores
        .iter()
        .zip(labels)
        .filter(|(&score, &label)| u8::from(score >= DECISION_THRESHOLD) == label)
        .count();
    correct as f64 / labels.len() as f64
}
