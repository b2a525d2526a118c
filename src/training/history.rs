use crate::error::{Result, TrainError};
use crate::model::StepMetrics;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Per-step metrics of one phase (training or validation) of one epoch.
#[derive(Debug, Default, Clone)]
pub struct PhaseMetrics {
    losses: Vec<f64>,
    accuracies: Vec<f64>,
}

impl PhaseMetrics {
    pub fn record(&mut self, step: StepMetrics) {
        self.losses.push(step.loss);
        self.accuracies.push(step.accuracy);
    }

    pub fn steps(&self) -> usize {
        self.losses.len()
    }

    /// Arithmetic mean of the recorded `(loss, accuracy)` values.
    pub fn mean(&self) -> Result<StepMetrics> {
        Ok(StepMetrics {
            loss: mean(&self.losses)?,
            accuracy: mean(&self.accuracies)?,
        })
    }
}

pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(TrainError::Config(
            "cannot average a phase with no recorded steps".into(),
        ));
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// One epoch's averaged metrics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochSummary {
    pub epoch: usize,
    pub loss: f64,
    pub accuracy: f64,
    pub val_loss: f64,
    pub val_accuracy: f64,
}

impl EpochSummary {
    pub fn from_phases(epoch: usize, train: &PhaseMetrics, val: &PhaseMetrics) -> Result<Self> {
        let t = train.mean()?;
        let v = val.mean()?;
        Ok(Self {
            epoch,
            loss: t.loss,
            accuracy: t.accuracy,
            val_loss: v.loss,
            val_accuracy: v.accuracy,
        })
    }
}

/// Metric name -> per-epoch values. Grows by one entry per metric per
/// completed epoch and never shrinks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpochHistory {
    pub loss: Vec<f64>,
    pub accuracy: Vec<f64>,
    pub val_loss: Vec<f64>,
    pub val_accuracy: Vec<f64>,
}

impl EpochHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, summary: &EpochSummary) {
        self.loss.push(summary.loss);
        self.accuracy.push(summary.accuracy);
        self.val_loss.push(summary.val_loss);
        self.val_accuracy.push(summary.val_accuracy);
    }

    pub fn epochs(&self) -> usize {
        self.val_loss.len()
    }

    pub fn is_empty(&self) -> bool {
        self.val_loss.is_empty()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn phase(values: &[(f64, f64)]) -> PhaseMetrics {
        let mut phase = PhaseMetrics::default();
        for &(loss, accuracy) in values {
            phase.record(StepMetrics { loss, accuracy });
        }
        phase
    }

    #[test]
    fn epoch_accuracy_is_the_step_mean() {
        let train = phase(&[(0.3, 0.8), (0.2, 0.6), (0.1, 1.0)]);
        let m = train.mean().unwrap();
        assert_relative_eq!(m.accuracy, 0.8, epsilon = 1e-12);
        assert_relative_eq!(m.loss, 0.2, epsilon = 1e-12);
    }

    #[test]
    fn empty_phase_cannot_be_averaged() {
        assert!(PhaseMetrics::default().mean().is_err());
    }

    #[test]
    fn history_grows_one_entry_per_metric() {
        let mut history = EpochHistory::new();
        let summary = EpochSummary::from_phases(
            1,
            &phase(&[(0.7, 0.5)]),
            &phase(&[(0.6, 0.25), (0.8, 0.75)]),
        )
        .unwrap();
        history.push(&summary);

        assert_eq!(history.epochs(), 1);
        assert_eq!(history.loss, vec![0.7]);
        assert_relative_eq!(history.val_loss[0], 0.7, epsilon = 1e-12);
        assert_relative_eq!(history.val_accuracy[0], 0.5, epsilon = 1e-12);
        assert_eq!(history.accuracy.len(), history.val_accuracy.len());
    }

    #[test]
    fn saves_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let mut history = EpochHistory::new();
        history.loss.push(1.0);
        history.save(&path).unwrap();

        let loaded: EpochHistory =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, history);
    }
}
