use crate::data::{ImageLoader, PairBatchGenerator, Sample};
use crate::detection::{DetectionAdapter, ObjectDetector};
use crate::error::Result;
use crate::model::PairModel;
use crate::training::checkpoint::{CheckpointManager, BEST, FINAL, INTERRUPTED};
use crate::training::config::{ProgressMode, StepPlan, TrainingConfig};
use crate::training::early_stopping::EarlyStopping;
use crate::training::history::{EpochHistory, EpochSummary, PhaseMetrics};
use crate::training::plot::plot_history;
use crate::training::progress::{BarProgress, NoProgress, ProgressReporter, TextProgress};
use crate::training::signal::StopSignal;
use std::path::PathBuf;
use std::time::Instant;

/// What the run loop does after an epoch (or a phase) returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpochOutcome {
    Continue,
    StopEarly,
    Interrupted,
    Done,
}

/// Mutable run state, owned by [`Trainer::run`] and lent to each epoch.
#[derive(Debug, Default)]
pub struct TrainingState {
    pub history: EpochHistory,
    pub epochs_completed: usize,
}

#[derive(Debug)]
pub struct TrainingReport {
    pub outcome: EpochOutcome,
    pub epochs_completed: usize,
    pub history: EpochHistory,
    /// Directory of the last checkpoint written, if any.
    pub checkpoint: Option<PathBuf>,
}

pub fn progress_for(mode: ProgressMode) -> Box<dyn ProgressReporter> {
    match mode {
        ProgressMode::Bar => Box::new(BarProgress::new()),
        ProgressMode::Text => Box::new(TextProgress::stdout()),
        ProgressMode::None => Box::new(NoProgress),
    }
}

/// Drives training and validation epochs, early stopping and checkpointing.
pub struct Trainer<M, D, L>
where
    M: PairModel,
    D: ObjectDetector,
    L: ImageLoader,
{
    pub model: M,
    config: TrainingConfig,
    adapter: DetectionAdapter<D>,
    loader: L,
    checkpoints: CheckpointManager,
    early_stopping: EarlyStopping,
    progress: Box<dyn ProgressReporter>,
    stop: StopSignal,
}

impl<M, D, L> Trainer<M, D, L>
where
    M: PairModel,
    D: ObjectDetector,
    L: ImageLoader,
{
    pub fn new(model: M, config: TrainingConfig, detector: D, loader: L, stop: StopSignal) -> Self {
        let adapter =
            DetectionAdapter::new(detector, config.detection_request(), config.num_classes);
        let checkpoints = CheckpointManager::new(
            config.save_dir.clone(),
            config.model_config(),
            config.image_size,
        );
        let early_stopping =
            EarlyStopping::new(config.patience, config.min_delta, config.early_stop_rule);
        let progress = progress_for(config.progress);

        Self {
            model,
            config,
            adapter,
            loader,
            checkpoints,
            early_stopping,
            progress,
            stop,
        }
    }

    pub fn with_progress(mut self, progress: Box<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Train on `train`, validate on `test`, until the epoch budget runs out,
    /// early stopping fires or the stop signal is raised.
    ///
    /// A failing step aborts the run with its error.
    pub fn run(&mut self, train: &[Sample], test: &[Sample]) -> Result<TrainingReport> {
        let plan = self.config.plan(train.len(), test.len())?;
        std::fs::create_dir_all(self.checkpoints.save_dir())?;

        log::info!(
            "Training {} epochs: {} train steps, {} validation steps, batch size {}",
            self.config.epochs,
            plan.train_steps,
            plan.validation_steps,
            self.config.batch_size
        );

        let mut state = TrainingState::default();
        let mut outcome = EpochOutcome::Done;

        for epoch in 1..=self.config.epochs {
            let epoch_start = Instant::now();
            outcome = self.run_epoch(epoch, &plan, train, test, &mut state)?;
            log::info!(
                "Epoch {} took {:.2}s",
                epoch,
                epoch_start.elapsed().as_secs_f32()
            );
            if outcome != EpochOutcome::Continue {
                break;
            }
        }

        let checkpoint = match outcome {
            EpochOutcome::Interrupted => self.save_interrupted(),
            _ => Some(self.checkpoints.save(&self.model, FINAL)?),
        };

        let history_path = self.checkpoints.save_dir().join("history.json");
        if let Err(e) = state.history.save(&history_path) {
            log::error!("Failed to write {}: {}", history_path.display(), e);
        }
        if !state.history.is_empty() {
            let plot_path = self.checkpoints.save_dir().join("history.png");
            if let Err(e) = plot_history(&state.history, &plot_path) {
                log::error!("Failed to plot {}: {}", plot_path.display(), e);
            }
        }

        Ok(TrainingReport {
            outcome,
            epochs_completed: state.epochs_completed,
            history: state.history,
            checkpoint,
        })
    }

    /// Best-effort save after an interruption; failures are only logged.
    fn save_interrupted(&mut self) -> Option<PathBuf> {
        match self.checkpoints.save(&self.model, INTERRUPTED) {
            Ok(dir) => {
                println!("Training interrupted. Model saved to {}", dir.display());
                Some(dir)
            }
            Err(e) => {
                log::error!("Failed to save interrupted checkpoint: {}", e);
                None
            }
        }
    }

    fn run_epoch(
        &mut self,
        epoch: usize,
        plan: &StepPlan,
        train: &[Sample],
        test: &[Sample],
        state: &mut TrainingState,
    ) -> Result<EpochOutcome> {
        let total = self.config.epochs;

        let mut train_metrics = PhaseMetrics::default();
        if self.train_phase(epoch, plan.train_steps, train, &mut train_metrics)?
            == EpochOutcome::Interrupted
        {
            return Ok(EpochOutcome::Interrupted);
        }

        let mut val_metrics = PhaseMetrics::default();
        if self.validation_phase(epoch, plan.validation_steps, test, &mut val_metrics)?
            == EpochOutcome::Interrupted
        {
            return Ok(EpochOutcome::Interrupted);
        }

        let summary = EpochSummary::from_phases(epoch, &train_metrics, &val_metrics)?;
        state.history.push(&summary);
        state.epochs_completed = epoch;

        println!(
            "Epoch {}/{}, Loss: {:.4}, Validation Loss: {:.4}, Accuracy: {:.4}, Validation Accuracy: {:.4}",
            epoch, total, summary.loss, summary.val_loss, summary.accuracy, summary.val_accuracy
        );

        if self.early_stopping.update_best(summary.val_loss) && self.config.save_best {
            log::info!("Validation loss improved to {:.4}", summary.val_loss);
            if let Err(e) = self.checkpoints.save(&self.model, BEST) {
                log::error!("Failed to save best checkpoint: {}", e);
            }
        }

        if self.early_stopping.should_stop(&state.history.val_loss) {
            println!(
                "Stopping early at epoch {}: validation loss window of {} epochs met the {:?} rule",
                epoch,
                self.early_stopping.patience() + 1,
                self.config.early_stop_rule
            );
            return Ok(EpochOutcome::StopEarly);
        }

        if epoch >= total {
            Ok(EpochOutcome::Done)
        } else {
            Ok(EpochOutcome::Continue)
        }
    }

    fn train_phase(
        &mut self,
        epoch: usize,
        steps: usize,
        samples: &[Sample],
        metrics: &mut PhaseMetrics,
    ) -> Result<EpochOutcome> {
        let mut generator = PairBatchGenerator::new(samples, self.config.batch_size, &self.loader)?;
        self.progress.begin(
            &format!("Training Epoch {}/{}", epoch, self.config.epochs),
            steps,
        );

        for step in 0..steps {
            if self.stop.is_triggered() {
                self.progress.finish();
                log::warn!("Interrupted during training epoch {} at step {}", epoch, step);
                return Ok(EpochOutcome::Interrupted);
            }

            let batch = self.adapter.enrich(generator.next_batch()?)?;
            metrics.record(self.model.train_step(&batch)?);
            self.progress.advance(step + 1);
        }

        self.progress.finish();
        Ok(EpochOutcome::Continue)
    }

    fn validation_phase(
        &mut self,
        epoch: usize,
        steps: usize,
        samples: &[Sample],
        metrics: &mut PhaseMetrics,
    ) -> Result<EpochOutcome> {
        let mut generator = PairBatchGenerator::new(samples, self.config.batch_size, &self.loader)?;
        self.progress.begin(
            &format!("Validation Epoch {}/{}", epoch, self.config.epochs),
            steps,
        );

        for step in 0..steps {
            if self.stop.is_triggered() {
                self.progress.finish();
                log::warn!("Interrupted during validation epoch {} at step {}", epoch, step);
                return Ok(EpochOutcome::Interrupted);
            }

            let batch = self.adapter.enrich(generator.next_batch()?)?;
            metrics.record(self.model.eval_step(&batch)?);
            self.progress.advance(step + 1);
        }

        self.progress.finish();
        Ok(EpochOutcome::Continue)
    }
}
