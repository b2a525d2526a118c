use crate::detection::{DetectionRequest, DEFAULT_CONF_THRESHOLD, DEFAULT_DETECTION_IMG_SIZE};
use crate::error::{Result, TrainError};
use crate::model::SiameseNetConfig;
use crate::training::early_stopping::EarlyStopRule;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProgressMode {
    #[default]
    Bar,
    Text,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    // Dataset
    pub manifest_path: PathBuf,
    pub image_size: usize,
    pub num_classes: usize,

    // Training
    pub epochs: usize,
    pub batch_size: usize,
    /// Defaults to `train_len / batch_size`.
    pub steps_per_epoch: Option<usize>,
    /// Defaults to `test_len / batch_size`.
    pub validation_steps: Option<usize>,
    pub learning_rate: f64,
    pub weight_decay: f64,

    // Model
    pub embedding_channels: usize,
    pub freeze_encoder: bool,

    // Detection
    pub detection_conf: f32,
    pub detection_img_size: usize,
    /// Directory of exported detection label files; beside the images when unset.
    pub detections_dir: Option<PathBuf>,

    // Early stopping
    pub patience: usize,
    pub min_delta: f64,
    pub early_stop_rule: EarlyStopRule,

    // Checkpointing
    pub save_dir: PathBuf,
    pub save_best: bool,

    pub progress: ProgressMode,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            manifest_path: PathBuf::from("data.json"),
            image_size: 299,
            num_classes: crate::data::DEFAULT_NUM_CLASSES,
            epochs: 30,
            batch_size: 32,
            steps_per_epoch: None,
            validation_steps: None,
            learning_rate: 0.001,
            weight_decay: 0.0,
            embedding_channels: 32,
            freeze_encoder: false,
            detection_conf: DEFAULT_CONF_THRESHOLD,
            detection_img_size: DEFAULT_DETECTION_IMG_SIZE,
            detections_dir: None,
            patience: 3,
            min_delta: 0.0,
            early_stop_rule: EarlyStopRule::default(),
            save_dir: PathBuf::from("runs/siamese"),
            save_best: true,
            progress: ProgressMode::default(),
        }
    }
}

/// Step counts resolved against the dataset sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPlan {
    pub train_steps: usize,
    pub validation_steps: usize,
}

impl TrainingConfig {
    pub fn from_yaml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: TrainingConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn model_config(&self) -> SiameseNetConfig {
        SiameseNetConfig {
            num_classes: self.num_classes,
            embedding_channels: self.embedding_channels,
        }
    }

    pub fn detection_request(&self) -> DetectionRequest {
        DetectionRequest {
            conf_threshold: self.detection_conf,
            img_size: self.detection_img_size,
        }
    }

    /// Check the configuration against the dataset before any step runs.
    ///
    /// Every phase must run at least one step, otherwise the epoch averages
    /// would divide by zero.
    pub fn plan(&self, train_len: usize, test_len: usize) -> Result<StepPlan> {
        if self.epochs == 0 {
            return Err(TrainError::Config("epochs must be positive".into()));
        }
        if self.batch_size == 0 {
            return Err(TrainError::Config("batch_size must be positive".into()));
        }
        if self.image_size == 0 {
            return Err(TrainError::Config("image_size must be positive".into()));
        }
        if self.num_classes == 0 {
            return Err(TrainError::Config("num_classes must be positive".into()));
        }
        if self.embedding_channels == 0 {
            return Err(TrainError::Config("embedding_channels must be positive".into()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(TrainError::Config(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(self.weight_decay.is_finite() && self.weight_decay >= 0.0) {
            return Err(TrainError::Config(format!(
                "weight_decay must be non-negative, got {}",
                self.weight_decay
            )));
        }
        if !(self.min_delta.is_finite() && self.min_delta >= 0.0) {
            return Err(TrainError::Config(format!(
                "min_delta must be non-negative, got {}",
                self.min_delta
            )));
        }
        if train_len == 0 {
            return Err(TrainError::Config("training partition is empty".into()));
        }
        if test_len == 0 {
            return Err(TrainError::Config("validation partition is empty".into()));
        }
        if !(0.0..=1.0).contains(&self.detection_conf) {
            return Err(TrainError::Config(format!(
                "detection_conf must be within [0, 1], got {}",
                self.detection_conf
            )));
        }

        let train_steps = self
            .steps_per_epoch
            .unwrap_or(train_len / self.batch_size);
        let validation_steps = self
            .validation_steps
            .unwrap_or(test_len / self.batch_size);

        if train_steps == 0 {
            return Err(TrainError::Config(format!(
                "zero training steps per epoch ({} pairs, batch size {})",
                train_len, self.batch_size
            )));
        }
        if validation_steps == 0 {
            return Err(TrainError::Config(format!(
                "zero validation steps per epoch ({} pairs, batch size {})",
                test_len, self.batch_size
            )));
        }

        Ok(StepPlan {
            train_steps,
            validation_steps,
        })
    }
}
