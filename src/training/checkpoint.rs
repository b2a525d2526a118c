use crate::error::{Result, TrainError};
use crate::model::{PairModel, SiameseNetConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const MODEL_TYPE: &str = "SiameseNet";

pub const BEST: &str = "best";
pub const FINAL: &str = "final";
pub const INTERRUPTED: &str = "interrupted";

/// Writes named checkpoints as `<save_dir>/<name>/model` + `config.json`.
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    save_dir: PathBuf,
    model_config: SiameseNetConfig,
    image_size: usize,
}

impl CheckpointManager {
    pub fn new(save_dir: impl Into<PathBuf>, model_config: SiameseNetConfig, image_size: usize) -> Self {
        Self {
            save_dir: save_dir.into(),
            model_config,
            image_size,
        }
    }

    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    pub fn checkpoint_dir(&self, name: &str) -> PathBuf {
        self.save_dir.join(name)
    }

    pub fn save<M: PairModel + ?Sized>(&self, model: &M, name: &str) -> Result<PathBuf> {
        let dir = self.checkpoint_dir(name);
        std::fs::create_dir_all(&dir)?;

        model.save(&dir.join("model")).map_err(|e| TrainError::Checkpoint {
            name: name.to_string(),
            message: e.to_string(),
        })?;

        let info = CheckpointInfo {
            model_type: MODEL_TYPE.to_string(),
            checkpoint_name: name.to_string(),
            image_size: self.image_size,
            model_config: self.model_config.clone(),
        };
        std::fs::write(dir.join("config.json"), serde_json::to_string_pretty(&info)?)?;

        log::info!("Checkpoint '{}' saved to {}", name, dir.display());
        Ok(dir)
    }
}

/// Model settings stored next to a checkpoint as `config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointInfo {
    pub model_type: String,
    pub checkpoint_name: String,
    pub image_size: usize,
    #[serde(flatten)]
    pub model_config: SiameseNetConfig,
}

pub fn read_checkpoint_info(dir: &Path) -> Result<CheckpointInfo> {
    let content = std::fs::read_to_string(dir.join("config.json"))?;
    let info: CheckpointInfo = serde_json::from_str(&content)?;
    if info.model_type != MODEL_TYPE {
        return Err(TrainError::Checkpoint {
            name: dir.display().to_string(),
            message: format!("unsupported model type '{}'", info.model_type),
        });
    }
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::EnrichedBatch;
    use crate::model::StepMetrics;

    struct Dummy;

    impl PairModel for Dummy {
        fn train_step(&mut self, _batch: &EnrichedBatch) -> Result<StepMetrics> {
            unreachable!()
        }

        fn eval_step(&self, _batch: &EnrichedBatch) -> Result<StepMetrics> {
            unreachable!()
        }

        fn save(&self, path: &Path) -> Result<()> {
            std::fs::write(path, b"weights")?;
            Ok(())
        }
    }

    #[test]
    fn writes_model_and_config() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(dir.path(), SiameseNetConfig::default(), 64);
        let saved = manager.save(&Dummy, BEST).unwrap();

        assert_eq!(saved, dir.path().join("best"));
        assert!(saved.join("model").exists());

        let info = read_checkpoint_info(&saved).unwrap();
        assert_eq!(info.image_size, 64);
        assert_eq!(info.checkpoint_name, "best");
        assert_eq!(info.model_config, SiameseNetConfig::default());
    }

    #[test]
    fn config_json_keeps_a_flat_layout() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(dir.path(), SiameseNetConfig::default(), 64);
        let saved = manager.save(&Dummy, FINAL).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(saved.join("config.json")).unwrap())
                .unwrap();
        assert_eq!(raw["model_type"], "SiameseNet");
        assert_eq!(raw["num_classes"], 7);
        assert_eq!(raw["embedding_channels"], 32);
        assert_eq!(raw["image_size"], 64);
    }

    #[test]
    fn incomplete_config_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.json"),
            r#"{"model_type": "SiameseNet", "checkpoint_name": "best", "image_size": 64}"#,
        )
        .unwrap();

        assert!(matches!(
            read_checkpoint_info(dir.path()),
            Err(TrainError::Json(_))
        ));
    }

    #[test]
    fn foreign_model_type_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.json"),
            r#"{"model_type": "YOLOv8", "checkpoint_name": "best", "image_size": 64,
                "num_classes": 7, "embedding_channels": 32}"#,
        )
        .unwrap();

        assert!(matches!(
            read_checkpoint_info(dir.path()),
            Err(TrainError::Checkpoint { .. })
        ));
    }
}
