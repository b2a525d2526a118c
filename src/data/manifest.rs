use crate::error::{Result, TrainError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Two images plus whether they appear in the correct temporal order.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub first: PathBuf,
    pub second: PathBuf,
    pub label: u8,
}

/// One partition of the manifest: three aligned columns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Partition {
    pub img_path_1: Vec<PathBuf>,
    pub img_path_2: Vec<PathBuf>,
    pub labels: Vec<u8>,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    fn validate(&self, name: &str) -> Result<()> {
        if self.img_path_1.len() != self.labels.len() || self.img_path_2.len() != self.labels.len()
        {
            return Err(TrainError::Manifest(format!(
                "partition '{}' is not aligned: {} first paths, {} second paths, {} labels",
                name,
                self.img_path_1.len(),
                self.img_path_2.len(),
                self.labels.len()
            )));
        }

        if let Some((idx, label)) = self.labels.iter().enumerate().find(|(_, &l)| l > 1) {
            return Err(TrainError::Manifest(format!(
                "partition '{}' has non-binary label {} at index {}",
                name, label, idx
            )));
        }

        Ok(())
    }

    pub fn samples(&self) -> Vec<Sample> {
        self.img_path_1
            .iter()
            .zip(&self.img_path_2)
            .zip(&self.labels)
            .map(|((first, second), &label)| Sample {
                first: first.clone(),
                second: second.clone(),
                label,
            })
            .collect()
    }
}

/// Dataset manifest with `train` and `test` partitions.
///
/// ```json
/// {
///   "train": { "img_path_1": [...], "img_path_2": [...], "labels": [...] },
///   "test":  { "img_path_1": [...], "img_path_2": [...], "labels": [...] }
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    pub train: Partition,
    pub test: Partition,
}

impl Manifest {
    pub fn from_json_str(content: &str) -> Result<Self> {
        let manifest: Manifest = serde_json::from_str(content)?;
        manifest.train.validate("train")?;
        manifest.test.validate("test")?;
        Ok(manifest)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let manifest = Self::from_json_str(&content)?;
        log::info!(
            "Loaded manifest {}: {} train pairs, {} test pairs",
            path.display(),
            manifest.train.len(),
            manifest.test.len()
        );
        Ok(manifest)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aligned_partitions() {
        let json = r#"{
            "train": {"img_path_1": ["a.jpg", "b.jpg"], "img_path_2": ["c.jpg", "d.jpg"], "labels": [1, 0]},
            "test": {"img_path_1": ["e.jpg"], "img_path_2": ["f.jpg"], "labels": [1]}
        }"#;
        let manifest = Manifest::from_json_str(json).unwrap();
        assert_eq!(manifest.train.len(), 2);
        assert_eq!(manifest.test.len(), 1);

        let samples = manifest.train.samples();
        assert_eq!(samples[1].first, PathBuf::from("b.jpg"));
        assert_eq!(samples[1].second, PathBuf::from("d.jpg"));
        assert_eq!(samples[1].label, 0);
    }

    #[test]
    fn rejects_misaligned_columns() {
        let json = r#"{
            "train": {"img_path_1": ["a.jpg"], "img_path_2": [], "labels": [1]},
            "test": {"img_path_1": [], "img_path_2": [], "labels": []}
        }"#;
        assert!(matches!(
            Manifest::from_json_str(json),
            Err(TrainError::Manifest(_))
        ));
    }

    #[test]
    fn rejects_non_binary_labels() {
        let json = r#"{
            "train": {"img_path_1": ["a.jpg"], "img_path_2": ["b.jpg"], "labels": [2]},
            "test": {"img_path_1": [], "img_path_2": [], "labels": []}
        }"#;
        assert!(Manifest::from_json_str(json).is_err());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        let mut manifest = Manifest::default();
        manifest.test.img_path_1.push("x.png".into());
        manifest.test.img_path_2.push("y.png".into());
        manifest.test.labels.push(1);
        manifest.save(&path).unwrap();

        let loaded = Manifest::load(&path).unwrap();
        assert_eq!(loaded.test.samples(), manifest.test.samples());
    }
}
