use super::{Detection, DetectionRequest, ObjectDetector};
use crate::annotation::{label_path_for, read_label_file};
use crate::error::{Result, TrainError};
use std::path::{Path, PathBuf};

/// Detector backed by label files exported from an external YOLO run
/// (`save_txt` + `save_conf`), one file per image, matched by stem.
///
/// Lines without a confidence column count as confidence 1.0. A missing
/// label file means the detector found nothing.
#[derive(Debug, Clone)]
pub struct LabelFileDetector {
    detections_dir: Option<PathBuf>,
}

impl LabelFileDetector {
    /// Look up `<detections_dir>/<stem>.txt`.
    pub fn new(detections_dir: impl Into<PathBuf>) -> Self {
        Self {
            detections_dir: Some(detections_dir.into()),
        }
    }

    /// Look up `<stem>.txt` next to each image.
    pub fn beside_images() -> Self {
        Self {
            detections_dir: None,
        }
    }

    fn label_path(&self, image: &Path) -> Option<PathBuf> {
        match &self.detections_dir {
            Some(dir) => label_path_for(image, dir),
            None => Some(image.with_extension("txt")),
        }
    }
}

impl ObjectDetector for LabelFileDetector {
    fn detect(&self, image: &Path, _request: &DetectionRequest) -> Result<Vec<Detection>> {
        let Some(path) = self.label_path(image) else {
            return Err(TrainError::Detection {
                path: image.to_path_buf(),
                message: "image path has no file name".into(),
            });
        };

        if !path.exists() {
            log::debug!("No detections for {}", image.display());
            return Ok(Vec::new());
        }

        let labels = read_label_file(&path).map_err(|e| TrainError::Detection {
            path: image.to_path_buf(),
            message: e.to_string(),
        })?;

        Ok(labels
            .into_iter()
            .map(|l| Detection {
                x: l.x_center,
                y: l.y_center,
                w: l.width,
                h: l.height,
                confidence: l.confidence.unwrap_or(1.0),
                class_id: l.class_index,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::DetectionAdapter;

    #[test]
    fn reads_exported_detections() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("frame_07.txt"),
            "1 0.5 0.5 0.2 0.2 0.91\n1 0.1 0.1 0.1 0.1 0.30\n4 0.3 0.3 0.1 0.1\n",
        )
        .unwrap();

        let detector = LabelFileDetector::new(dir.path());
        let dets = detector
            .detect(Path::new("/data/images/frame_07.jpg"), &DetectionRequest::default())
            .unwrap();
        assert_eq!(dets.len(), 3);
        assert_eq!(dets[2].confidence, 1.0);

        let adapter = DetectionAdapter::new(detector, DetectionRequest::default(), 7);
        let classes = adapter
            .classes_for(Path::new("/data/images/frame_07.jpg"))
            .unwrap();
        assert_eq!(classes, vec![1, 4]);
    }

    #[test]
    fn missing_file_means_no_boxes() {
        let dir = tempfile::tempdir().unwrap();
        let detector = LabelFileDetector::new(dir.path());
        let dets = detector
            .detect(Path::new("nothing.png"), &DetectionRequest::default())
            .unwrap();
        assert!(dets.is_empty());
    }

    #[test]
    fn malformed_file_is_a_detection_error() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("bad.jpg");
        std::fs::write(dir.path().join("bad.txt"), "x y z\n").unwrap();

        let detector = LabelFileDetector::beside_images();
        let err = detector
            .detect(&image, &DetectionRequest::default())
            .unwrap_err();
        assert!(matches!(err, TrainError::Detection { .. }));
    }
}
