pub mod label_file;

pub use label_file::LabelFileDetector;

use crate::data::{FrequencyVector, PairBatch};
use crate::error::Result;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONF_THRESHOLD: f32 = 0.35;
pub const DEFAULT_DETECTION_IMG_SIZE: usize = 640;

/// A single detected object, center format, normalized coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub confidence: f32,
    pub class_id: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionRequest {
    pub conf_threshold: f32,
    pub img_size: usize,
}

impl Default for DetectionRequest {
    fn default() -> Self {
        Self {
            conf_threshold: DEFAULT_CONF_THRESHOLD,
            img_size: DEFAULT_DETECTION_IMG_SIZE,
        }
    }
}

/// An external object detector. Only class ids are consumed downstream.
pub trait ObjectDetector {
    /// Detect objects in one image. No boxes is `Ok(vec![])`, not an error.
    fn detect(&self, image: &Path, request: &DetectionRequest) -> Result<Vec<Detection>>;

    fn detect_batch(
        &self,
        images: &[PathBuf],
        request: &DetectionRequest,
    ) -> Result<Vec<Vec<Detection>>> {
        images.iter().map(|p| self.detect(p, request)).collect()
    }
}

impl<D: ObjectDetector + ?Sized> ObjectDetector for &D {
    fn detect(&self, image: &Path, request: &DetectionRequest) -> Result<Vec<Detection>> {
        (**self).detect(image, request)
    }

    fn detect_batch(
        &self,
        images: &[PathBuf],
        request: &DetectionRequest,
    ) -> Result<Vec<Vec<Detection>>> {
        (**self).detect_batch(images, request)
    }
}

/// A batch plus one frequency vector per image on each side.
#[derive(Debug, Clone)]
pub struct EnrichedBatch {
    pub batch: PairBatch,
    pub freq_a: Vec<FrequencyVector>,
    pub freq_b: Vec<FrequencyVector>,
    pub num_classes: usize,
}

impl EnrichedBatch {
    pub fn len(&self) -> usize {
        self.batch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }

    pub fn flat_freq_a(&self) -> Vec<f32> {
        self.freq_a.iter().flat_map(|f| f.to_f32()).collect()
    }

    pub fn flat_freq_b(&self) -> Vec<f32> {
        self.freq_b.iter().flat_map(|f| f.to_f32()).collect()
    }

    pub fn labels_f32(&self) -> Vec<f32> {
        self.batch.labels.iter().map(|&l| l as f32).collect()
    }
}

/// Turns raw image references into class-id lists and frequency vectors.
pub struct DetectionAdapter<D: ObjectDetector> {
    detector: D,
    request: DetectionRequest,
    num_classes: usize,
}

impl<D: ObjectDetector> DetectionAdapter<D> {
    pub fn new(detector: D, request: DetectionRequest, num_classes: usize) -> Self {
        Self {
            detector,
            request,
            num_classes,
        }
    }

    fn class_ids(&self, detections: &[Detection]) -> Vec<usize> {
        detections
            .iter()
            .filter(|d| d.confidence >= self.request.conf_threshold)
            .map(|d| d.class_id)
            .collect()
    }

    /// Class ids above the confidence threshold, in detection order.
    pub fn classes_for(&self, image: &Path) -> Result<Vec<usize>> {
        let detections = self.detector.detect(image, &self.request)?;
        Ok(self.class_ids(&detections))
    }

    /// One frequency vector per image, in image order.
    pub fn frequencies(&self, images: &[PathBuf]) -> Result<Vec<FrequencyVector>> {
        let per_image = self.detector.detect_batch(images, &self.request)?;
        Ok(per_image
            .iter()
            .map(|dets| FrequencyVector::encode(self.class_ids(dets), self.num_classes))
            .collect())
    }

    pub fn enrich(&self, batch: PairBatch) -> Result<EnrichedBatch> {
        let freq_a = self.frequencies(&batch.paths_a)?;
        let freq_b = self.frequencies(&batch.paths_b)?;
        Ok(EnrichedBatch {
            batch,
            freq_a,
            freq_b,
            num_classes: self.num_classes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Returns one detection per character of the file stem: digit = class,
    /// confidence alternating 0.9 / 0.2.
    struct StemDetector;

    impl ObjectDetector for StemDetector {
        fn detect(&self, image: &Path, _request: &DetectionRequest) -> Result<Vec<Detection>> {
            let stem = image.file_stem().and_then(|s| s.to_str()).unwrap_or("");
            Ok(stem
                .chars()
                .filter_map(|c| c.to_digit(10))
                .enumerate()
                .map(|(i, d)| Detection {
                    x: 0.5,
                    y: 0.5,
                    w: 0.1,
                    h: 0.1,
                    confidence: if i % 2 == 0 { 0.9 } else { 0.2 },
                    class_id: d as usize,
                })
                .collect())
        }
    }

    #[test]
    fn applies_confidence_threshold() {
        let adapter = DetectionAdapter::new(StemDetector, DetectionRequest::default(), 7);
        assert_eq!(adapter.classes_for(Path::new("1234.jpg")).unwrap(), vec![1, 3]);
    }

    #[test]
    fn no_boxes_gives_empty_classes() {
        let adapter = DetectionAdapter::new(StemDetector, DetectionRequest::default(), 7);
        assert!(adapter.classes_for(Path::new("frame.jpg")).unwrap().is_empty());
    }

    #[test]
    fn frequencies_follow_image_order() {
        let adapter = DetectionAdapter::new(StemDetector, DetectionRequest::default(), 7);
        let images = vec![PathBuf::from("2.jpg"), PathBuf::from("none.jpg"), PathBuf::from("595.jpg")];
        let freqs = adapter.frequencies(&images).unwrap();
        assert_eq!(freqs.len(), 3);
        assert_eq!(freqs[0].as_slice(), &[0, 0, 1, 0, 0, 0, 0]);
        assert_eq!(freqs[1].sum(), 0);
        assert_eq!(freqs[2].as_slice(), &[0, 0, 0, 0, 0, 2, 0]);
    }

    #[test]
    fn unknown_classes_are_dropped() {
        let adapter = DetectionAdapter::new(StemDetector, DetectionRequest::default(), 7);
        let freqs = adapter.frequencies(&[PathBuf::from("989.jpg")]).unwrap();
        assert_eq!(freqs[0].sum(), 0);
    }
}
