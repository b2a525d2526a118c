pub mod annotation;
pub mod data;
pub mod detection;
pub mod error;
pub mod model;
pub mod training;

// Re-exports for convenience
pub use data::{FileImageLoader, FrequencyVector, ImageLoader, Manifest, PairBatch, PairBatchGenerator, Sample};
pub use detection::{DetectionAdapter, EnrichedBatch, LabelFileDetector, ObjectDetector};
pub use error::{Result, TrainError};
pub use model::{PairModel, SiameseLearner, SiameseNet, SiameseNetConfig, StepMetrics};
pub use training::{EarlyStopping, EpochHistory, EpochOutcome, StopSignal, Trainer, TrainingConfig};
