pub mod frequency;
pub mod generator;
pub mod loader;
pub mod manifest;

pub use frequency::{FrequencyVector, DEFAULT_NUM_CLASSES};
pub use generator::{PairBatch, PairBatchGenerator};
pub use loader::{FileImageLoader, ImageLoader};
pub use manifest::{Manifest, Partition, Sample};
