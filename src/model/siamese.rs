use super::blocks::ImageEncoder;
use crate::data::DEFAULT_NUM_CLASSES;
use crate::detection::EnrichedBatch;
use burn::nn::{Linear, LinearConfig};
use burn::prelude::*;
use burn::tensor::activation::{relu, sigmoid};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SiameseNetConfig {
    /// Length of each frequency vector.
    pub num_classes: usize,
    /// Width of the image embedding.
    pub embedding_channels: usize,
}

impl Default for SiameseNetConfig {
    fn default() -> Self {
        Self {
            num_classes: DEFAULT_NUM_CLASSES,
            embedding_channels: 32,
        }
    }
}

/// Scores whether image A precedes image B.
///
/// Both images go through the same encoder; the two embeddings and the two
/// detection frequency vectors are concatenated and passed through a
/// 512 -> 256 -> 1 dense head ending in a sigmoid.
#[derive(Module, Debug)]
pub struct SiameseNet<B: Backend> {
    pub encoder: ImageEncoder<B>,
    fc1: Linear<B>,
    fc2: Linear<B>,
    out: Linear<B>,
}

impl<B: Backend> SiameseNet<B> {
    pub fn new(device: &B::Device, config: &SiameseNetConfig) -> Self {
        let combined = 2 * config.embedding_channels + 2 * config.num_classes;

        Self {
            encoder: ImageEncoder::new(device, config.embedding_channels),
            fc1: LinearConfig::new(combined, 512).init(device),
            fc2: LinearConfig::new(512, 256).init(device),
            out: LinearConfig::new(256, 1).init(device),
        }
    }

    /// Returns `[N, 1]` probabilities.
    pub fn forward(
        &self,
        images_a: Tensor<B, 4>,
        images_b: Tensor<B, 4>,
        freq_a: Tensor<B, 2>,
        freq_b: Tensor<B, 2>,
    ) -> Tensor<B, 2> {
        let emb_a = self.encoder.forward(images_a);
        let emb_b = self.encoder.forward(images_b);

        let combined = Tensor::cat(vec![emb_a, emb_b, freq_a, freq_b], 1);
        let x = relu(self.fc1.forward(combined));
        let x = relu(self.fc2.forward(x));
        sigmoid(self.out.forward(x))
    }

    /// Build input tensors from an enriched batch and run the forward pass.
    pub fn forward_batch(&self, batch: &EnrichedBatch, device: &B::Device) -> Tensor<B, 2> {
        let n = batch.len();
        let s = batch.batch.image_size;
        let k = batch.num_classes;

        let images_a = Tensor::<B, 4>::from_data(
            TensorData::new(batch.batch.flat_images_a(), [n, 3, s, s]),
            device,
        );
        let images_b = Tensor::<B, 4>::from_data(
            TensorData::new(batch.batch.flat_images_b(), [n, 3, s, s]),
            device,
        );
        let freq_a = Tensor::<B, 2>::from_data(TensorData::new(batch.flat_freq_a(), [n, k]), device);
        let freq_b = Tensor::<B, 2>::from_data(TensorData::new(batch.flat_freq_b(), [n, k]), device);

        self.forward(images_a, images_b, freq_a, freq_b)
    }
}
