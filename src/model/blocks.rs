use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::{BatchNorm, BatchNormConfig, PaddingConfig2d};
use burn::prelude::*;
use burn::tensor::activation;

/// Conv2d -> BatchNorm -> SiLU.
#[derive(Module, Debug)]
pub struct Conv<B: Backend> {
    conv: Conv2d<B>,
    bn: BatchNorm<B, 2>,
}

impl<B: Backend> Conv<B> {
    pub fn new(
        device: &B::Device,
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        stride: usize,
    ) -> Self {
        let padding = kernel_size / 2;

        Self {
            conv: Conv2dConfig::new([in_channels, out_channels], [kernel_size, kernel_size])
                .with_stride([stride, stride])
                .with_padding(PaddingConfig2d::Explicit(padding, padding))
                .with_bias(false)
                .init(device),
            bn: BatchNormConfig::new(out_channels).init(device),
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(x);
        let x = self.bn.forward(x);
        activation::silu(x)
    }
}

/// Shared image tower: three strided conv blocks and global max pooling.
#[derive(Module, Debug)]
pub struct ImageEncoder<B: Backend> {
    stem: Conv<B>,
    stage1: Conv<B>,
    stage2: Conv<B>,
}

impl<B: Backend> ImageEncoder<B> {
    pub fn new(device: &B::Device, channels: usize) -> Self {
        let half = (channels / 2).max(1);
        Self {
            stem: Conv::new(device, 3, half, 3, 2),
            stage1: Conv::new(device, half, channels, 3, 2),
            stage2: Conv::new(device, channels, channels, 3, 1),
        }
    }

    /// `[N, 3, H, W]` -> `[N, channels]`
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.stem.forward(x);
        let x = self.stage1.forward(x);
        let x = self.stage2.forward(x);

        let [n, c, h, w] = x.dims();
        x.reshape([n, c, h * w]).max_dim(2).reshape([n, c])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    type B = Autodiff<NdArray>;

    #[test]
    fn pooled_embedding_has_one_value_per_channel() {
        let device = Default::default();
        let encoder = ImageEncoder::<B>::new(&device, 4);
        let out = encoder.forward(Tensor::ones([2, 3, 16, 16], &device));
        assert_eq!(out.dims(), [2, 4]);
    }

    #[test]
    fn gradients_flow_through_spatial_pooling() {
        let device = Default::default();
        let encoder = ImageEncoder::<B>::new(&device, 4);
        let input = Tensor::<B, 4>::ones([2, 3, 16, 16], &device).require_grad();

        let grads = encoder.forward(input.clone()).sum().backward();
        let input_grad = input.grad(&grads).unwrap();
        assert_eq!(input_grad.dims(), [2, 3, 16, 16]);
    }
}
