use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::{Linear, LinearConfig, PaddingConfig2d, Relu};
use burn::prelude::*;

use crate::ai::state_encoding::CHANNELS;

/// Q-network over an H x W board.
///
/// ```text
/// Input:  [batch, 5, H, W]
/// Conv1:  5 -> 32 channels, 3x3 kernel, same padding
/// ReLU
/// Conv2:  32 -> 64 channels, 3x3 kernel, same padding
/// ReLU
/// Flatten: 64*H*W
/// FC1:    64*H*W -> 256, ReLU
/// FC2:    256 -> H*W  (Q-value per cell)
/// ```
#[derive(Module, Debug)]
pub struct DqnNetwork<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    fc1: Linear<B>,
    fc2: Linear<B>,
    relu: Relu,
}

#[derive(Config, Debug)]
pub struct DqnNetworkConfig {
    pub height: usize,
    pub width: usize,
    #[config(default = 256)]
    pub hidden: usize,
}

impl DqnNetworkConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> DqnNetwork<B> {
        let cells = self.height * self.width;
        let flat = 64 * cells;
        DqnNetwork {
            conv1: Conv2dConfig::new([CHANNELS, 32], [3, 3])
                .with_padding(PaddingConfig2d::Same)
                .init(device),
            conv2: Conv2dConfig::new([32, 64], [3, 3])
                .with_padding(PaddingConfig2d::Same)
                .init(device),
            fc1: LinearConfig::new(flat, self.hidden).init(device),
            fc2: LinearConfig::new(self.hidden, cells).init(device),
            relu: Relu::new(),
        }
    }
}

impl<B: Backend> DqnNetwork<B> {
    /// Forward pass: input [batch, 5, H, W] -> output [batch, H*W] Q-values.
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.relu.forward(self.conv1.forward(input));
        let x = self.relu.forward(self.conv2.forward(x));
        let [batch, channels, h, w] = x.dims();
        let x = x.reshape([batch, channels * h * w]);
        let x = self.relu.forward(self.fc1.forward(x));
        self.fc2.forward(x)
    }
}
