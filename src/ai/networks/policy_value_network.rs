use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::{Linear, LinearConfig, PaddingConfig2d, Relu};
use burn::prelude::*;

use crate::ai::state_encoding::CHANNELS;

/// Combined policy-value network for the PPO agent.
///
/// Shares the DQN conv backbone with dual output heads:
/// ```text
/// Input:  [batch, 5, H, W]
/// Conv1:  5 -> 32 channels, 3x3 kernel, same padding
/// ReLU
/// Conv2:  32 -> 64 channels, 3x3 kernel, same padding
/// ReLU
/// Flatten: 64*H*W
/// FC_shared: 64*H*W -> 256, ReLU
/// Policy head: 256 -> H*W  (logits, one per cell)
/// Value head:  256 -> 1
/// ```
#[derive(Module, Debug)]
pub struct PolicyValueNetwork<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    fc_shared: Linear<B>,
    policy_head: Linear<B>,
    value_head: Linear<B>,
    relu: Relu,
}

#[derive(Config, Debug)]
pub struct PolicyValueNetworkConfig {
    pub height: usize,
    pub width: usize,
    #[config(default = 256)]
    pub hidden: usize,
}

impl PolicyValueNetworkConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> PolicyValueNetwork<B> {
        let cells = self.height * self.width;
        let flat = 64 * cells;
        PolicyValueNetwork {
            conv1: Conv2dConfig::new([CHANNELS, 32], [3, 3])
                .with_padding(PaddingConfig2d::Same)
                .init(device),
            conv2: Conv2dConfig::new([32, 64], [3, 3])
                .with_padding(PaddingConfig2d::Same)
                .init(device),
            fc_shared: LinearConfig::new(flat, self.hidden).init(device),
            policy_head: LinearConfig::new(self.hidden, cells).init(device),
            value_head: LinearConfig::new(self.hidden, 1).init(device),
            relu: Relu::new(),
        }
    }
}

impl<B: Backend> PolicyValueNetwork<B> {
    /// Forward pass: input [batch, 5, H, W] -> (logits [batch, H*W], value [batch, 1]).
    pub fn forward(&self, input: Tensor<B, 4>) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let x = self.relu.forward(self.conv1.forward(input));
        let x = self.relu.forward(self.conv2.forward(x));
        let [batch, channels, h, w] = x.dims();
        let x = x.reshape([batch, channels * h * w]);
        let x = self.relu.forward(self.fc_shared.forward(x));

        let logits = self.policy_head.forward(x.clone());
        let value = self.value_head.forward(x);

        (logits, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::InferBackend;

    #[test]
    fn test_policy_value_network_output_shapes() {
        let device = Default::default();
        let network = PolicyValueNetworkConfig::new(8, 8).init::<InferBackend>(&device);

        let input = Tensor::zeros([2, CHANNELS, 8, 8], &device);
        let (logits, value) = network.forward(input);
        assert_eq!(logits.shape().dims, [2, 64]);
        assert_eq!(value.shape().dims, [2, 1]);
    }

    #[test]
    fn test_policy_value_network_single_input() {
        let device = Default::default();
        let network = PolicyValueNetworkConfig::new(5, 3).init::<InferBackend>(&device);

        let input = Tensor::zeros([1, CHANNELS, 5, 3], &device);
        let (logits, value) = network.forward(input);
        assert_eq!(logits.shape().dims, [1, 15]);
        assert_eq!(value.shape().dims, [1, 1]);
    }
}
