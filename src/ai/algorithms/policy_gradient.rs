use std::error::Error;
use std::path::Path;

use burn::grad_clipping::GradientClippingConfig;
use burn::module::AutodiffModule;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::record::DefaultRecorder;
use burn::tensor::TensorData;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use crate::ai::agent::{best_of, candidate_actions, Agent, EvalState, Experience, TrainableAgent, UpdateMetrics};
use crate::ai::networks::{PolicyValueNetwork, PolicyValueNetworkConfig};
use crate::ai::state_encoding::{encode_batch, encode_flat, encode_observation, CHANNELS};
use crate::ai::{InferBackend, TrainBackend};
use crate::checkpoint::PgTrainingState;
use crate::env::Observation;

/// PPO hyperparameters.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PgConfig {
    pub learning_rate: f64,
    pub gamma: f32,
    pub gae_lambda: f32,
    pub ppo_epsilon: f32,
    pub entropy_coeff: f32,
    pub value_coeff: f32,
    pub ppo_epochs: usize,
    pub max_grad_norm: f32,
}

impl Default for PgConfig {
    fn default() -> Self {
        PgConfig {
            learning_rate: 3e-4,
            gamma: 0.99,
            gae_lambda: 0.95,
            ppo_epsilon: 0.2,
            entropy_coeff: 0.01,
            value_coeff: 0.5,
            ppo_epochs: 4,
            max_grad_norm: 0.5,
        }
    }
}

/// Policy Gradient agent with PPO clipping and GAE.
pub struct PolicyGradientAgent {
    network: PolicyValueNetwork<TrainBackend>,
    optimizer:
        burn::optim::adaptor::OptimizerAdaptor<burn::optim::Adam, PolicyValueNetwork<TrainBackend>, TrainBackend>,
    config: PgConfig,
    net_config: PolicyValueNetworkConfig,
    device: <TrainBackend as Backend>::Device,
    mask_illegal: bool,
    episode_count: usize,
    step_count: usize,
    last_entropy: f32,
    rng: StdRng,
}

impl PolicyGradientAgent {
    pub fn new(config: PgConfig, height: usize, width: usize) -> Self {
        let device = Default::default();
        let net_config = PolicyValueNetworkConfig::new(height, width);
        let network: PolicyValueNetwork<TrainBackend> = net_config.init(&device);
        let optimizer = AdamConfig::new()
            .with_grad_clipping(Some(GradientClippingConfig::Norm(config.max_grad_norm)))
            .init();

        PolicyGradientAgent {
            network,
            optimizer,
            config,
            net_config,
            device,
            mask_illegal: false,
            episode_count: 0,
            step_count: 0,
            last_entropy: 0.0,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Restrict choices to closed cells.
    pub fn with_action_masking(mut self, mask: bool) -> Self {
        self.mask_illegal = mask;
        self
    }

    fn actions(&self) -> usize {
        self.net_config.height * self.net_config.width
    }

    /// Sample from the policy when training, argmax over closed cells otherwise.
    fn pick_action(&mut self, observation: &Observation, training: bool) -> usize {
        let candidates = candidate_actions(observation, self.mask_illegal || !training);

        let input = encode_observation::<InferBackend>(observation, &self.device).unsqueeze::<4>();
        let (logits, _value) = self.network.valid().forward(input);
        let logits_vec: Vec<f32> = logits.into_data().to_vec().expect("f32 tensor data extraction");

        let probs = masked_softmax(&logits_vec, &candidates);

        if training {
            sample_categorical(&probs, &mut self.rng)
        } else {
            best_of(&candidates, &probs)
        }
    }

    /// PPO update over one finished episode.
    fn ppo_update(&mut self, exps: &[Experience]) -> UpdateMetrics {
        let n = exps.len();
        if n == 0 {
            return UpdateMetrics::default();
        }
        let n_actions = self.actions();
        let (h, w) = (self.net_config.height, self.net_config.width);

        let (values, old_log_probs) = self.evaluate_no_grad(exps);
        let (advantages, returns) = self.compute_gae(exps, &values);

        // Constant across PPO epochs
        let mut action_mask_data = vec![0.0f32; n * n_actions];
        let mut legal_mask_data = vec![-1e9f32; n * n_actions];
        let mut candidates = Vec::with_capacity(n);
        for (i, exp) in exps.iter().enumerate() {
            action_mask_data[i * n_actions + exp.action] = 1.0;
            let legal = candidate_actions(&exp.observation, self.mask_illegal);
            for &a in &legal {
                legal_mask_data[i * n_actions + a] = 0.0;
            }
            candidates.push(legal);
        }

        let state_data: Vec<f32> = exps.iter().flat_map(|e| encode_flat(&e.observation)).collect();

        let mut last_loss = 0.0f32;
        let mut last_entropy = 0.0f32;

        for _epoch in 0..self.config.ppo_epochs {
            let state_tensor = Tensor::<TrainBackend, 1>::from_data(
                TensorData::from(state_data.as_slice()),
                &self.device,
            )
            .reshape([n as i32, CHANNELS as i32, h as i32, w as i32]);

            let (logits_batch, values_batch) = self.network.forward(state_tensor);

            let mask_tensor = Tensor::<TrainBackend, 1>::from_data(
                TensorData::from(legal_mask_data.as_slice()),
                &self.device,
            )
            .reshape([n as i32, n_actions as i32]);

            let masked_logits = logits_batch.clone() + mask_tensor;
            let log_probs_tensor = burn::tensor::activation::log_softmax(masked_logits, 1);

            // log pi(a|s) for taken actions: [n]
            let action_mask_tensor = Tensor::<TrainBackend, 1>::from_data(
                TensorData::from(action_mask_data.as_slice()),
                &self.device,
            )
            .reshape([n as i32, n_actions as i32]);
            let selected_log_probs =
                (log_probs_tensor.clone() * action_mask_tensor).sum_dim(1).reshape([n as i32]);

            let old_lp_tensor = Tensor::<TrainBackend, 1>::from_data(
                TensorData::from(old_log_probs.as_slice()),
                &self.device,
            );

            let ratio_tensor = (selected_log_probs - old_lp_tensor).exp();

            let adv_tensor = Tensor::<TrainBackend, 1>::from_data(
                TensorData::from(advantages.as_slice()),
                &self.device,
            );

            let surr1 = ratio_tensor.clone() * adv_tensor.clone();
            let clamped_ratio = ratio_tensor.clamp(1.0 - self.config.ppo_epsilon, 1.0 + self.config.ppo_epsilon);
            let surr2 = clamped_ratio * adv_tensor;

            // min(a, b) = (a + b - |a - b|) / 2
            let diff = surr1.clone() - surr2.clone();
            let abs_diff = diff.clone() * diff.sign();
            let policy_objective = (surr1 + surr2 - abs_diff) / 2.0;
            let policy_loss = -policy_objective.mean();

            let returns_tensor = Tensor::<TrainBackend, 1>::from_data(
                TensorData::from(returns.as_slice()),
                &self.device,
            )
            .reshape([n as i32, 1]);
            let value_diff = values_batch - returns_tensor;
            let value_loss = (value_diff.clone() * value_diff).mean();

            let logits_data: Vec<f32> = logits_batch
                .clone()
                .into_data()
                .to_vec()
                .expect("f32 tensor data extraction");

            let probs_tensor = burn::tensor::activation::softmax(logits_batch, 1);
            let entropy_tensor = -(probs_tensor * log_probs_tensor).sum_dim(1).mean();

            let total_loss = policy_loss + value_loss * self.config.value_coeff
                - entropy_tensor * self.config.entropy_coeff;

            last_loss = total_loss
                .clone()
                .into_data()
                .to_vec::<f32>()
                .expect("f32 loss tensor extraction")[0];

            // Entropy over the offered actions, for reporting
            let mut entropy_sum = 0.0f32;
            for (i, legal) in candidates.iter().enumerate() {
                let logits_i = &logits_data[i * n_actions..(i + 1) * n_actions];
                let (lp, pr) = masked_log_softmax(logits_i, legal);
                entropy_sum += legal.iter().map(|&a| -pr[a] * lp[a]).sum::<f32>();
            }
            last_entropy = entropy_sum / n as f32;

            let grads = total_loss.backward();
            let grads = GradientsParams::from_grads(grads, &self.network);
            self.network = self
                .optimizer
                .step(self.config.learning_rate, self.network.clone(), grads);
        }

        self.step_count += 1;
        self.last_entropy = last_entropy;

        UpdateMetrics {
            loss: last_loss,
            policy_entropy: Some(last_entropy),
        }
    }

    /// State values and log-probs of taken actions, without gradients.
    fn evaluate_no_grad(&self, exps: &[Experience]) -> (Vec<f32>, Vec<f32>) {
        let n_actions = self.actions();
        let (h, w) = (self.net_config.height, self.net_config.width);
        let infer_net = self.network.valid();

        let input = encode_batch::<InferBackend, _>(exps.iter().map(|e| &e.observation), h, w, &self.device);
        let (logits, values) = infer_net.forward(input);
        let logits: Vec<f32> = logits.into_data().to_vec().expect("f32 tensor data extraction");
        let values: Vec<f32> = values.into_data().to_vec().expect("f32 tensor data extraction");

        let log_probs = exps
            .iter()
            .enumerate()
            .map(|(i, exp)| {
                let legal = candidate_actions(&exp.observation, self.mask_illegal);
                let (lp, _) = masked_log_softmax(&logits[i * n_actions..(i + 1) * n_actions], &legal);
                lp[exp.action]
            })
            .collect();

        (values, log_probs)
    }

    /// Generalized Advantage Estimation.
    fn compute_gae(&self, exps: &[Experience], values: &[f32]) -> (Vec<f32>, Vec<f32>) {
        let n = exps.len();
        let mut advantages = vec![0.0f32; n];
        let mut returns = vec![0.0f32; n];

        let gamma = self.config.gamma;
        let lam = self.config.gae_lambda;

        let mut gae = 0.0f32;
        for i in (0..n).rev() {
            let next_value = if exps[i].done || i + 1 >= n { 0.0 } else { values[i + 1] };

            let delta = exps[i].reward + gamma * next_value - values[i];
            gae = if exps[i].done { delta } else { delta + gamma * lam * gae };

            advantages[i] = gae;
            returns[i] = gae + values[i];
        }

        if n > 1 {
            let mean: f32 = advantages.iter().sum::<f32>() / n as f32;
            let var: f32 = advantages.iter().map(|a| (a - mean).powi(2)).sum::<f32>() / n as f32;
            let std = var.sqrt().max(1e-8);
            for a in &mut advantages {
                *a = (*a - mean) / std;
            }
        }

        (advantages, returns)
    }

    fn training_state_record(&self) -> PgTrainingState {
        PgTrainingState {
            episode_count: self.episode_count,
            step_count: self.step_count,
            learning_rate: self.config.learning_rate,
            gamma: self.config.gamma,
            gae_lambda: self.config.gae_lambda,
            ppo_epsilon: self.config.ppo_epsilon,
            entropy_coeff: self.config.entropy_coeff,
            value_coeff: self.config.value_coeff,
            ppo_epochs: self.config.ppo_epochs,
            max_grad_norm: self.config.max_grad_norm,
            mask_illegal_actions: self.mask_illegal,
        }
    }

    fn apply_training_state(&mut self, state: &PgTrainingState) {
        self.episode_count = state.episode_count;
        self.step_count = state.step_count;
        if state.mask_illegal_actions != self.mask_illegal {
            tracing::debug!(
                saved = state.mask_illegal_actions,
                current = self.mask_illegal,
                "keeping configured action masking"
            );
        }
        self.config = PgConfig {
            learning_rate: state.learning_rate,
            gamma: state.gamma,
            gae_lambda: state.gae_lambda,
            ppo_epsilon: state.ppo_epsilon,
            entropy_coeff: state.entropy_coeff,
            value_coeff: state.value_coeff,
            ppo_epochs: state.ppo_epochs,
            max_grad_norm: state.max_grad_norm,
        };
    }
}

impl Agent for PolicyGradientAgent {
    fn select_action(&mut self, observation: &Observation, training: bool) -> usize {
        self.pick_action(observation, training)
    }

    fn name(&self) -> &str {
        "PPO"
    }

    fn batch_update(&mut self, experiences: &[Experience]) -> UpdateMetrics {
        self.episode_count += 1;
        self.ppo_update(experiences)
    }
}

impl TrainableAgent for PolicyGradientAgent {
    fn algorithm_name(&self) -> &str {
        "PPO"
    }

    fn episode_count(&self) -> usize {
        self.episode_count
    }

    fn step_count(&self) -> usize {
        self.step_count
    }

    fn enter_eval_mode(&mut self) -> EvalState {
        EvalState::NoOp
    }

    fn exit_eval_mode(&mut self, _state: EvalState) {}

    fn algorithm_metric_value(&self) -> f32 {
        self.last_entropy
    }

    fn algorithm_metric_label(&self) -> &str {
        "entropy"
    }

    fn save_weights(&self, path: &Path) -> Result<(), Box<dyn Error>> {
        let recorder = DefaultRecorder::default();
        self.network.clone().valid().save_file(path, &recorder)?;
        Ok(())
    }

    fn load_weights(&mut self, path: &Path) -> Result<(), Box<dyn Error>> {
        let recorder = DefaultRecorder::default();
        let net: PolicyValueNetwork<TrainBackend> =
            self.net_config
                .init(&self.device)
                .load_file(path, &recorder, &self.device)?;
        self.network = net;
        Ok(())
    }

    fn training_state(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self.training_state_record())
    }

    fn restore_training_state(&mut self, state: serde_json::Value) -> Result<(), serde_json::Error> {
        let state: PgTrainingState = serde_json::from_value(state)?;
        self.apply_training_state(&state);
        Ok(())
    }
}

/// Softmax restricted to `legal`; everything else gets probability 0.
fn masked_softmax(logits: &[f32], legal: &[usize]) -> Vec<f32> {
    let mut masked = vec![f32::NEG_INFINITY; logits.len()];
    for &a in legal {
        masked[a] = logits[a];
    }

    let max_val = masked.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut probs = vec![0.0f32; logits.len()];
    let mut sum = 0.0f32;
    for (i, &m) in masked.iter().enumerate() {
        let v = (m - max_val).exp();
        probs[i] = v;
        sum += v;
    }
    for p in &mut probs {
        *p /= sum;
    }

    probs
}

/// Returns (log_probs, probs).
fn masked_log_softmax(logits: &[f32], legal: &[usize]) -> (Vec<f32>, Vec<f32>) {
    let probs = masked_softmax(logits, legal);
    let log_probs: Vec<f32> = probs.iter().map(|&p| if p > 0.0 { p.ln() } else { -1e9 }).collect();
    (log_probs, probs)
}

fn sample_categorical(probs: &[f32], rng: &mut StdRng) -> usize {
    let r: f32 = rng.random_range(0.0..1.0);
    let mut cumulative = 0.0;
    for (i, &p) in probs.iter().enumerate() {
        cumulative += p;
        if r < cumulative {
            return i;
        }
    }
    // Rounding left r past the last bucket
    probs.iter().rposition(|&p| p > 0.0).unwrap_or(0)
}
