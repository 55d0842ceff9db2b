use std::error::Error;
use std::path::Path;

use burn::module::AutodiffModule;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::record::DefaultRecorder;
use burn::tensor::TensorData;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use crate::ai::agent::{best_of, candidate_actions, Agent, EvalState, Experience, TrainableAgent, UpdateMetrics};
use crate::ai::networks::{DqnNetwork, DqnNetworkConfig};
use crate::ai::state_encoding::{encode_batch, encode_observation};
use crate::ai::{InferBackend, TrainBackend};
use crate::checkpoint::DqnTrainingState;
use crate::env::Observation;
use crate::training::replay_buffer::ReplayBuffer;

/// DQN hyperparameters.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DqnConfig {
    pub learning_rate: f64,
    pub gamma: f32,
    pub epsilon_start: f32,
    pub epsilon_end: f32,
    pub epsilon_decay_episodes: usize,
    pub target_update_interval: usize,
    pub batch_size: usize,
    pub replay_capacity: usize,
    pub min_replay_size: usize,
}

impl Default for DqnConfig {
    fn default() -> Self {
        DqnConfig {
            learning_rate: 1e-4,
            gamma: 0.99,
            epsilon_start: 1.0,
            epsilon_end: 0.05,
            epsilon_decay_episodes: 10_000,
            target_update_interval: 1000,
            batch_size: 64,
            replay_capacity: 10_000,
            min_replay_size: 1000,
        }
    }
}

/// DQN agent with online + target networks, replay buffer, and Adam optimizer.
pub struct DqnAgent {
    q_network: DqnNetwork<TrainBackend>,
    target_network: DqnNetwork<InferBackend>,
    optimizer: burn::optim::adaptor::OptimizerAdaptor<burn::optim::Adam, DqnNetwork<TrainBackend>, TrainBackend>,
    replay_buffer: ReplayBuffer,
    config: DqnConfig,
    net_config: DqnNetworkConfig,
    device: <TrainBackend as Backend>::Device,
    mask_illegal: bool,
    epsilon: f32,
    step_count: usize,
    episode_count: usize,
    rng: StdRng,
}

impl DqnAgent {
    pub fn new(config: DqnConfig, height: usize, width: usize) -> Self {
        let device = Default::default();
        let net_config = DqnNetworkConfig::new(height, width);
        let q_network: DqnNetwork<TrainBackend> = net_config.init(&device);
        let target_network = q_network.valid();
        let optimizer = AdamConfig::new().init();

        let epsilon = config.epsilon_start;
        let replay_buffer = ReplayBuffer::new(config.replay_capacity);

        DqnAgent {
            q_network,
            target_network,
            optimizer,
            replay_buffer,
            config,
            net_config,
            device,
            mask_illegal: false,
            epsilon,
            step_count: 0,
            episode_count: 0,
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

    /// Epsilon-greedy when training, greedy over closed cells otherwise.
    fn pick_action(&mut self, observation: &Observation, training: bool) -> usize {
        let candidates = candidate_actions(observation, self.mask_illegal || !training);

        if training && self.rng.random_range(0.0..1.0) < self.epsilon {
            let idx = self.rng.random_range(0..candidates.len());
            return candidates[idx];
        }

        let input = encode_observation::<InferBackend>(observation, &self.device).unsqueeze::<4>();
        let q_values = self.q_network.valid().forward(input);
        let q_vec: Vec<f32> = q_values
            .into_data()
            .to_vec()
            .expect("f32 tensor data extraction");

        best_of(&candidates, &q_vec)
    }

    /// One gradient step on a replay minibatch.
    fn train_step(&mut self) -> f32 {
        let batch = self.replay_buffer.sample(self.config.batch_size);
        let batch_size = batch.len();
        let n_actions = self.actions();
        let (h, w) = (self.net_config.height, self.net_config.width);

        let states = encode_batch::<TrainBackend, _>(batch.iter().map(|e| &e.observation), h, w, &self.device);
        let q_all = self.q_network.forward(states);

        let mut action_mask_data = vec![0.0f32; batch_size * n_actions];
        for (i, exp) in batch.iter().enumerate() {
            action_mask_data[i * n_actions + exp.action] = 1.0;
        }
        let action_mask = Tensor::<TrainBackend, 1>::from_data(
            TensorData::from(action_mask_data.as_slice()),
            &self.device,
        )
        .reshape([batch_size as i32, n_actions as i32]);

        // Q(s, a) -> [B, 1]
        let q_taken = (q_all * action_mask).sum_dim(1);

        let next_states =
            encode_batch::<InferBackend, _>(batch.iter().map(|e| &e.next_observation), h, w, &self.device);
        let next_q_data: Vec<f32> = self
            .target_network
            .forward(next_states)
            .into_data()
            .to_vec()
            .expect("f32 tensor data extraction");

        let target_data: Vec<f32> = batch
            .iter()
            .enumerate()
            .map(|(i, exp)| {
                if exp.done {
                    return exp.reward;
                }
                let row = &next_q_data[i * n_actions..(i + 1) * n_actions];
                let max_q = candidate_actions(&exp.next_observation, self.mask_illegal)
                    .iter()
                    .map(|&a| row[a])
                    .fold(f32::NEG_INFINITY, f32::max);
                exp.reward + self.config.gamma * max_q
            })
            .collect();

        let targets = Tensor::<TrainBackend, 1>::from_data(
            TensorData::from(target_data.as_slice()),
            &self.device,
        )
        .reshape([batch_size as i32, 1]);

        let diff = q_taken - targets;
        let loss = (diff.clone() * diff).mean();

        let loss_val: f32 = loss
            .clone()
            .into_data()
            .to_vec::<f32>()
            .expect("f32 loss tensor extraction")[0];

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.q_network);
        self.q_network = self
            .optimizer
            .step(self.config.learning_rate, self.q_network.clone(), grads);

        self.step_count += 1;
        if self.step_count % self.config.target_update_interval == 0 {
            self.target_network = self.q_network.valid();
        }

        loss_val
    }

    /// Linear decay over the configured number of episodes.
    fn decay_epsilon(&mut self) {
        if self.config.epsilon_decay_episodes == 0 {
            self.epsilon = self.config.epsilon_end;
            return;
        }
        let progress = (self.episode_count as f32) / (self.config.epsilon_decay_episodes as f32);
        let progress = progress.min(1.0);
        self.epsilon = self.config.epsilon_start + (self.config.epsilon_end - self.config.epsilon_start) * progress;
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    /// Set epsilon directly (e.g. 0.0 for pure greedy play).
    pub fn set_epsilon(&mut self, eps: f32) {
        self.epsilon = eps;
    }

    pub fn replay_len(&self) -> usize {
        self.replay_buffer.len()
    }

    fn training_state_record(&self) -> DqnTrainingState {
        DqnTrainingState {
            epsilon: self.epsilon,
            step_count: self.step_count,
            episode_count: self.episode_count,
            learning_rate: self.config.learning_rate,
            gamma: self.config.gamma,
            epsilon_start: self.config.epsilon_start,
            epsilon_end: self.config.epsilon_end,
            epsilon_decay_episodes: self.config.epsilon_decay_episodes,
            target_update_interval: self.config.target_update_interval,
            batch_size: self.config.batch_size,
            replay_capacity: self.config.replay_capacity,
            min_replay_size: self.config.min_replay_size,
            mask_illegal_actions: self.mask_illegal,
        }
    }

    fn apply_training_state(&mut self, state: &DqnTrainingState) {
        self.epsilon = state.epsilon;
        self.step_count = state.step_count;
        self.episode_count = state.episode_count;
        if state.mask_illegal_actions != self.mask_illegal {
            tracing::debug!(
                saved = state.mask_illegal_actions,
                current = self.mask_illegal,
                "keeping configured action masking"
            );
        }
        self.config = DqnConfig {
            learning_rate: state.learning_rate,
            gamma: state.gamma,
            epsilon_start: state.epsilon_start,
            epsilon_end: state.epsilon_end,
            epsilon_decay_episodes: state.epsilon_decay_episodes,
            target_update_interval: state.target_update_interval,
            batch_size: state.batch_size,
            replay_capacity: state.replay_capacity,
            min_replay_size: state.min_replay_size,
        };
    }
}

impl Agent for DqnAgent {
    fn select_action(&mut self, observation: &Observation, training: bool) -> usize {
        self.pick_action(observation, training)
    }

    fn name(&self) -> &str {
        "DQN"
    }

    fn batch_update(&mut self, experiences: &[Experience]) -> UpdateMetrics {
        for exp in experiences {
            self.replay_buffer.push(exp.clone());
        }

        self.episode_count += 1;
        self.decay_epsilon();

        // Guard against min_replay_size < batch_size
        let threshold = self.config.min_replay_size.max(self.config.batch_size);
        if self.replay_buffer.len() >= threshold {
            let loss = self.train_step();
            UpdateMetrics {
                loss,
                ..Default::default()
            }
        } else {
            UpdateMetrics::default()
        }
    }
}

impl TrainableAgent for DqnAgent {
    fn algorithm_name(&self) -> &str {
        "DQN"
    }

    fn episode_count(&self) -> usize {
        self.episode_count
    }

    fn step_count(&self) -> usize {
        self.step_count
    }

    fn enter_eval_mode(&mut self) -> EvalState {
        let saved = self.epsilon;
        self.epsilon = 0.0;
        EvalState::Epsilon(saved)
    }

    fn exit_eval_mode(&mut self, state: EvalState) {
        if let EvalState::Epsilon(eps) = state {
            self.epsilon = eps;
        }
    }

    fn algorithm_metric_value(&self) -> f32 {
        self.epsilon
    }

    fn algorithm_metric_label(&self) -> &str {
        "eps"
    }

    fn save_weights(&self, path: &Path) -> Result<(), Box<dyn Error>> {
        let recorder = DefaultRecorder::default();
        self.q_network.clone().valid().save_file(path, &recorder)?;
        Ok(())
    }

    fn load_weights(&mut self, path: &Path) -> Result<(), Box<dyn Error>> {
        let recorder = DefaultRecorder::default();
        let q: DqnNetwork<TrainBackend> =
            self.net_config
                .init(&self.device)
                .load_file(path, &recorder, &self.device)?;
        self.target_network = q.valid();
        self.q_network = q;
        Ok(())
    }

    fn training_state(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self.training_state_record())
    }

    fn restore_training_state(&mut self, state: serde_json::Value) -> Result<(), serde_json::Error> {
        let state: DqnTrainingState = serde_json::from_value(state)?;
        self.apply_training_state(&state);
        Ok(())
    }
}
