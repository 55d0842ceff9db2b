use serde::{Deserialize, Serialize};

/// Metrics snapshot at checkpoint time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckpointMetrics {
    pub win_rate: f32,
    pub average_reward: f32,
    pub average_episode_length: f32,
    pub current_loss: f32,
    pub wins: u64,
    pub losses: u64,
}

/// Sidecar written next to each weights file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    pub algorithm: String,
    /// Environment steps seen by the callback when this was written.
    pub timesteps: u64,
    pub timestamp: u64,
    pub metrics: CheckpointMetrics,
    /// Algorithm-specific state; the agent deserializes its own.
    pub training_state: serde_json::Value,
}

fn default_mask_illegal() -> bool {
    false
}

/// DQN-specific training state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DqnTrainingState {
    pub epsilon: f32,
    pub step_count: usize,
    pub episode_count: usize,
    pub learning_rate: f64,
    pub gamma: f32,
    pub epsilon_start: f32,
    pub epsilon_end: f32,
    pub epsilon_decay_episodes: usize,
    pub target_update_interval: usize,
    pub batch_size: usize,
    pub replay_capacity: usize,
    pub min_replay_size: usize,
    #[serde(default = "default_mask_illegal")]
    pub mask_illegal_actions: bool,
}

/// PPO-specific training state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PgTrainingState {
    pub episode_count: usize,
    pub step_count: usize,
    pub learning_rate: f64,
    pub gamma: f32,
    pub gae_lambda: f32,
    pub ppo_epsilon: f32,
    pub entropy_coeff: f32,
    pub value_coeff: f32,
    pub ppo_epochs: usize,
    pub max_grad_norm: f32,
    #[serde(default = "default_mask_illegal")]
    pub mask_illegal_actions: bool,
}
