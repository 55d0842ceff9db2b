use std::error::Error;
use std::path::Path;

use crate::env::Observation;

/// A single transition collected from the environment.
#[derive(Debug, Clone)]
pub struct Experience {
    pub observation: Observation,
    /// Flat cell index, `row * width + col`.
    pub action: usize,
    pub reward: f32,
    pub next_observation: Observation,
    pub done: bool,
}

/// Metrics returned from a training update.
#[derive(Debug, Clone, Default)]
pub struct UpdateMetrics {
    pub loss: f32,
    pub policy_entropy: Option<f32>,
}

/// Actions an agent may choose from.
///
/// With masking on, only closed cells are offered; if none remain every cell
/// is. Without masking the whole grid is fair game and the environment
/// penalizes bad picks.
pub fn candidate_actions(observation: &Observation, mask_illegal: bool) -> Vec<usize> {
    if mask_illegal {
        let closed = observation.legal_actions();
        if !closed.is_empty() {
            return closed;
        }
    }
    (0..observation.board.len()).collect()
}

/// Highest-scoring candidate; ties go to the first.
pub(crate) fn best_of(candidates: &[usize], scores: &[f32]) -> usize {
    let mut best_action = candidates[0];
    let mut best = f32::NEG_INFINITY;
    for &a in candidates {
        if scores[a] > best {
            best = scores[a];
            best_action = a;
        }
    }
    best_action
}

/// Universal interface for all agents.
pub trait Agent {
    /// Pick a flat cell index for the given observation.
    /// When `training` is true, the agent may explore; otherwise it exploits.
    fn select_action(&mut self, observation: &Observation, training: bool) -> usize;

    fn name(&self) -> &str;

    /// Update from a single transition.
    fn update(&mut self, _experience: Experience) -> UpdateMetrics {
        UpdateMetrics::default()
    }

    /// Update from one finished episode.
    fn batch_update(&mut self, experiences: &[Experience]) -> UpdateMetrics {
        let mut metrics = UpdateMetrics::default();
        for exp in experiences {
            metrics = self.update(exp.clone());
        }
        metrics
    }
}

/// Opaque eval state for enter/exit eval mode.
pub enum EvalState {
    Epsilon(f32),
    NoOp,
}

/// Agents that learn, save and resume.
pub trait TrainableAgent: Agent {
    /// "PPO" or "DQN".
    fn algorithm_name(&self) -> &str;
    fn episode_count(&self) -> usize;
    fn step_count(&self) -> usize;
    /// Enter eval mode (e.g. epsilon=0 for DQN). Returns state to restore.
    fn enter_eval_mode(&mut self) -> EvalState;
    fn exit_eval_mode(&mut self, state: EvalState);
    /// Epsilon for DQN, last entropy for PPO.
    fn algorithm_metric_value(&self) -> f32;
    fn algorithm_metric_label(&self) -> &str;
    /// Write network weights to `path`; the recorder picks the extension.
    fn save_weights(&self, path: &Path) -> Result<(), Box<dyn Error>>;
    /// Replace network weights from a file written by `save_weights`.
    fn load_weights(&mut self, path: &Path) -> Result<(), Box<dyn Error>>;
    fn training_state(&self) -> Result<serde_json::Value, serde_json::Error>;
    fn restore_training_state(&mut self, state: serde_json::Value)
        -> Result<(), serde_json::Error>;
}
