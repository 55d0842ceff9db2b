use crate::game::GameStatus;

/// Reward constants.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    pub win_reward: f32,
    pub loss_penalty: f32,
    /// Paid per step taken so far this episode, on every legal step.
    pub step_bonus: f32,
    pub illegal_move_penalty: f32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        RewardConfig {
            win_reward: 1000.0,
            loss_penalty: -500.0,
            step_bonus: 10.0,
            illegal_move_penalty: -10.0,
        }
    }
}

impl RewardConfig {
    /// Reward for a legal step, given the status after the click and the
    /// episode's step count including this step.
    ///
    /// The bonus grows with episode length regardless of outcome.
    pub fn step_reward(&self, status: GameStatus, steps: usize) -> f32 {
        let outcome = match status {
            GameStatus::Win => self.win_reward,
            GameStatus::Lose => self.loss_penalty,
            GameStatus::InProgress => 0.0,
        };
        outcome + self.step_bonus * steps as f32
    }
}
