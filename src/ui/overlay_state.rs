use std::collections::VecDeque;

use crate::training::status_feed::StatusUpdate;

const MAX_HISTORY: usize = 200;

/// What the overlay currently shows.
pub struct OverlayState {
    pub latest: Option<StatusUpdate>,
    pub updates_seen: u64,
    /// Recent rewards for the sparkline, oldest first.
    pub reward_history: VecDeque<f32>,
}

impl OverlayState {
    pub fn new() -> Self {
        OverlayState {
            latest: None,
            updates_seen: 0,
            reward_history: VecDeque::new(),
        }
    }

    pub fn apply(&mut self, update: StatusUpdate) {
        self.updates_seen += 1;
        self.reward_history.push_back(update.last_reward);
        if self.reward_history.len() > MAX_HISTORY {
            self.reward_history.pop_front();
        }
        self.latest = Some(update);
    }

    /// Lines of the status text, or a placeholder before the first update.
    pub fn lines(&self) -> Vec<String> {
        match &self.latest {
            Some(update) => update.to_string().lines().map(str::to_string).collect(),
            None => vec!["Waiting for first step...".to_string()],
        }
    }

    /// Rewards shifted to be non-negative, as sparkline bars need.
    pub fn sparkline_data(&self) -> Vec<u64> {
        let min = self
            .reward_history
            .iter()
            .copied()
            .fold(f32::INFINITY, f32::min);
        self.reward_history
            .iter()
            .map(|&r| (r - min).max(0.0) as u64)
            .collect()
    }
}

impl Default for OverlayState {
    fn default() -> Self {
        Self::new()
    }
}
