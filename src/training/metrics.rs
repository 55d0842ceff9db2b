use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::game::GameStatus;

/// Lifetime win/loss counters.
///
/// Owned by whoever drives training and shared with the environment; never
/// reset between episodes.
#[derive(Debug, Default)]
pub struct EpisodeTally {
    wins: AtomicU64,
    losses: AtomicU64,
}

impl EpisodeTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a terminal status. In-progress is ignored.
    pub fn record(&self, status: GameStatus) {
        match status {
            GameStatus::Win => {
                self.wins.fetch_add(1, Ordering::Relaxed);
            }
            GameStatus::Lose => {
                self.losses.fetch_add(1, Ordering::Relaxed);
            }
            GameStatus::InProgress => {}
        }
    }

    pub fn wins(&self) -> u64 {
        self.wins.load(Ordering::Relaxed)
    }

    pub fn losses(&self) -> u64 {
        self.losses.load(Ordering::Relaxed)
    }
}

/// Result of a single episode.
#[derive(Debug, Clone)]
pub struct EpisodeResult {
    /// `InProgress` when the episode was truncated.
    pub status: GameStatus,
    pub steps: usize,
    pub total_reward: f32,
}

/// Training metrics tracker with rolling window computations.
pub struct TrainingMetrics {
    episode_results: VecDeque<EpisodeResult>,
    update_losses: VecDeque<f32>,
    capacity: usize,
    total_episodes: usize, // lifetime count, never capped
}

impl TrainingMetrics {
    pub fn with_capacity(capacity: usize) -> Self {
        TrainingMetrics {
            episode_results: VecDeque::with_capacity(capacity),
            update_losses: VecDeque::with_capacity(capacity),
            capacity,
            total_episodes: 0,
        }
    }

    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    pub fn record_episode(&mut self, result: EpisodeResult) {
        self.total_episodes += 1;
        self.episode_results.push_back(result);
        if self.episode_results.len() > self.capacity {
            self.episode_results.pop_front();
        }
    }

    pub fn record_update(&mut self, loss: f32) {
        self.update_losses.push_back(loss);
        if self.update_losses.len() > self.capacity {
            self.update_losses.pop_front();
        }
    }

    fn recent(&self, last_n: usize) -> impl Iterator<Item = &EpisodeResult> {
        self.episode_results.iter().rev().take(last_n)
    }

    fn window(&self, last_n: usize) -> usize {
        self.episode_results.len().min(last_n)
    }

    /// Fraction of the last N episodes that ended in a win.
    pub fn win_rate(&self, last_n: usize) -> f32 {
        let n = self.window(last_n);
        if n == 0 {
            return 0.0;
        }
        let wins = self
            .recent(n)
            .filter(|r| r.status == GameStatus::Win)
            .count();
        wins as f32 / n as f32
    }

    /// Fraction of the last N episodes cut off before win or loss.
    pub fn truncation_rate(&self, last_n: usize) -> f32 {
        let n = self.window(last_n);
        if n == 0 {
            return 0.0;
        }
        let truncated = self
            .recent(n)
            .filter(|r| r.status == GameStatus::InProgress)
            .count();
        truncated as f32 / n as f32
    }

    pub fn average_reward(&self, last_n: usize) -> f32 {
        let n = self.window(last_n);
        if n == 0 {
            return 0.0;
        }
        self.recent(n).map(|r| r.total_reward).sum::<f32>() / n as f32
    }

    /// Average loss over the last N updates.
    pub fn average_loss(&self, last_n: usize) -> f32 {
        let n = self.update_losses.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let sum: f32 = self.update_losses.iter().rev().take(n).sum();
        sum / n as f32
    }

    pub fn average_episode_length(&self, last_n: usize) -> f32 {
        let n = self.window(last_n);
        if n == 0 {
            return 0.0;
        }
        let total: usize = self.recent(n).map(|r| r.steps).sum();
        total as f32 / n as f32
    }

    pub fn total_episodes(&self) -> usize {
        self.total_episodes
    }
}

impl Default for TrainingMetrics {
    fn default() -> Self {
        Self::new()
    }
}
