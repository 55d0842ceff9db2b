use std::path::PathBuf;

use crate::ai::{Experience, TrainableAgent};
use crate::browser::GamePage;
use crate::checkpoint::{CheckpointManager, CheckpointMetrics};
use crate::env::{Action, Environment, MinesweeperEnv};
use crate::error::{CheckpointError, TrainingError};
use crate::game::GameStatus;
use crate::training::metrics::{EpisodeResult, EpisodeTally, TrainingMetrics};
use crate::training::results_log::append_line;

/// `[training]` section.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Environment steps per learning cycle.
    pub total_timesteps: u64,
    /// Progress and checkpoint callbacks fire every this many steps.
    pub save_freq: u64,
    /// Episodes between progress log lines.
    pub log_interval: usize,
    /// Episodes longer than this are cut off and counted as truncated.
    pub max_episode_steps: usize,
    /// Offer agents only closed cells.
    pub mask_illegal_actions: bool,
    /// Finished episodes are appended here, one timestamped line each.
    pub results_log: Option<PathBuf>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            total_timesteps: 10_000_000,
            save_freq: 100_000,
            log_interval: 100,
            max_episode_steps: 200,
            mask_illegal_actions: false,
            results_log: Some(PathBuf::from("results.log")),
        }
    }
}

/// What one call to [`Trainer::learn`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleSummary {
    pub timesteps: u64,
    pub episodes: usize,
}

/// Runs learning cycles against a live environment.
///
/// The step counter behind the callbacks lives here, not in `learn`, so it
/// keeps counting across cycles.
pub struct Trainer {
    config: TrainerConfig,
    checkpoints: CheckpointManager,
    metrics: TrainingMetrics,
    n_calls: u64,
}

impl Trainer {
    pub fn new(config: TrainerConfig, checkpoints: CheckpointManager) -> Self {
        Trainer {
            metrics: TrainingMetrics::with_capacity(config.log_interval.max(100)),
            config,
            checkpoints,
            n_calls: 0,
        }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn checkpoints(&self) -> &CheckpointManager {
        &self.checkpoints
    }

    pub fn metrics(&self) -> &TrainingMetrics {
        &self.metrics
    }

    /// Steps seen by the callbacks so far.
    pub fn n_calls(&self) -> u64 {
        self.n_calls
    }

    /// One learning cycle of `total_timesteps` environment steps.
    pub fn learn<P: GamePage>(
        &mut self,
        env: &mut MinesweeperEnv<P>,
        agent: &mut dyn TrainableAgent,
    ) -> Result<CycleSummary, TrainingError> {
        let budget = self.config.total_timesteps;
        let mut timesteps = 0u64;
        let mut episodes = 0usize;

        tracing::info!(
            algorithm = agent.algorithm_name(),
            budget,
            n_calls = self.n_calls,
            "learning cycle started"
        );

        while timesteps < budget {
            let (experiences, result) = self.run_episode(env, agent, budget - timesteps)?;
            timesteps += result.steps as u64;

            let update = agent.batch_update(&experiences);
            if update.loss > 0.0 {
                self.metrics.record_update(update.loss);
            }

            self.log_result(&result);
            self.metrics.record_episode(result);
            episodes += 1;

            if episodes % self.config.log_interval.max(1) == 0 {
                let window = self.config.log_interval;
                tracing::info!(
                    episode = self.metrics.total_episodes(),
                    timesteps,
                    win_rate = self.metrics.win_rate(window),
                    truncated = self.metrics.truncation_rate(window),
                    avg_reward = self.metrics.average_reward(window),
                    avg_len = self.metrics.average_episode_length(window),
                    loss = self.metrics.average_loss(window),
                    metric = agent.algorithm_metric_label(),
                    value = agent.algorithm_metric_value(),
                    "training progress"
                );
            }
        }

        tracing::info!(timesteps, episodes, "learning cycle finished");
        Ok(CycleSummary { timesteps, episodes })
    }

    /// Play until terminal, the step limit, or the remaining budget.
    fn run_episode<P: GamePage>(
        &mut self,
        env: &mut MinesweeperEnv<P>,
        agent: &mut dyn TrainableAgent,
        remaining: u64,
    ) -> Result<(Vec<Experience>, EpisodeResult), TrainingError> {
        let width = env.width();
        let limit = (self.config.max_episode_steps as u64).min(remaining) as usize;

        let mut observation = env.reset()?;
        let mut experiences = Vec::new();
        let mut total_reward = 0.0;
        let mut status = GameStatus::InProgress;

        while experiences.len() < limit {
            let index = agent.select_action(&observation, true);
            let step = env.step(Action::from_index(index, width))?;
            self.on_step(&*agent, env.tally());

            total_reward += step.reward;
            let done = step.terminated;
            experiences.push(Experience {
                observation,
                action: index,
                reward: step.reward,
                next_observation: step.observation.clone(),
                done,
            });
            observation = step.observation;

            if done {
                status = observation.status;
                break;
            }
        }

        let result = EpisodeResult {
            status,
            steps: experiences.len(),
            total_reward,
        };
        Ok((experiences, result))
    }

    /// Per-step callbacks: bump the progress file and write a checkpoint
    /// every `save_freq` calls. Failures are logged, never fatal.
    fn on_step(&mut self, agent: &dyn TrainableAgent, tally: &EpisodeTally) {
        self.n_calls += 1;
        let freq = self.config.save_freq;
        if freq == 0 || self.n_calls % freq != 0 {
            return;
        }

        match self.checkpoints.progress().advance(freq) {
            Ok(total) => tracing::info!(total, "progress saved"),
            Err(e) => tracing::error!(error = %e, "failed to save progress"),
        }

        let metrics = self.checkpoint_metrics(tally);
        if let Err(e) = self.checkpoints.save_checkpoint(agent, &metrics, self.n_calls) {
            tracing::error!(error = %e, n_calls = self.n_calls, "failed to save checkpoint");
        }
    }

    fn log_result(&self, result: &EpisodeResult) {
        let Some(path) = &self.config.results_log else {
            return;
        };
        let line = format!(
            "{} steps={} reward={}",
            result.status, result.steps, result.total_reward
        );
        if let Err(e) = append_line(path, &line) {
            tracing::warn!(error = %e, path = %path.display(), "failed to append result");
        }
    }

    fn checkpoint_metrics(&self, tally: &EpisodeTally) -> CheckpointMetrics {
        let window = self.config.log_interval;
        CheckpointMetrics {
            win_rate: self.metrics.win_rate(window),
            average_reward: self.metrics.average_reward(window),
            average_episode_length: self.metrics.average_episode_length(window),
            current_loss: self.metrics.average_loss(window),
            wins: tally.wins(),
            losses: tally.losses(),
        }
    }

    /// Snapshot named after the stored progress counter.
    pub fn save_final(
        &self,
        agent: &dyn TrainableAgent,
        tally: &EpisodeTally,
    ) -> Result<PathBuf, CheckpointError> {
        let progress = self.checkpoints.progress().load()?;
        self.checkpoints
            .save_final(agent, &self.checkpoint_metrics(tally), progress)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;

    use super::*;
    use crate::ai::{DqnAgent, DqnConfig};
    use crate::browser::fake::FakePage;
    use crate::driver::{GameConfig, GameDriver};
    use crate::env::RewardConfig;

    fn make_env(tally: Arc<EpisodeTally>) -> MinesweeperEnv<FakePage> {
        let config = GameConfig {
            height: 2,
            width: 2,
            mines: 1,
            ..Default::default()
        };
        let driver = GameDriver::new(FakePage::new(2, 2, &[(1, 1)]), config);
        MinesweeperEnv::new(driver, RewardConfig::default(), tally).unwrap()
    }

    fn idle_agent(mask: bool) -> DqnAgent {
        DqnAgent::new(
            DqnConfig {
                min_replay_size: 1_000_000,
                ..Default::default()
            },
            2,
            2,
        )
        .with_action_masking(mask)
    }

    #[test]
    fn test_learn_runs_budget_and_fires_callbacks() {
        let dir = tempfile::tempdir().unwrap();
        let results = dir.path().join("results.log");
        let config = TrainerConfig {
            total_timesteps: 10,
            save_freq: 4,
            log_interval: 1,
            max_episode_steps: 50,
            mask_illegal_actions: true,
            results_log: Some(results.clone()),
        };
        let checkpoints = CheckpointManager::with_dir(dir.path().join("DQN"), "DQN_model", 5);
        let mut trainer = Trainer::new(config, checkpoints);

        let tally = Arc::new(EpisodeTally::new());
        let mut env = make_env(tally.clone());
        let mut agent = idle_agent(true);

        let summary = trainer.learn(&mut env, &mut agent).unwrap();

        assert_eq!(summary.timesteps, 10);
        assert_eq!(trainer.n_calls(), 10);
        assert_eq!(trainer.checkpoints().progress().load().unwrap(), 8);
        assert!(dir.path().join("DQN/DQN_model_4_steps.mpk").exists());
        assert!(dir.path().join("DQN/DQN_model_8_steps.mpk").exists());

        // Every episode got a line; only the last may be cut short by the budget.
        let lines = fs::read_to_string(&results).unwrap().lines().count();
        assert_eq!(lines, summary.episodes);
        assert_eq!(trainer.metrics().total_episodes(), summary.episodes);
        let finished = (tally.wins() + tally.losses()) as usize;
        assert!(finished + 1 >= summary.episodes && finished <= summary.episodes);
    }

    #[test]
    fn test_callback_counter_spans_cycles() {
        let dir = tempfile::tempdir().unwrap();
        let config = TrainerConfig {
            total_timesteps: 3,
            save_freq: 5,
            mask_illegal_actions: true,
            results_log: None,
            ..Default::default()
        };
        let checkpoints = CheckpointManager::with_dir(dir.path(), "DQN_model", 0);
        let mut trainer = Trainer::new(config, checkpoints);
        let mut env = make_env(Arc::new(EpisodeTally::new()));
        let mut agent = idle_agent(true);

        trainer.learn(&mut env, &mut agent).unwrap();
        assert_eq!(trainer.checkpoints().progress().load().unwrap(), 0);
        trainer.learn(&mut env, &mut agent).unwrap();

        assert_eq!(trainer.n_calls(), 6);
        assert_eq!(trainer.checkpoints().progress().load().unwrap(), 5);
        assert!(dir.path().join("DQN_model_5_steps.mpk").exists());
    }

    #[test]
    fn test_progress_resumes_from_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let checkpoints = CheckpointManager::with_dir(dir.path(), "DQN_model", 5);
        checkpoints.progress().save(100_000).unwrap();

        let config = TrainerConfig {
            total_timesteps: 2,
            save_freq: 2,
            mask_illegal_actions: true,
            results_log: None,
            ..Default::default()
        };
        let mut trainer = Trainer::new(config, checkpoints);
        let mut env = make_env(Arc::new(EpisodeTally::new()));
        let mut agent = idle_agent(true);
        trainer.learn(&mut env, &mut agent).unwrap();

        assert_eq!(trainer.checkpoints().progress().load().unwrap(), 100_002);
    }

    #[test]
    fn test_max_episode_steps_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let config = TrainerConfig {
            total_timesteps: 6,
            save_freq: 1_000,
            max_episode_steps: 2,
            mask_illegal_actions: false,
            results_log: None,
            ..Default::default()
        };
        let checkpoints = CheckpointManager::with_dir(dir.path(), "DQN_model", 5);
        let mut trainer = Trainer::new(config, checkpoints);
        let mut env = make_env(Arc::new(EpisodeTally::new()));
        let mut agent = idle_agent(false);

        let summary = trainer.learn(&mut env, &mut agent).unwrap();
        assert_eq!(summary.timesteps, 6);
        assert!(summary.episodes >= 3);
        assert!(trainer.metrics().average_episode_length(100) <= 2.0);
    }

    #[test]
    fn test_save_final_uses_progress_counter() {
        let dir = tempfile::tempdir().unwrap();
        let checkpoints = CheckpointManager::with_dir(dir.path(), "DQN_model", 5);
        checkpoints.progress().save(300_000).unwrap();
        let trainer = Trainer::new(TrainerConfig::default(), checkpoints);

        let path = trainer
            .save_final(&idle_agent(false), &EpisodeTally::new())
            .unwrap();
        assert_eq!(path, dir.path().join("DQN_model_final_300000.mpk"));
        assert!(path.exists());
    }
}
