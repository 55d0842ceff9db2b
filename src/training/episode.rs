use crate::ai::{Agent, TrainableAgent};
use crate::browser::GamePage;
use crate::env::{Action, Environment, MinesweeperEnv};
use crate::error::EnvError;
use crate::game::GameStatus;

use super::metrics::EpisodeResult;

/// Outcome of a batch of evaluation episodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvalReport {
    pub episodes: usize,
    pub wins: usize,
    pub losses: usize,
    pub average_reward: f32,
    pub average_length: f32,
}

impl EvalReport {
    pub fn win_rate(&self) -> f32 {
        if self.episodes == 0 {
            0.0
        } else {
            self.wins as f32 / self.episodes as f32
        }
    }

    /// Episodes cut off by the step limit.
    pub fn unfinished(&self) -> usize {
        self.episodes - self.wins - self.losses
    }
}

/// Play one episode without learning. Stops at a terminal status or after
/// `max_steps` steps.
///
/// Agents are asked with `training = false`; the built-in agents then only
/// pick closed cells, so every step opens at least one cell.
pub fn play_episode<P: GamePage, A: Agent + ?Sized>(
    env: &mut MinesweeperEnv<P>,
    agent: &mut A,
    max_steps: usize,
) -> Result<EpisodeResult, EnvError> {
    let width = env.width();
    let mut observation = env.reset()?;
    let mut steps = 0;
    let mut total_reward = 0.0;

    while steps < max_steps {
        let index = agent.select_action(&observation, false);
        let step = env.step(Action::from_index(index, width))?;
        steps += 1;
        total_reward += step.reward;
        observation = step.observation;
        if step.terminated {
            return Ok(EpisodeResult {
                status: observation.status,
                steps,
                total_reward,
            });
        }
    }

    Ok(EpisodeResult {
        status: GameStatus::InProgress,
        steps,
        total_reward,
    })
}

/// Play `episodes` greedy episodes and summarize them.
pub fn evaluate<P: GamePage, A: Agent + ?Sized>(
    env: &mut MinesweeperEnv<P>,
    agent: &mut A,
    episodes: usize,
    max_steps: usize,
) -> Result<EvalReport, EnvError> {
    let mut report = EvalReport::default();
    let mut reward_sum = 0.0;
    let mut length_sum = 0;

    for episode in 0..episodes {
        let result = play_episode(&mut *env, &mut *agent, max_steps)?;
        tracing::info!(episode, status = %result.status, steps = result.steps, reward = result.total_reward, "eval episode");
        match result.status {
            GameStatus::Win => report.wins += 1,
            GameStatus::Lose => report.losses += 1,
            GameStatus::InProgress => {}
        }
        reward_sum += result.total_reward;
        length_sum += result.steps;
        report.episodes += 1;
    }

    if report.episodes > 0 {
        report.average_reward = reward_sum / report.episodes as f32;
        report.average_length = length_sum as f32 / report.episodes as f32;
    }
    Ok(report)
}

/// [`evaluate`] with exploration switched off for the duration.
pub fn evaluate_trainable<P: GamePage>(
    env: &mut MinesweeperEnv<P>,
    agent: &mut dyn TrainableAgent,
    episodes: usize,
    max_steps: usize,
) -> Result<EvalReport, EnvError> {
    let eval_state = agent.enter_eval_mode();
    let report = evaluate(env, &mut *agent, episodes, max_steps);
    agent.exit_eval_mode(eval_state);
    report
}
