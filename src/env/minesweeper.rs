use std::sync::Arc;

use super::reward::RewardConfig;
use super::{Environment, ObservationSpace, SpaceInfo, SpaceType, StepInfo, StepResult};
use crate::browser::GamePage;
use crate::driver::GameDriver;
use crate::error::EnvError;
use crate::game::cell::{CLOSED, MISFLAGGED};
use crate::game::{Board, GameStatus};
use crate::training::metrics::EpisodeTally;
use crate::training::status_feed::{StatusSender, StatusUpdate};
use crate::ui::OverlayHandle;

/// The board grid plus the encoded game status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub board: Board,
    pub status: GameStatus,
}

impl Observation {
    pub fn status_code(&self) -> i32 {
        self.status.code()
    }

    /// Flat indices of the cells a reveal may legally target.
    pub fn legal_actions(&self) -> Vec<usize> {
        self.board.closed_cells()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Reveal,
}

/// (type, x, y) with x the row and y the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Action {
    pub kind: ActionKind,
    pub row: usize,
    pub col: usize,
}

impl Action {
    pub fn reveal(row: usize, col: usize) -> Self {
        Action {
            kind: ActionKind::Reveal,
            row,
            col,
        }
    }

    /// Decode a flat cell index from an agent's action head.
    pub fn from_index(index: usize, width: usize) -> Self {
        Self::reveal(index / width, index % width)
    }
}

/// Environment adapter over a live Minesweeper page.
pub struct MinesweeperEnv<P: GamePage> {
    driver: GameDriver<P>,
    rewards: RewardConfig,
    tally: Arc<EpisodeTally>,
    status_tx: Option<StatusSender>,
    overlay: Option<OverlayHandle>,
    steps: usize,
    max_reward: f32,
    last: Option<Observation>,
}

impl<P: GamePage> MinesweeperEnv<P> {
    /// Wrap a driver, starting the game if it is not running yet.
    pub fn new(
        mut driver: GameDriver<P>,
        rewards: RewardConfig,
        tally: Arc<EpisodeTally>,
    ) -> Result<Self, EnvError> {
        if !driver.is_started() {
            driver.start()?;
        }
        Ok(MinesweeperEnv {
            driver,
            rewards,
            tally,
            status_tx: None,
            overlay: None,
            steps: 0,
            max_reward: 0.0,
            last: None,
        })
    }

    /// Push a status update to this queue after every reward computation.
    pub fn with_status_feed(mut self, tx: StatusSender) -> Self {
        self.status_tx = Some(tx);
        self
    }

    /// Stop this overlay when the environment closes.
    pub fn with_overlay(mut self, overlay: OverlayHandle) -> Self {
        self.overlay = Some(overlay);
        self
    }

    pub fn height(&self) -> usize {
        self.driver.config().height
    }

    pub fn width(&self) -> usize {
        self.driver.config().width
    }

    /// Legal steps taken since the last reset.
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn max_reward(&self) -> f32 {
        self.max_reward
    }

    pub fn tally(&self) -> &Arc<EpisodeTally> {
        &self.tally
    }

    pub fn last_observation(&self) -> Option<&Observation> {
        self.last.as_ref()
    }

    pub fn driver(&self) -> &GameDriver<P> {
        &self.driver
    }

    /// Stop the overlay (signal, then join) and release the browser.
    pub fn close(&mut self) -> Result<(), EnvError> {
        if let Some(overlay) = self.overlay.take() {
            overlay.shutdown();
        }
        self.driver.close()?;
        Ok(())
    }

    fn observe(&mut self) -> Result<Observation, EnvError> {
        let status = self.driver.status()?;
        let board = self.driver.read_board()?;
        Ok(Observation { board, status })
    }

    /// Terminal iff win or lose; a terminal status bumps the tally.
    fn check_done(&self, status: GameStatus) -> bool {
        if status.is_terminal() {
            self.tally.record(status);
            tracing::info!(%status, wins = self.tally.wins(), losses = self.tally.losses(), "episode over");
            true
        } else {
            false
        }
    }

    fn compute_reward(&mut self, status: GameStatus) -> f32 {
        let reward = self.rewards.step_reward(status, self.steps);
        tracing::debug!(reward, steps = self.steps, "reward");
        if let Some(tx) = &self.status_tx {
            tx.send(StatusUpdate {
                wins: self.tally.wins(),
                losses: self.tally.losses(),
                last_reward: reward,
                max_reward: self.max_reward,
            });
        }
        self.max_reward = self.max_reward.max(reward);
        reward
    }
}

impl<P: GamePage> Environment for MinesweeperEnv<P> {
    type Observation = Observation;
    type Action = Action;
    type Error = EnvError;

    fn reset(&mut self) -> Result<Observation, EnvError> {
        tracing::debug!("reset");
        self.steps = 0;
        self.driver.restart()?;
        let observation = self.observe()?;
        self.last = Some(observation.clone());
        Ok(observation)
    }

    fn step(&mut self, action: Action) -> Result<StepResult<Observation>, EnvError> {
        let last = self.last.as_ref().ok_or(EnvError::NotReset)?;
        let (row, col) = (action.row, action.col);
        if !last.board.contains(row, col) {
            return Err(EnvError::ActionOutOfBounds {
                row,
                col,
                height: last.board.height(),
                width: last.board.width(),
            });
        }

        if last.board.get(row, col) != CLOSED {
            let observation = last.clone();
            let status = self.driver.status()?;
            let terminated = self.check_done(status);
            return Ok(StepResult {
                observation,
                reward: self.rewards.illegal_move_penalty,
                terminated,
                truncated: false,
                info: StepInfo { illegal_move: true },
            });
        }

        match action.kind {
            ActionKind::Reveal => self.driver.reveal(row, col)?,
        }
        self.steps += 1;
        let observation = self.observe()?;
        let reward = self.compute_reward(observation.status);
        let terminated = self.check_done(observation.status);
        self.last = Some(observation.clone());

        Ok(StepResult {
            observation,
            reward,
            terminated,
            truncated: false,
            info: StepInfo::default(),
        })
    }

    fn observation_space(&self) -> ObservationSpace {
        ObservationSpace {
            field_state: SpaceInfo {
                shape: vec![self.height(), self.width()],
                dtype: SpaceType::IntBox {
                    low: MISFLAGGED,
                    high: CLOSED,
                },
            },
            game_state: SpaceInfo {
                shape: vec![1],
                dtype: SpaceType::Discrete(3),
            },
        }
    }

    fn action_space(&self) -> SpaceInfo {
        SpaceInfo {
            shape: vec![1, self.height(), self.width()],
            dtype: SpaceType::MultiDiscrete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::FakePage;
    use crate::driver::GameConfig;
    use crate::training::status_feed::status_channel;

    fn make_env(height: usize, width: usize, mines: &[(usize, usize)]) -> MinesweeperEnv<FakePage> {
        let config = GameConfig {
            height,
            width,
            mines: mines.len(),
            ..Default::default()
        };
        let driver = GameDriver::new(FakePage::new(height, width, mines), config);
        MinesweeperEnv::new(driver, RewardConfig::default(), Arc::new(EpisodeTally::new()))
            .unwrap()
    }

    #[test]
    fn test_step_before_reset_fails() {
        let mut env = make_env(2, 2, &[(0, 0)]);
        assert!(matches!(env.step(Action::reveal(1, 1)), Err(EnvError::NotReset)));
    }

    #[test]
    fn test_reset_returns_closed_board() {
        let mut env = make_env(3, 3, &[(1, 1)]);
        let obs = env.reset().unwrap();
        assert_eq!(obs.status, GameStatus::InProgress);
        assert_eq!(obs.board.closed_cells().len(), 9);
        assert_eq!(env.steps(), 0);
    }

    #[test]
    fn test_step_on_closed_cell_reveals() {
        let mut env = make_env(1, 3, &[(0, 1)]);
        env.reset().unwrap();
        let clicks_before = env.driver().page().cell_clicks();

        let result = env.step(Action::reveal(0, 0)).unwrap();
        assert_eq!(env.driver().page().cell_clicks(), clicks_before + 1);
        assert_eq!(result.observation.board.get(0, 0), 1);
        assert_eq!(result.reward, 10.0);
        assert!(!result.terminated);
        assert!(!result.info.illegal_move);
        assert_eq!(env.steps(), 1);
    }

    #[test]
    fn test_step_on_open_cell_is_penalized_without_click() {
        let mut env = make_env(1, 3, &[(0, 1)]);
        env.reset().unwrap();
        let first = env.step(Action::reveal(0, 0)).unwrap();
        let clicks = env.driver().page().cell_clicks();

        let result = env.step(Action::reveal(0, 0)).unwrap();
        assert_eq!(result.reward, -10.0);
        assert!(result.info.illegal_move);
        assert!(!result.terminated);
        assert_eq!(result.observation, first.observation);
        assert_eq!(env.driver().page().cell_clicks(), clicks);
        assert_eq!(env.steps(), 1);
    }

    #[test]
    fn test_step_out_of_bounds() {
        let mut env = make_env(2, 2, &[(0, 0)]);
        env.reset().unwrap();
        assert!(matches!(
            env.step(Action::reveal(2, 0)),
            Err(EnvError::ActionOutOfBounds { row: 2, col: 0, .. })
        ));
    }

    #[test]
    fn test_win_reward_includes_step_bonus() {
        let mut env = make_env(1, 3, &[(0, 1)]);
        env.reset().unwrap();
        env.step(Action::reveal(0, 0)).unwrap();
        let result = env.step(Action::reveal(0, 2)).unwrap();
        assert_eq!(result.observation.status, GameStatus::Win);
        assert!(result.terminated);
        assert_eq!(result.reward, 1000.0 + 10.0 * 2.0);
        assert_eq!(env.tally().wins(), 1);
    }

    #[test]
    fn test_loss_reward_includes_step_bonus() {
        let mut env = make_env(1, 3, &[(0, 1)]);
        env.reset().unwrap();
        env.step(Action::reveal(0, 0)).unwrap();
        let result = env.step(Action::reveal(0, 1)).unwrap();
        assert_eq!(result.observation.status, GameStatus::Lose);
        assert!(result.terminated);
        assert_eq!(result.reward, -500.0 + 10.0 * 2.0);
        assert_eq!(env.tally().losses(), 1);
    }

    #[test]
    fn test_reset_after_terminal_restores_in_progress() {
        let mut env = make_env(1, 3, &[(0, 1)]);
        env.reset().unwrap();
        assert!(env.step(Action::reveal(0, 1)).unwrap().terminated);

        let obs = env.reset().unwrap();
        assert_eq!(obs.status, GameStatus::InProgress);
        assert_eq!(env.steps(), 0);
        // Tally survives the reset
        assert_eq!(env.tally().losses(), 1);

        env.step(Action::reveal(0, 1)).unwrap();
        assert_eq!(env.tally().losses(), 2);
    }

    #[test]
    fn test_status_feed_receives_update_per_reward() {
        let (tx, rx) = status_channel(8);
        let mut env = make_env(1, 3, &[(0, 1)]).with_status_feed(tx);
        env.reset().unwrap();
        env.step(Action::reveal(0, 0)).unwrap();
        env.step(Action::reveal(0, 0)).unwrap(); // illegal, no reward computation
        env.step(Action::reveal(0, 2)).unwrap();

        let updates: Vec<StatusUpdate> = rx.try_iter().collect();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].last_reward, 10.0);
        assert_eq!(updates[1].last_reward, 1020.0);
        // Max reported is the best before this reward
        assert_eq!(updates[1].max_reward, 10.0);
        assert_eq!(env.max_reward(), 1020.0);
    }

    #[test]
    fn test_spaces() {
        let env = make_env(8, 8, &[]);
        assert_eq!(env.action_space().shape, vec![1, 8, 8]);
        assert_eq!(env.action_space().dtype, SpaceType::MultiDiscrete);
        let obs_space = env.observation_space();
        assert_eq!(obs_space.field_state.shape, vec![8, 8]);
        assert_eq!(obs_space.game_state.dtype, SpaceType::Discrete(3));
    }

    #[test]
    fn test_action_from_index() {
        assert_eq!(Action::from_index(13, 5), Action::reveal(2, 3));
    }

    #[test]
    fn test_close_releases_driver() {
        let mut env = make_env(2, 2, &[]);
        env.close().unwrap();
        assert!(env.driver().page().closed);
    }
}
