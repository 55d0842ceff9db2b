//! RL environment contract and the Minesweeper adapter that satisfies it.

mod minesweeper;
mod reward;

pub use minesweeper::{Action, ActionKind, MinesweeperEnv, Observation};
pub use reward::RewardConfig;

/// Core trait for RL environments.
pub trait Environment {
    type Observation;
    type Action;
    type Error;

    /// Reset the environment and return the initial observation.
    fn reset(&mut self) -> Result<Self::Observation, Self::Error>;

    /// Step the environment with an action.
    fn step(&mut self, action: Self::Action) -> Result<StepResult<Self::Observation>, Self::Error>;

    fn observation_space(&self) -> ObservationSpace;

    fn action_space(&self) -> SpaceInfo;
}

/// Result of an environment step.
#[derive(Debug, Clone)]
pub struct StepResult<O> {
    pub observation: O,
    pub reward: f32,
    pub terminated: bool,
    /// The adapter never truncates; the trainer enforces episode limits.
    pub truncated: bool,
    pub info: StepInfo,
}

/// Extra per-step detail.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepInfo {
    /// The action targeted a cell that was not closed; nothing was clicked.
    pub illegal_move: bool,
}

/// Shape and kind of a space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpaceInfo {
    pub shape: Vec<usize>,
    pub dtype: SpaceType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpaceType {
    /// Discrete space with n options.
    Discrete(usize),
    /// Integer box with inclusive bounds.
    IntBox { low: i32, high: i32 },
    /// One discrete choice per entry of `shape`, entry i having `shape[i]` options.
    MultiDiscrete,
}

/// Dict-style observation space: the grid plus the status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservationSpace {
    pub field_state: SpaceInfo,
    pub game_state: SpaceInfo,
}
