//! # ML Minesweeper
//!
//! Trains reinforcement-learning agents on a Minesweeper game rendered in a
//! real browser. The game is driven through DOM automation: clicks go to cell
//! elements and the board is read back from their CSS classes.
//!
//! ## Modules
//!
//! - [`browser`]: Page automation seam and its headless Chrome implementation
//! - [`driver`]: Game-level operations on a page and the board reader
//! - [`game`]: Board grid, cell codes, game status
//! - [`env`]: RL environment adapter and reward shaping
//! - [`ai`]: Agent traits, DQN and PPO agents, networks, state encoding
//! - [`training`]: Learn loop, progress/checkpoint callbacks, metrics, evaluation
//! - [`checkpoint`]: Model persistence, progress counter, latest-file lookup
//! - [`ui`]: Terminal status overlay
//! - [`config`]: TOML configuration loading and validation
//! - [`logging`]: Tracing subscriber setup
//! - [`error`]: Structured error types

#![recursion_limit = "256"]

pub mod ai;
pub mod browser;
pub mod checkpoint;
pub mod config;
pub mod driver;
pub mod env;
pub mod error;
pub mod game;
pub mod logging;
pub mod training;
pub mod ui;
