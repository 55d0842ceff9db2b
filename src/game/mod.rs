//! Minesweeper board model: per-cell integer codes, the CSS class lookup
//! that produces them, and the game status read from the face indicator.

mod board;
pub mod cell;
mod status;

pub use board::Board;
pub use cell::{translate_cell_class, ClassScheme};
pub use status::GameStatus;
