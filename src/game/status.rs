use std::fmt;

/// Game status as shown by the face/status indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameStatus {
    InProgress,
    Win,
    Lose,
}

impl GameStatus {
    /// Derive the status from the indicator's `class` attribute.
    /// `game-over` is checked first so a class carrying both reads as a loss.
    pub fn from_indicator_class(class: &str) -> GameStatus {
        if class.contains("game-over") {
            GameStatus::Lose
        } else if class.contains("win") {
            GameStatus::Win
        } else {
            GameStatus::InProgress
        }
    }

    /// Integer encoding used in observations.
    pub fn code(self) -> i32 {
        match self {
            GameStatus::InProgress => 0,
            GameStatus::Win => 1,
            GameStatus::Lose => 2,
        }
    }

    pub fn is_terminal(self) -> bool {
        self != GameStatus::InProgress
    }

    pub fn name(self) -> &'static str {
        match self {
            GameStatus::InProgress => "inprogress",
            GameStatus::Win => "win",
            GameStatus::Lose => "lose",
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
