//! Game driver: owns the page session and exposes the handful of game-level
//! operations (start, restart, reveal, flag, status, board read).

mod board_reader;

pub use board_reader::{board_from_elements, read_board};

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::browser::{ChromePage, ChromeOptions, GamePage};
use crate::error::DriverError;
use crate::game::{Board, ClassScheme, GameStatus};

/// Where the game lives and how it is rendered.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Local HTML file or an http(s) URL.
    pub page: String,
    pub height: usize,
    pub width: usize,
    pub mines: usize,
    pub headless: bool,
    pub class_scheme: ClassScheme,
    pub face_selector: String,
    /// Selector template; `{row}` and `{col}` are substituted.
    pub cell_selector: String,
    pub start_wait_ms: u64,
    pub window_width: u32,
    pub window_height: u32,
    pub idle_timeout_secs: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            page: "winmine.html".to_string(),
            height: 8,
            width: 8,
            mines: 10,
            headless: false,
            class_scheme: ClassScheme::Clear,
            face_selector: ".smiley-container".to_string(),
            cell_selector: "#cell_{row}_{col}".to_string(),
            start_wait_ms: 1000,
            window_width: 1024,
            window_height: 768,
            idle_timeout_secs: 3600,
        }
    }
}

impl GameConfig {
    /// Full game URL including the board-size query.
    pub fn url(&self) -> String {
        let base = if self.page.starts_with("http://")
            || self.page.starts_with("https://")
            || self.page.starts_with("file://")
        {
            self.page.clone()
        } else {
            let path = Path::new(&self.page);
            let abs: PathBuf = if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|d| d.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            };
            format!("file://{}", abs.display())
        };
        format!(
            "{}?height={}&width={}&mines={}",
            base, self.height, self.width, self.mines
        )
    }

    pub fn cell_selector_for(&self, row: usize, col: usize) -> String {
        self.cell_selector
            .replace("{row}", &row.to_string())
            .replace("{col}", &col.to_string())
    }

    pub fn chrome_options(&self) -> ChromeOptions {
        ChromeOptions {
            headless: self.headless,
            window_size: (self.window_width, self.window_height),
            idle_timeout: Duration::from_secs(self.idle_timeout_secs),
        }
    }
}

/// Drives one game page. Every operation blocks until the page has reacted.
pub struct GameDriver<P: GamePage> {
    page: P,
    config: GameConfig,
    started: bool,
}

impl GameDriver<ChromePage> {
    /// Launch a Chrome instance for the configured game.
    pub fn launch(config: GameConfig) -> Result<Self, DriverError> {
        let page = ChromePage::launch(&config.chrome_options())?;
        Ok(GameDriver::new(page, config))
    }
}

impl<P: GamePage> GameDriver<P> {
    pub fn new(page: P, config: GameConfig) -> Self {
        GameDriver {
            page,
            config,
            started: false,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Load the game page and initialize it via the face indicator.
    pub fn start(&mut self) -> Result<(), DriverError> {
        let url = self.config.url();
        tracing::info!(%url, "starting game");
        self.page.goto(&url)?;
        self.page.click(&self.config.face_selector)?;
        self.page
            .pause(Duration::from_millis(self.config.start_wait_ms));
        self.started = true;
        Ok(())
    }

    /// Start a new game by clicking the face indicator again.
    pub fn restart(&mut self) -> Result<(), DriverError> {
        self.ensure_started()?;
        self.page.click(&self.config.face_selector)
    }

    /// Left-click a cell.
    pub fn reveal(&mut self, row: usize, col: usize) -> Result<(), DriverError> {
        self.ensure_started()?;
        let selector = self.config.cell_selector_for(row, col);
        tracing::debug!(row, col, "reveal");
        self.page.click(&selector)
    }

    /// Right-click a cell to toggle its flag.
    pub fn flag(&mut self, row: usize, col: usize) -> Result<(), DriverError> {
        self.ensure_started()?;
        let selector = self.config.cell_selector_for(row, col);
        tracing::debug!(row, col, "flag");
        self.page.right_click(&selector)
    }

    pub fn status(&mut self) -> Result<GameStatus, DriverError> {
        self.ensure_started()?;
        let class = self.page.class_of(&self.config.face_selector)?;
        Ok(GameStatus::from_indicator_class(&class))
    }

    pub fn read_board(&mut self) -> Result<Board, DriverError> {
        self.ensure_started()?;
        read_board(
            &mut self.page,
            self.config.height,
            self.config.width,
            self.config.class_scheme,
        )
    }

    pub fn close(&mut self) -> Result<(), DriverError> {
        self.started = false;
        self.page.close()
    }

    fn ensure_started(&self) -> Result<(), DriverError> {
        if self.started {
            Ok(())
        } else {
            Err(DriverError::NotStarted)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::{FakePage, FACE};
    use crate::game::cell::CLOSED;

    fn small_config() -> GameConfig {
        GameConfig {
            height: 3,
            width: 3,
            mines: 1,
            ..Default::default()
        }
    }

    fn started_driver(mines: &[(usize, usize)]) -> GameDriver<FakePage> {
        let mut driver = GameDriver::new(FakePage::new(3, 3, mines), small_config());
        driver.start().unwrap();
        driver
    }

    #[test]
    fn test_url_for_local_page() {
        let config = GameConfig {
            page: "/srv/game/winmine.html".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.url(),
            "file:///srv/game/winmine.html?height=8&width=8&mines=10"
        );
    }

    #[test]
    fn test_url_for_remote_page() {
        let config = GameConfig {
            page: "http://localhost:8000/index.html".to_string(),
            height: 16,
            width: 30,
            mines: 99,
            ..Default::default()
        };
        assert_eq!(
            config.url(),
            "http://localhost:8000/index.html?height=16&width=30&mines=99"
        );
    }

    #[test]
    fn test_cell_selector_for() {
        assert_eq!(GameConfig::default().cell_selector_for(2, 7), "#cell_2_7");
    }

    #[test]
    fn test_start_clicks_face() {
        let driver = started_driver(&[(2, 2)]);
        assert!(driver.is_started());
        assert_eq!(driver.page().clicks, vec![FACE.to_string()]);
        assert!(driver.page().url.as_deref().unwrap().ends_with("?height=3&width=3&mines=1"));
    }

    #[test]
    fn test_operations_require_start() {
        let mut driver = GameDriver::new(FakePage::new(3, 3, &[]), small_config());
        assert!(matches!(driver.reveal(0, 0), Err(DriverError::NotStarted)));
        assert!(matches!(driver.status(), Err(DriverError::NotStarted)));
    }

    #[test]
    fn test_reveal_mine_loses_and_restart_recovers() {
        let mut driver = started_driver(&[(1, 1)]);
        driver.reveal(1, 1).unwrap();
        assert_eq!(driver.status().unwrap(), GameStatus::Lose);

        driver.restart().unwrap();
        assert_eq!(driver.status().unwrap(), GameStatus::InProgress);
        assert_eq!(driver.read_board().unwrap().count(CLOSED), 9);
    }

    #[test]
    fn test_reveal_all_safe_cells_wins() {
        let mut driver = started_driver(&[(0, 0)]);
        // A corner mine leaves the opposite corner as a zero that floods the rest.
        driver.reveal(2, 2).unwrap();
        assert_eq!(driver.status().unwrap(), GameStatus::Win);
    }

    #[test]
    fn test_flag_marks_cell() {
        let mut driver = started_driver(&[(0, 0)]);
        driver.flag(0, 0).unwrap();
        let board = driver.read_board().unwrap();
        assert_eq!(board.get(0, 0), crate::game::cell::FLAGGED);
    }

    #[test]
    fn test_close_releases_page() {
        let mut driver = started_driver(&[]);
        driver.close().unwrap();
        assert!(driver.page().closed);
        assert!(!driver.is_started());
    }
}
