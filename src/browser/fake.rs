//! In-memory page that renders a small Minesweeper game with the `clear`
//! class vocabulary, for tests that must not start a browser.

use std::collections::HashSet;
use std::time::Duration;

use super::{CellElement, GamePage};
use crate::error::DriverError;

pub const FACE: &str = ".smiley-container";

pub struct FakePage {
    pub height: usize,
    pub width: usize,
    mines: HashSet<(usize, usize)>,
    revealed: HashSet<(usize, usize)>,
    flagged: HashSet<(usize, usize)>,
    lost: bool,
    pub url: Option<String>,
    pub clicks: Vec<String>,
    pub closed: bool,
    /// Cell ids to leave out of `cell_elements`, simulating a partial DOM.
    pub hidden_ids: HashSet<String>,
    /// Extra raw elements appended to `cell_elements`.
    pub extra_elements: Vec<CellElement>,
}

impl FakePage {
    pub fn new(height: usize, width: usize, mines: &[(usize, usize)]) -> Self {
        FakePage {
            height,
            width,
            mines: mines.iter().copied().collect(),
            revealed: HashSet::new(),
            flagged: HashSet::new(),
            lost: false,
            url: None,
            clicks: Vec::new(),
            closed: false,
            hidden_ids: HashSet::new(),
            extra_elements: Vec::new(),
        }
    }

    pub fn cell_clicks(&self) -> usize {
        self.clicks.iter().filter(|c| c.starts_with("#cell_")).count()
    }

    fn won(&self) -> bool {
        !self.lost && self.revealed.len() + self.mines.len() == self.height * self.width
    }

    fn adjacent_mines(&self, row: usize, col: usize) -> usize {
        self.neighbours(row, col)
            .filter(|p| self.mines.contains(p))
            .count()
    }

    fn neighbours(&self, row: usize, col: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        let (h, w) = (self.height as i64, self.width as i64);
        (-1i64..=1)
            .flat_map(move |dr| (-1i64..=1).map(move |dc| (dr, dc)))
            .filter(|&(dr, dc)| dr != 0 || dc != 0)
            .map(move |(dr, dc)| (row as i64 + dr, col as i64 + dc))
            .filter(move |&(r, c)| r >= 0 && c >= 0 && r < h && c < w)
            .map(|(r, c)| (r as usize, c as usize))
    }

    fn reveal(&mut self, row: usize, col: usize) {
        if self.lost || self.won() || self.flagged.contains(&(row, col)) {
            return;
        }
        if self.mines.contains(&(row, col)) {
            self.lost = true;
            self.revealed.insert((row, col));
            return;
        }
        let mut stack = vec![(row, col)];
        while let Some(p) = stack.pop() {
            if !self.revealed.insert(p) {
                continue;
            }
            if self.adjacent_mines(p.0, p.1) == 0 {
                let next: Vec<_> = self
                    .neighbours(p.0, p.1)
                    .filter(|q| !self.revealed.contains(q) && !self.mines.contains(q))
                    .collect();
                stack.extend(next);
            }
        }
    }

    fn class_for(&self, row: usize, col: usize) -> String {
        let p = (row, col);
        if self.revealed.contains(&p) {
            if self.mines.contains(&p) {
                "clear triggered-mine mine".to_string()
            } else {
                match self.adjacent_mines(row, col) {
                    0 => "clear".to_string(),
                    n => format!("clear c{n}"),
                }
            }
        } else if self.lost && self.mines.contains(&p) {
            "clear mine".to_string()
        } else if self.flagged.contains(&p) {
            "flag".to_string()
        } else {
            String::new()
        }
    }

    fn parse_cell_selector(selector: &str) -> Option<(usize, usize)> {
        let rest = selector.strip_prefix("#cell_")?;
        let (r, c) = rest.split_once('_')?;
        Some((r.parse().ok()?, c.parse().ok()?))
    }
}

impl GamePage for FakePage {
    fn goto(&mut self, url: &str) -> Result<(), DriverError> {
        self.url = Some(url.to_string());
        Ok(())
    }

    fn click(&mut self, selector: &str) -> Result<(), DriverError> {
        if self.url.is_none() {
            return Err(DriverError::NotStarted);
        }
        self.clicks.push(selector.to_string());
        if selector == FACE {
            self.revealed.clear();
            self.flagged.clear();
            self.lost = false;
            return Ok(());
        }
        let (row, col) = Self::parse_cell_selector(selector)
            .filter(|&(r, c)| r < self.height && c < self.width)
            .ok_or_else(|| DriverError::ElementNotFound(selector.to_string()))?;
        self.reveal(row, col);
        Ok(())
    }

    fn right_click(&mut self, selector: &str) -> Result<(), DriverError> {
        self.clicks.push(format!("right:{selector}"));
        let p = Self::parse_cell_selector(selector)
            .ok_or_else(|| DriverError::ElementNotFound(selector.to_string()))?;
        if !self.revealed.contains(&p) && !self.flagged.remove(&p) {
            self.flagged.insert(p);
        }
        Ok(())
    }

    fn class_of(&mut self, selector: &str) -> Result<String, DriverError> {
        if selector != FACE {
            return Err(DriverError::ElementNotFound(selector.to_string()));
        }
        let class = if self.lost {
            "smiley-container game-over"
        } else if self.won() {
            "smiley-container win"
        } else {
            "smiley-container"
        };
        Ok(class.to_string())
    }

    fn cell_elements(&mut self) -> Result<Vec<CellElement>, DriverError> {
        let mut out = Vec::with_capacity(self.height * self.width);
        for row in 0..self.height {
            for col in 0..self.width {
                let id = format!("cell_{row}_{col}");
                if self.hidden_ids.contains(&id) {
                    continue;
                }
                out.push(CellElement {
                    id,
                    class: self.class_for(row, col),
                });
            }
        }
        out.extend(self.extra_elements.iter().cloned());
        Ok(out)
    }

    fn pause(&mut self, _duration: Duration) {}

    fn close(&mut self) -> Result<(), DriverError> {
        self.closed = true;
        Ok(())
    }
}
