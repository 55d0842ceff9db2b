use std::fmt;

use super::cell::{CLOSED, FLAGGED, MINE, UNKNOWN};

/// Snapshot of the rendered grid, one integer code per cell.
///
/// Row-major; `get(row, col)` matches the page's `cell_<row>_<col>` ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    height: usize,
    width: usize,
    cells: Vec<i32>,
}

impl Board {
    /// A board of the given size with every cell set to `code`.
    pub fn filled(height: usize, width: usize, code: i32) -> Self {
        Board {
            height,
            width,
            cells: vec![code; height * width],
        }
    }

    /// A fresh, fully closed board.
    pub fn closed(height: usize, width: usize) -> Self {
        Self::filled(height, width, CLOSED)
    }

    /// Build from nested rows. Returns `None` if the rows are ragged or empty.
    pub fn from_rows(rows: &[Vec<i32>]) -> Option<Self> {
        let height = rows.len();
        let width = rows.first()?.len();
        if width == 0 || rows.iter().any(|r| r.len() != width) {
            return None;
        }
        Some(Board {
            height,
            width,
            cells: rows.iter().flatten().copied().collect(),
        })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.height && col < self.width
    }

    /// Get the code at a position. Panics if out of bounds.
    pub fn get(&self, row: usize, col: usize) -> i32 {
        self.cells[self.index(row, col)]
    }

    pub fn set(&mut self, row: usize, col: usize, code: i32) {
        let idx = self.index(row, col);
        self.cells[idx] = code;
    }

    pub fn is_closed(&self, row: usize, col: usize) -> bool {
        self.get(row, col) == CLOSED
    }

    /// Flat index of a position, as used by the agents' action heads.
    pub fn index(&self, row: usize, col: usize) -> usize {
        assert!(
            self.contains(row, col),
            "({row}, {col}) outside {}x{} board",
            self.height,
            self.width
        );
        row * self.width + col
    }

    /// Inverse of [`Board::index`].
    pub fn position(&self, index: usize) -> (usize, usize) {
        (index / self.width, index % self.width)
    }

    /// Flat indices of every closed cell.
    pub fn closed_cells(&self) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &c)| c == CLOSED)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn count(&self, code: i32) -> usize {
        self.cells.iter().filter(|&&c| c == code).count()
    }

    /// Raw codes, row-major.
    pub fn cells(&self) -> &[i32] {
        &self.cells
    }

    pub fn rows(&self) -> impl Iterator<Item = &[i32]> {
        self.cells.chunks(self.width)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            let line: String = row
                .iter()
                .map(|&c| match c {
                    CLOSED => '#',
                    FLAGGED => 'F',
                    MINE => '*',
                    0 => '.',
                    1..=8 => char::from(b'0' + c as u8),
                    UNKNOWN => '?',
                    _ => '!',
                })
                .collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
