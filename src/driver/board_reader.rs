use crate::browser::{CellElement, GamePage};
use crate::error::DriverError;
use crate::game::cell::UNKNOWN;
use crate::game::{translate_cell_class, Board, ClassScheme};

/// Parse `cell_<row>_<col>` into a grid position.
fn parse_cell_id(id: &str) -> Option<(usize, usize)> {
    let mut parts = id.split('_');
    if parts.next()? != "cell" {
        return None;
    }
    let row = parts.next()?.parse().ok()?;
    let col = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((row, col))
}

/// Build an H×W board from reported cell elements.
///
/// Cells the page did not report stay [`UNKNOWN`]; ids that don't parse or
/// fall outside the grid are skipped.
pub fn board_from_elements(
    elements: &[CellElement],
    height: usize,
    width: usize,
    scheme: ClassScheme,
) -> Board {
    let mut board = Board::filled(height, width, UNKNOWN);
    for element in elements {
        match parse_cell_id(&element.id) {
            Some((row, col)) if board.contains(row, col) => {
                board.set(row, col, translate_cell_class(scheme, &element.class));
            }
            _ => tracing::debug!(id = %element.id, "ignoring cell element"),
        }
    }
    board
}

/// Query the live page and return its grid.
pub fn read_board<P: GamePage + ?Sized>(
    page: &mut P,
    height: usize,
    width: usize,
    scheme: ClassScheme,
) -> Result<Board, DriverError> {
    let elements = page.cell_elements()?;
    Ok(board_from_elements(&elements, height, width, scheme))
}
