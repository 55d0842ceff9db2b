/// Closed (unrevealed) cell.
pub const CLOSED: i32 = 99;
/// Flagged, still closed.
pub const FLAGGED: i32 = -1;
/// Revealed mine.
pub const MINE: i32 = -99;
/// Class string not in the lookup table, or cell missing from the DOM.
pub const UNKNOWN: i32 = -77;
/// Flag placed on a cell without a mine, shown after a loss.
pub const MISFLAGGED: i32 = -999;

/// CSS class vocabulary used by the rendered page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassScheme {
    /// `clear cN` classes; a closed cell carries no class at all.
    #[default]
    Clear,
    /// `cell size24 hd_*` classes.
    Hd,
}

const CLEAR_TABLE: &[(&str, i32)] = &[
    ("", CLOSED),
    ("flag", FLAGGED),
    ("clear mine", UNKNOWN),
    ("clear triggered-mine mine", UNKNOWN),
    ("clear", 0),
    ("clear c1", 1),
    ("clear c2", 2),
    ("clear c3", 3),
    ("clear c4", 4),
    ("clear c5", 5),
    ("clear c6", 6),
    ("clear c7", 7),
    ("clear c8", 8),
];

const HD_TABLE: &[(&str, i32)] = &[
    ("cell size24 hd_closed", CLOSED),
    ("cell size24 hd_closed hd_flag", FLAGGED),
    ("cell size24 hd_opened hd_type11", MINE),
    ("cell size24 hd_opened hd_type12", MISFLAGGED),
    ("cell size24 hd_opened hd_type0", 0),
    ("cell size24 hd_opened hd_type1", 1),
    ("cell size24 hd_opened hd_type2", 2),
    ("cell size24 hd_opened hd_type3", 3),
    ("cell size24 hd_opened hd_type4", 4),
    ("cell size24 hd_opened hd_type5", 5),
    ("cell size24 hd_opened hd_type6", 6),
    ("cell size24 hd_opened hd_type71", 7),
    ("cell size24 hd_opened hd_type8", 8),
];

impl ClassScheme {
    fn table(self) -> &'static [(&'static str, i32)] {
        match self {
            ClassScheme::Clear => CLEAR_TABLE,
            ClassScheme::Hd => HD_TABLE,
        }
    }
}

/// Translate a cell's exact `className` into its integer code.
///
/// This is the only place that knows the page's class vocabulary. Anything
/// not in the table reads as [`UNKNOWN`].
pub fn translate_cell_class(scheme: ClassScheme, class: &str) -> i32 {
    scheme
        .table()
        .iter()
        .find(|(name, _)| *name == class)
        .map(|&(_, code)| code)
        .unwrap_or(UNKNOWN)
}

/// True for a revealed number 0..=8.
pub fn is_number(code: i32) -> bool {
    (0..=8).contains(&code)
}
