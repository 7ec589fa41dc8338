//! Layout and input errors, with error codes and helpful messages.
//!
//! # Error Codes
//!
//! Each variant has a unique code (L001-L008) for documentation lookup:
//!
//! - L001: `EmptyGrid` (Grid has no rows or no columns)
//! - L002: `RaggedRows` (Rows have inconsistent widths)
//! - L003: `InvalidCell` (Cell character outside `#`, `*`, `A`-`Z`)
//! - L004: `IsolatedCell` (White cell in no run of length ≥ 2)
//! - L005: `UnknownClue` (Clue data names a run the grid does not contain)
//! - L006: `DuplicateClue` (Two clue entries share a (number, direction) key)
//! - L007: `GeometryMismatch` (Supplied start/length disagrees with the grid)
//! - L008: `SolutionMismatch` (Known solution does not fit the layout)
//!
//! All of these are raised only at `initialize`; a failed initialization
//! never leaves a partially-built session live. Letter conflicts during
//! solving are *not* errors in this taxonomy; they are ordinary
//! [`Conflict`](crate::grid::Conflict) values that drive backtracking.

use std::io;

use crate::clue::Direction;
use crate::grid::Pos;

/// A malformed puzzle description, detected while building a session.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("grid is empty")]
    EmptyGrid,

    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRows { row: usize, expected: usize, found: usize },

    #[error("invalid cell character '{ch}' at {pos}")]
    InvalidCell { pos: Pos, ch: char },

    #[error("white cell at {pos} belongs to no across or down run of length >= 2")]
    IsolatedCell { pos: Pos },

    #[error("clue data given for {number} {direction}, but the grid derives no such clue")]
    UnknownClue { number: u32, direction: Direction },

    #[error("duplicate clue data for {number} {direction}")]
    DuplicateClue { number: u32, direction: Direction },

    #[error("{number} {direction}: supplied {field} {supplied} disagrees with derived {derived}")]
    GeometryMismatch {
        number: u32,
        direction: Direction,
        field: &'static str,
        supplied: String,
        derived: String,
    },

    #[error("known solution does not fit the grid: {reason}")]
    SolutionMismatch { reason: String },
}

impl LayoutError {
    /// Returns the error code for this error variant
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            LayoutError::EmptyGrid => "L001",
            LayoutError::RaggedRows { .. } => "L002",
            LayoutError::InvalidCell { .. } => "L003",
            LayoutError::IsolatedCell { .. } => "L004",
            LayoutError::UnknownClue { .. } => "L005",
            LayoutError::DuplicateClue { .. } => "L006",
            LayoutError::GeometryMismatch { .. } => "L007",
            LayoutError::SolutionMismatch { .. } => "L008",
        }
    }

    /// Returns a helpful suggestion or example for this error
    #[must_use]
    pub fn help(&self) -> Option<&'static str> {
        match self {
            LayoutError::EmptyGrid => Some("Provide at least one row, e.g. [\"#****\", \"*****\"]"),
            LayoutError::RaggedRows { .. } => Some("Every row string must have the same number of characters"),
            LayoutError::InvalidCell { .. } => Some("Use '#' for black squares, '*' for empty cells, or A-Z for pre-filled letters"),
            LayoutError::IsolatedCell { .. } => Some("Every white cell must sit in a horizontal or vertical run of at least two white cells"),
            LayoutError::UnknownClue { .. } => Some("Clue numbers follow standard crossword numbering derived from the grid; check the pattern rows"),
            LayoutError::DuplicateClue { .. } => Some("Supply at most one clue entry per (number, direction) pair"),
            LayoutError::GeometryMismatch { .. } => Some("start and length are optional; when present they must match the geometry derived from the grid"),
            LayoutError::SolutionMismatch { .. } => Some("The solution must have the grid's dimensions, '#' exactly on the black squares, and A-Z elsewhere"),
        }
    }

    /// Formats the error with code and optional help text
    #[must_use]
    pub fn display_detailed(&self) -> String {
        format_error_with_code_and_help(&self.to_string(), self.code(), self.help())
    }
}

impl From<LayoutError> for io::Error {
    fn from(le: LayoutError) -> Self {
        // String version is the least fragile (no Send/Sync bounds issues)
        io::Error::new(io::ErrorKind::InvalidInput, le.to_string())
    }
}

/// Helper function to format error messages with code and optional help text
pub(crate) fn format_error_with_code_and_help(base_msg: &str, code: &str, help: Option<&str>) -> String {
    if let Some(help_text) = help {
        format!("{base_msg} ({code})\n{help_text}")
    } else {
        format!("{base_msg} ({code})")
    }
}
