//! The grid model: immutable black/white layout plus mutable per-cell letters.
//!
//! The two mutating operations are deliberately asymmetric:
//!
//! - [`Grid::place`] writes a word along a span **all-or-nothing** and returns
//!   the exact set of cells it wrote (cells that were empty beforehand).
//! - [`Grid::clear`] resets exactly those cells and nothing else, so letters
//!   contributed by a crossing word at shared intersections survive.
//!
//! That pairing is what makes backtracking undo exact: the solver never has to
//! reconstruct which letters belonged to which word.

use std::fmt;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// A (row, col) coordinate. Explicit record rather than a packed index or a
/// stringly key, so callers can't mix up row/col order silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub row: usize,
    pub col: usize,
}

impl Pos {
    #[must_use]
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl Display for Pos {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// One square of the grid. `letter` is `None` for an empty white cell and
/// always `None` for black cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub pos: Pos,
    pub is_black: bool,
    pub letter: Option<char>,
    /// Number of the across clue covering this cell, if any.
    pub across_id: Option<u32>,
    /// Number of the down clue covering this cell, if any.
    pub down_id: Option<u32>,
}

impl Cell {
    fn new(pos: Pos, is_black: bool) -> Self {
        Self { pos, is_black, letter: None, across_id: None, down_id: None }
    }

    /// Display character: `#` for black, the letter if present, `*` otherwise.
    #[must_use]
    pub fn display_char(&self) -> char {
        if self.is_black {
            '#'
        } else {
            self.letter.unwrap_or('*')
        }
    }
}

/// A letter disagreement at a crossing cell. Expected and recoverable: it is
/// what drives backtracking, never a hard failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("letter conflict at {pos}: existing '{existing}' vs proposed '{proposed}'")]
pub struct Conflict {
    pub pos: Pos,
    pub existing: char,
    pub proposed: char,
}

/// The set of cells a single [`Grid::place`] call actually wrote, in span
/// order. Passing it back to [`Grid::clear`] undoes exactly that placement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppliedCells(pub Vec<Pos>);

impl AppliedCells {
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Rectangular crossword grid. Cells are stored row-major in a flat `Vec`;
/// the layout (dimensions, black cells) is fixed after construction, only
/// letters change.
#[derive(Debug, Clone)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Build a grid from black/white flags, one `Vec<bool>` per row
    /// (`true` = black). Rows must already be validated as rectangular;
    /// the puzzle layer owns that check.
    #[must_use]
    pub fn from_layout(layout: &[Vec<bool>]) -> Self {
        let rows = layout.len();
        let cols = layout.first().map_or(0, Vec::len);
        debug_assert!(
            layout.iter().all(|r| r.len() == cols),
            "layout rows must all have the same width"
        );

        let mut cells = Vec::with_capacity(rows * cols);
        for (r, row) in layout.iter().enumerate() {
            for (c, &is_black) in row.iter().enumerate() {
                cells.push(Cell::new(Pos::new(r, c), is_black));
            }
        }
        Self { rows, cols, cells }
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    fn index(&self, pos: Pos) -> usize {
        debug_assert!(pos.row < self.rows && pos.col < self.cols, "position {pos} out of bounds");
        pos.row * self.cols + pos.col
    }

    #[must_use]
    pub fn cell(&self, pos: Pos) -> &Cell {
        &self.cells[self.index(pos)]
    }

    #[must_use]
    pub fn is_black(&self, pos: Pos) -> bool {
        self.cell(pos).is_black
    }

    #[must_use]
    pub fn letter(&self, pos: Pos) -> Option<char> {
        self.cell(pos).letter
    }

    /// Iterate all cells in row-major (reading) order.
    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Pre-fill a letter from the puzzle description. Initialization only;
    /// solving goes through [`Grid::place`].
    pub(crate) fn preset_letter(&mut self, pos: Pos, letter: char) {
        debug_assert!(!self.is_black(pos), "cannot preset a letter on a black cell");
        let i = self.index(pos);
        self.cells[i].letter = Some(letter);
    }

    /// Record which across/down clue number covers a cell. Called once by the
    /// clue store while deriving clues; not part of solving.
    pub(crate) fn set_clue_ids(&mut self, pos: Pos, across: Option<u32>, down: Option<u32>) {
        let i = self.index(pos);
        if across.is_some() {
            self.cells[i].across_id = across;
        }
        if down.is_some() {
            self.cells[i].down_id = down;
        }
    }

    /// Attempt to write `word` along `span`, one letter per cell.
    ///
    /// All-or-nothing: if any already-lettered cell disagrees with the
    /// proposed letter, nothing is written and the [`Conflict`] is returned.
    /// On success, returns the cells that were actually written; cells that
    /// already held the (agreeing) letter from a crossing word are *not*
    /// included, so a later [`Grid::clear`] cannot erase them.
    ///
    /// # Errors
    ///
    /// Returns [`Conflict`] naming the cell and the two disagreeing letters.
    pub fn place(&mut self, span: &[Pos], word: &str) -> Result<AppliedCells, Conflict> {
        debug_assert_eq!(
            span.len(),
            word.chars().count(),
            "span length must match word length"
        );
        debug_assert!(
            span.iter().all(|&p| !self.is_black(p)),
            "span must not cross a black cell"
        );

        // Validation pass first so a conflict leaves the grid untouched.
        for (&pos, proposed) in span.iter().zip(word.chars()) {
            if let Some(existing) = self.letter(pos) {
                if existing != proposed {
                    return Err(Conflict { pos, existing, proposed });
                }
            }
        }

        let mut applied = Vec::with_capacity(span.len());
        for (&pos, proposed) in span.iter().zip(word.chars()) {
            let i = self.index(pos);
            if self.cells[i].letter.is_none() {
                self.cells[i].letter = Some(proposed);
                applied.push(pos);
            }
        }
        Ok(AppliedCells(applied))
    }

    /// Reset exactly the cells a prior [`Grid::place`] wrote.
    pub fn clear(&mut self, applied: &AppliedCells) {
        for &pos in &applied.0 {
            let i = self.index(pos);
            debug_assert!(
                self.cells[i].letter.is_some(),
                "clearing a cell that holds no letter: {pos}"
            );
            self.cells[i].letter = None;
        }
    }

    /// Current letters along a span as a pattern string, `*` for unknowns.
    #[must_use]
    pub fn pattern(&self, span: &[Pos]) -> String {
        span.iter().map(|&p| self.letter(p).unwrap_or('*')).collect()
    }

    /// Render the grid as rows of display characters (`#`, letters, `*`).
    #[must_use]
    pub fn render_rows(&self) -> Vec<String> {
        (0..self.rows)
            .map(|r| {
                (0..self.cols)
                    .map(|c| self.cell(Pos::new(r, c)).display_char())
                    .collect()
            })
            .collect()
    }
}

impl Display for Grid {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (r, row) in self.render_rows().iter().enumerate() {
            if r > 0 {
                writeln!(f)?;
            }
            let spaced: Vec<String> = row.chars().map(String::from).collect();
            write!(f, "{}", spaced.join(" "))?;
        }
        Ok(())
    }
}
