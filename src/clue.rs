//! The clue store: clues derived from the grid layout, with candidate lists.
//!
//! Clues are never supplied with geometry by the caller: every maximal white
//! run of length ≥ 2 (horizontal = across, vertical = down) becomes a clue,
//! and numbering follows the standard crossword scheme: scan cells in reading
//! order, number a cell when it starts an across or down run, and reuse the
//! same number when a cell starts both. The caller only attaches clue text
//! and candidates afterwards, keyed by (number, direction).

use std::collections::HashMap;
use std::fmt;
use std::fmt::{Display, Formatter};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::grid::{Grid, Pos};

/// Confidence used for candidates that arrive without one. Zero, i.e. lowest
/// priority: an unscored candidate is tried only after every scored one.
pub const DEFAULT_CONFIDENCE: f64 = 0.0;

/// Clue direction. Serialized as `"A"`/`"D"` on the wire; `Across` orders
/// before `Down` so tie-breaking on keys is well defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "A")]
    Across,
    #[serde(rename = "D")]
    Down,
}

impl Direction {
    /// Row/col deltas when walking a clue's span.
    #[must_use]
    pub fn deltas(self) -> (usize, usize) {
        match self {
            Direction::Across => (0, 1),
            Direction::Down => (1, 0),
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Across => write!(f, "Across"),
            Direction::Down => write!(f, "Down"),
        }
    }
}

/// Identity of a clue. Numbers are shared across directions (a cell starting
/// both runs yields `1 Across` and `1 Down`), so the pair is the unique key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClueKey {
    pub number: u32,
    pub direction: Direction,
}

impl Display for ClueKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.number, self.direction)
    }
}

/// One proposed answer with its confidence score (higher = more likely).
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub word: String,
    pub confidence: f64,
}

/// A single across or down clue.
///
/// Invariant: `assigned`, when present, has exactly `length` letters and its
/// span contains no black cells (guaranteed by construction; spans are
/// derived as maximal white runs).
#[derive(Debug, Clone)]
pub struct Clue {
    pub number: u32,
    pub direction: Direction,
    pub start: Pos,
    pub length: usize,
    pub text: String,
    /// Ordered best-first (descending confidence, input order on ties).
    pub candidates: Vec<Candidate>,
    pub assigned: Option<String>,
    pub assigned_confidence: Option<f64>,
}

impl Clue {
    #[must_use]
    pub fn key(&self) -> ClueKey {
        ClueKey { number: self.number, direction: self.direction }
    }

    /// The cell positions this clue spans, in word order.
    #[must_use]
    pub fn span(&self) -> Vec<Pos> {
        let (dr, dc) = self.direction.deltas();
        (0..self.length)
            .map(|i| Pos::new(self.start.row + i * dr, self.start.col + i * dc))
            .collect()
    }
}

/// All clues for one puzzle, derived once at initialization.
#[derive(Debug, Clone)]
pub struct ClueStore {
    clues: Vec<Clue>,
    index: HashMap<ClueKey, usize>,
}

impl ClueStore {
    /// Derive clues from the grid layout and stamp each covered cell with its
    /// across/down clue number.
    ///
    /// Scans white cells in row-major order; a cell starts an across clue
    /// when it has no white neighbor to its left and a white neighbor to its
    /// right, and a down clue symmetrically. A single incrementing counter,
    /// shared across directions, assigns numbers in scan order.
    #[must_use]
    pub fn derive(grid: &mut Grid) -> Self {
        let mut clues = Vec::new();
        let mut next_number = 0u32;

        for row in 0..grid.rows() {
            for col in 0..grid.cols() {
                let pos = Pos::new(row, col);
                if grid.is_black(pos) {
                    continue;
                }

                let starts_across = (col == 0 || grid.is_black(Pos::new(row, col - 1)))
                    && col + 1 < grid.cols()
                    && !grid.is_black(Pos::new(row, col + 1));
                let starts_down = (row == 0 || grid.is_black(Pos::new(row - 1, col)))
                    && row + 1 < grid.rows()
                    && !grid.is_black(Pos::new(row + 1, col));

                if !starts_across && !starts_down {
                    continue;
                }
                next_number += 1;

                if starts_across {
                    let length = run_length(grid, pos, Direction::Across);
                    clues.push(blank_clue(next_number, Direction::Across, pos, length));
                }
                if starts_down {
                    let length = run_length(grid, pos, Direction::Down);
                    clues.push(blank_clue(next_number, Direction::Down, pos, length));
                }
            }
        }

        for clue in &clues {
            for pos in clue.span() {
                match clue.direction {
                    Direction::Across => grid.set_clue_ids(pos, Some(clue.number), None),
                    Direction::Down => grid.set_clue_ids(pos, None, Some(clue.number)),
                }
            }
        }

        let index = clues
            .iter()
            .enumerate()
            .map(|(i, c)| (c.key(), i))
            .collect();
        Self { clues, index }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clues.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clues.is_empty()
    }

    #[must_use]
    pub fn contains(&self, key: ClueKey) -> bool {
        self.index.contains_key(&key)
    }

    #[must_use]
    pub fn get(&self, key: ClueKey) -> Option<&Clue> {
        self.index.get(&key).map(|&i| &self.clues[i])
    }

    pub fn get_mut(&mut self, key: ClueKey) -> Option<&mut Clue> {
        self.index.get(&key).map(|&i| &mut self.clues[i])
    }

    /// Clues in derivation order (by number, across before down per number).
    pub fn iter(&self) -> impl Iterator<Item = &Clue> {
        self.clues.iter()
    }

    /// All clue keys in derivation order.
    #[must_use]
    pub fn keys(&self) -> Vec<ClueKey> {
        self.clues.iter().map(Clue::key).collect()
    }

    /// Attach clue text and a candidate list to a derived clue. Candidates
    /// are normalized to uppercase, filtered (length and A-Z only, skipped
    /// with a warning otherwise), and sorted best-first. The sort is stable,
    /// so equal confidences keep their input order and selection stays
    /// deterministic for identical input.
    pub fn attach(&mut self, key: ClueKey, text: String, raw: Vec<(String, f64)>) {
        let Some(clue) = self.get_mut(key) else {
            debug_assert!(false, "attach called for unknown clue {key}");
            return;
        };
        clue.text = text;

        let length = clue.length;
        let mut candidates: Vec<Candidate> = raw
            .into_iter()
            .filter_map(|(word, confidence)| {
                let word = word.trim().to_ascii_uppercase();
                if word.chars().count() != length {
                    warn!("skipping candidate '{word}' for {key}: expected {length} letters");
                    return None;
                }
                if !word.chars().all(|ch| ch.is_ascii_uppercase()) {
                    warn!("skipping candidate '{word}' for {key}: letters must be A-Z");
                    return None;
                }
                Some(Candidate { word, confidence })
            })
            .collect();
        candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        clue.candidates = candidates;
    }

    /// The visible cell-numbering map for the view layer: a cell carries a
    /// number iff it starts a clue. Derived on demand, never stored.
    #[must_use]
    pub fn numbering(&self) -> HashMap<Pos, u32> {
        let mut map = HashMap::new();
        for clue in &self.clues {
            map.entry(clue.start).or_insert(clue.number);
        }
        map
    }

    /// Current letter pattern for a clue (`*` for unknown cells).
    #[must_use]
    pub fn pattern(&self, grid: &Grid, key: ClueKey) -> Option<String> {
        self.get(key).map(|clue| grid.pattern(&clue.span()))
    }
}

fn blank_clue(number: u32, direction: Direction, start: Pos, length: usize) -> Clue {
    Clue {
        number,
        direction,
        start,
        length,
        text: String::new(),
        candidates: Vec::new(),
        assigned: None,
        assigned_confidence: None,
    }
}

fn run_length(grid: &Grid, start: Pos, direction: Direction) -> usize {
    let (dr, dc) = direction.deltas();
    let mut len = 0;
    let (mut row, mut col) = (start.row, start.col);
    while row < grid.rows() && col < grid.cols() && !grid.is_black(Pos::new(row, col)) {
        len += 1;
        row += dr;
        col += dc;
    }
    len
}
