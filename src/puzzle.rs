//! The puzzle description: grid rows, clue data, candidates.
//!
//! This module owns the boundary between raw puzzle payloads and the solver's
//! validated state. A puzzle arrives as JSON (from a file in the CLI, from
//! JavaScript in the browser build):
//!
//! ```json
//! {
//!   "rows": ["#****", "#****", "*****", "****#", "****#"],
//!   "clues": [
//!     { "number": 1, "direction": "A", "text": "One of a matched pair",
//!       "candidates": [["SOCK", 70], ["TWIN", 60]] }
//!   ],
//!   "solution": ["#TWIN", "#OHMY", "GRAPE", "ISLE#", "NOEL#"]
//! }
//! ```
//!
//! Rows use `#` for black squares, `*` for empty cells, and `A`-`Z` for
//! pre-filled letters. Candidates accept either `["WORD", confidence]` pairs
//! or bare `"WORD"` strings (older payloads carried no confidence); a missing
//! confidence becomes [`DEFAULT_CONFIDENCE`], i.e. lowest priority.
//!
//! Clue geometry is never taken from the payload (clues are derived from the
//! grid), but when a clue entry carries `start`/`length` anyway, they are
//! checked against the derived geometry so stale payloads fail loudly at
//! `initialize` rather than misfilling the grid later.

use serde::Deserialize;

use crate::clue::{ClueKey, ClueStore, Direction, DEFAULT_CONFIDENCE};
use crate::errors::LayoutError;
use crate::grid::{Grid, Pos};

/// Raw puzzle description as deserialized from JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct PuzzleSpec {
    /// Grid rows: `#` black, `*` empty, `A`-`Z` pre-filled.
    pub rows: Vec<String>,
    /// Clue text and candidates, keyed by (number, direction).
    #[serde(default)]
    pub clues: Vec<ClueSpec>,
    /// Optional known-correct solution in the same row notation.
    #[serde(default)]
    pub solution: Option<Vec<String>>,
}

/// One clue's payload entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ClueSpec {
    pub number: u32,
    pub direction: Direction,
    #[serde(default)]
    pub text: String,
    /// Optional; validated against the derived geometry when present.
    #[serde(default)]
    pub start: Option<[usize; 2]>,
    #[serde(default)]
    pub length: Option<usize>,
    #[serde(default)]
    pub candidates: Vec<CandidateSpec>,
}

/// The two candidate shapes observed in the wild: scored pairs and bare
/// words from payloads predating the confidence field.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CandidateSpec {
    Scored(String, f64),
    Bare(String),
}

impl CandidateSpec {
    fn into_pair(self) -> (String, f64) {
        match self {
            CandidateSpec::Scored(word, confidence) => (word, confidence),
            CandidateSpec::Bare(word) => (word, DEFAULT_CONFIDENCE),
        }
    }
}

impl PuzzleSpec {
    /// Parse a puzzle description from a JSON string. WASM-safe: no
    /// filesystem access.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error for malformed JSON.
    pub fn parse_from_str(contents: &str) -> Result<PuzzleSpec, serde_json::Error> {
        serde_json::from_str(contents)
    }

    /// Native-only convenience: read a puzzle JSON file and parse it.
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` if the file cannot be read, or an
    /// `InvalidData` error wrapping the parse failure.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> std::io::Result<PuzzleSpec> {
        let path_ref = path.as_ref();
        let data = std::fs::read_to_string(path_ref).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!("failed to read puzzle from '{}': {}", path_ref.display(), e),
            )
        })?;
        Self::parse_from_str(&data)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Validate the description and build the solver's state from it:
    /// the grid, the derived clue store with candidates attached, and the
    /// normalized known solution if one was supplied.
    ///
    /// # Errors
    ///
    /// Returns a [`LayoutError`] for any malformed input; nothing partially
    /// built escapes on failure.
    pub fn build(self) -> Result<(Grid, ClueStore, Option<Vec<String>>), LayoutError> {
        let layout = parse_rows(&self.rows)?;
        let mut grid = Grid::from_layout(&layout.blacks);
        for (pos, letter) in &layout.prefilled {
            grid.preset_letter(*pos, *letter);
        }

        let mut store = ClueStore::derive(&mut grid);

        // Every white cell must be covered by at least one derived clue;
        // an uncovered cell would mean a run of length 1.
        for cell in grid.iter() {
            if !cell.is_black && cell.across_id.is_none() && cell.down_id.is_none() {
                return Err(LayoutError::IsolatedCell { pos: cell.pos });
            }
        }

        let mut seen = std::collections::HashSet::new();
        for clue_spec in self.clues {
            let key = ClueKey { number: clue_spec.number, direction: clue_spec.direction };
            let Some(derived) = store.get(key) else {
                return Err(LayoutError::UnknownClue {
                    number: key.number,
                    direction: key.direction,
                });
            };
            if !seen.insert(key) {
                return Err(LayoutError::DuplicateClue {
                    number: key.number,
                    direction: key.direction,
                });
            }
            if let Some([row, col]) = clue_spec.start {
                let supplied = Pos::new(row, col);
                if supplied != derived.start {
                    return Err(LayoutError::GeometryMismatch {
                        number: key.number,
                        direction: key.direction,
                        field: "start",
                        supplied: supplied.to_string(),
                        derived: derived.start.to_string(),
                    });
                }
            }
            if let Some(length) = clue_spec.length {
                if length != derived.length {
                    return Err(LayoutError::GeometryMismatch {
                        number: key.number,
                        direction: key.direction,
                        field: "length",
                        supplied: length.to_string(),
                        derived: derived.length.to_string(),
                    });
                }
            }

            let raw = clue_spec.candidates.into_iter().map(CandidateSpec::into_pair).collect();
            store.attach(key, clue_spec.text, raw);
        }

        let solution = match self.solution {
            None => None,
            Some(rows) => Some(validate_solution(&grid, &rows)?),
        };

        Ok((grid, store, solution))
    }
}

struct ParsedRows {
    blacks: Vec<Vec<bool>>,
    prefilled: Vec<(Pos, char)>,
}

fn parse_rows(rows: &[String]) -> Result<ParsedRows, LayoutError> {
    if rows.is_empty() || rows[0].chars().count() == 0 {
        return Err(LayoutError::EmptyGrid);
    }
    let expected = rows[0].chars().count();

    let mut blacks = Vec::with_capacity(rows.len());
    let mut prefilled = Vec::new();
    for (r, row) in rows.iter().enumerate() {
        let found = row.chars().count();
        if found != expected {
            return Err(LayoutError::RaggedRows { row: r, expected, found });
        }
        let mut black_row = Vec::with_capacity(expected);
        for (c, ch) in row.chars().enumerate() {
            let pos = Pos::new(r, c);
            match ch {
                '#' => black_row.push(true),
                '*' => black_row.push(false),
                'A'..='Z' | 'a'..='z' => {
                    black_row.push(false);
                    prefilled.push((pos, ch.to_ascii_uppercase()));
                }
                _ => return Err(LayoutError::InvalidCell { pos, ch }),
            }
        }
        blacks.push(black_row);
    }
    Ok(ParsedRows { blacks, prefilled })
}

/// Check a known solution against the layout and return it normalized to
/// uppercase rows.
fn validate_solution(grid: &Grid, rows: &[String]) -> Result<Vec<String>, LayoutError> {
    if rows.len() != grid.rows() {
        return Err(LayoutError::SolutionMismatch {
            reason: format!("expected {} rows, got {}", grid.rows(), rows.len()),
        });
    }

    let mut normalized = Vec::with_capacity(rows.len());
    for (r, row) in rows.iter().enumerate() {
        let found = row.chars().count();
        if found != grid.cols() {
            return Err(LayoutError::SolutionMismatch {
                reason: format!("row {r} has {found} cells, expected {}", grid.cols()),
            });
        }
        let mut out = String::with_capacity(found);
        for (c, ch) in row.chars().enumerate() {
            let pos = Pos::new(r, c);
            let up = ch.to_ascii_uppercase();
            match (grid.is_black(pos), up) {
                (true, '#') => out.push('#'),
                (true, other) => {
                    return Err(LayoutError::SolutionMismatch {
                        reason: format!("expected '#' at {pos}, got '{other}'"),
                    });
                }
                (false, 'A'..='Z') => out.push(up),
                (false, other) => {
                    return Err(LayoutError::SolutionMismatch {
                        reason: format!("expected a letter at {pos}, got '{other}'"),
                    });
                }
            }
        }
        normalized.push(out);
    }
    Ok(normalized)
}
