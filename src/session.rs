//! The step API façade: one owned [`Session`] per puzzle, passed explicitly,
//! no ambient globals. `initialize` rebuilds everything from a
//! [`PuzzleSpec`]; `step` performs exactly one engine step; and
//! `run_to_completion` loops `step` internally until the engine settles into
//! `Complete` or `Exhausted`. Both driving styles must produce identical
//! final state for identical inputs, and they do: `run_to_completion` *is*
//! the polling loop.

use serde::Serialize;

use crate::clue::Direction;
use crate::engine::{Engine, SolverState, StepEvent};
use crate::errors::LayoutError;
use crate::puzzle::PuzzleSpec;

/// Cap applied by [`Session::run_to_completion`] when the caller does not
/// supply one. The engine itself has no notion of time or step budgets; this
/// guard exists so a driver cannot spin forever on a pathological puzzle.
pub const DEFAULT_MAX_STEPS: usize = 10_000;

/// Per-cell view state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellSnapshot {
    pub is_black: bool,
    pub letter: Option<char>,
    /// Across clue number covering this cell, if any.
    pub across_id: Option<u32>,
    /// Down clue number covering this cell, if any.
    pub down_id: Option<u32>,
    /// Visible number: present iff this cell starts a clue. Derived from
    /// clue data, recomputed on every snapshot.
    pub number: Option<u32>,
}

/// Per-clue view state for the initial across/down listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClueSnapshot {
    pub number: u32,
    pub direction: Direction,
    pub start: [usize; 2],
    pub length: usize,
    pub text: String,
    pub assigned: Option<String>,
}

/// What `initialize` hands back: the empty grid and the two clue lists.
#[derive(Debug, Clone, Serialize)]
pub struct InitSnapshot {
    pub grid: Vec<Vec<CellSnapshot>>,
    pub across_clues: Vec<ClueSnapshot>,
    pub down_clues: Vec<ClueSnapshot>,
}

/// One clue whose `assigned` value changed during a step. `assigned` is
/// `None` when the change was a backtrack un-assignment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignedClue {
    pub number: u32,
    pub direction: Direction,
    pub assigned: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Result of a single `step` call (and, with accumulated `assigned_clues`,
/// of `run_to_completion`).
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub grid: Vec<Vec<CellSnapshot>>,
    pub assigned_clues: Vec<AssignedClue>,
    pub progress: bool,
    pub message: String,
    /// `None` while solving is in progress; `Some` once the engine is
    /// terminal (`true` only on a completed, correct fill).
    pub solved: Option<bool>,
}

/// Calling `step` before `initialize` is a driver bug, reported as a typed
/// error rather than a panic.
#[derive(Debug, thiserror::Error)]
#[error("session not initialized: call initialize before stepping")]
pub struct NotInitialized;

/// A solving session: `Idle` until the first successful `initialize`, then
/// exclusively owned solver state. Concurrent `step` calls are unsupported
/// by construction: stepping requires `&mut self`.
#[derive(Debug, Default)]
pub struct Session {
    engine: Option<Engine>,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the grid, clue store, and solver state from scratch. Any
    /// previous puzzle state is dropped; on error the session keeps (or
    /// stays in) its previous state rather than going half-built.
    ///
    /// # Errors
    ///
    /// Returns a [`LayoutError`] when the puzzle description is malformed.
    pub fn initialize(&mut self, spec: PuzzleSpec) -> Result<InitSnapshot, LayoutError> {
        let (grid, clues, solution) = spec.build()?;
        let engine = Engine::new(grid, clues, solution);
        let snapshot = Self::init_snapshot(&engine);
        self.engine = Some(engine);
        Ok(snapshot)
    }

    /// Whether a puzzle is loaded.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.engine.is_some()
    }

    #[must_use]
    pub fn state(&self) -> Option<SolverState> {
        self.engine.as_ref().map(Engine::state)
    }

    /// Perform one solver step.
    ///
    /// # Errors
    ///
    /// Returns [`NotInitialized`] when no puzzle has been loaded.
    pub fn step(&mut self) -> Result<StepOutcome, NotInitialized> {
        let engine = self.engine.as_mut().ok_or(NotInitialized)?;
        let event = engine.step();
        Ok(Self::outcome(engine, &event))
    }

    /// Loop `step` until the engine is terminal (or `max_steps` is hit).
    /// The returned outcome is the terminal step's, with every per-step clue
    /// change accumulated in order into `assigned_clues`.
    ///
    /// # Errors
    ///
    /// Returns [`NotInitialized`] when no puzzle has been loaded.
    pub fn run_to_completion(
        &mut self,
        max_steps: Option<usize>,
    ) -> Result<StepOutcome, NotInitialized> {
        let engine = self.engine.as_mut().ok_or(NotInitialized)?;
        let cap = max_steps.unwrap_or(DEFAULT_MAX_STEPS);

        let mut accumulated = Vec::new();
        for _ in 0..cap {
            let event = engine.step();
            let mut outcome = Self::outcome(engine, &event);
            accumulated.extend(outcome.assigned_clues.clone());
            if engine.is_terminal() {
                outcome.assigned_clues = accumulated;
                return Ok(outcome);
            }
        }

        // Step budget exhausted; state stays consistent and resumable.
        let mut outcome = Self::snapshot_outcome(engine);
        outcome.assigned_clues = accumulated;
        outcome.progress = false;
        outcome.message = format!("Maximum steps ({cap}) reached. Puzzle not solved.");
        Ok(outcome)
    }

    fn init_snapshot(engine: &Engine) -> InitSnapshot {
        let mut across_clues = Vec::new();
        let mut down_clues = Vec::new();
        for clue in engine.clues().iter() {
            let snapshot = ClueSnapshot {
                number: clue.number,
                direction: clue.direction,
                start: [clue.start.row, clue.start.col],
                length: clue.length,
                text: clue.text.clone(),
                assigned: clue.assigned.clone(),
            };
            match clue.direction {
                Direction::Across => across_clues.push(snapshot),
                Direction::Down => down_clues.push(snapshot),
            }
        }
        InitSnapshot { grid: Self::grid_snapshot(engine), across_clues, down_clues }
    }

    fn grid_snapshot(engine: &Engine) -> Vec<Vec<CellSnapshot>> {
        let numbering = engine.clues().numbering();
        let grid = engine.grid();
        let mut rows = Vec::with_capacity(grid.rows());
        let mut current: Vec<CellSnapshot> = Vec::with_capacity(grid.cols());
        for cell in grid.iter() {
            if cell.pos.col == 0 && !current.is_empty() {
                rows.push(std::mem::take(&mut current));
            }
            current.push(CellSnapshot {
                is_black: cell.is_black,
                letter: cell.letter,
                across_id: cell.across_id,
                down_id: cell.down_id,
                number: numbering.get(&cell.pos).copied(),
            });
        }
        if !current.is_empty() {
            rows.push(current);
        }
        rows
    }

    fn snapshot_outcome(engine: &Engine) -> StepOutcome {
        StepOutcome {
            grid: Self::grid_snapshot(engine),
            assigned_clues: Vec::new(),
            progress: false,
            message: String::new(),
            solved: engine.solved(),
        }
    }

    fn outcome(engine: &Engine, event: &StepEvent) -> StepOutcome {
        let mut outcome = Self::snapshot_outcome(engine);
        outcome.progress = event.progress();
        match event {
            StepEvent::Assigned { key, word, confidence } => {
                outcome.message = format!("Assigned '{word}' to {key}");
                outcome.assigned_clues.push(AssignedClue {
                    number: key.number,
                    direction: key.direction,
                    assigned: Some(word.clone()),
                    confidence: Some(*confidence),
                });
            }
            StepEvent::Conflict { key, word, conflict } => {
                outcome.message = format!(
                    "Conflict: '{word}' for {key} clashes at {} ('{}' vs '{}')",
                    conflict.pos, conflict.existing, conflict.proposed
                );
            }
            StepEvent::Backtracked { key, word } => {
                outcome.message = format!("Backtracked: unassigned '{word}' from {key}");
                outcome.assigned_clues.push(AssignedClue {
                    number: key.number,
                    direction: key.direction,
                    assigned: None,
                    confidence: None,
                });
            }
            StepEvent::Complete { .. } => {
                outcome.message = "Puzzle complete".to_string();
            }
            StepEvent::Exhausted => {
                outcome.message = "No valid assignments could be made".to_string();
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::PuzzleSpec;

    fn cross_spec(across: &str, down: &str) -> PuzzleSpec {
        let json = format!(
            r###"{{
              "rows": ["##*##", "*****", "##*##"],
              "clues": [
                {{ "number": 2, "direction": "A", "text": "across", "candidates": {across} }},
                {{ "number": 1, "direction": "D", "text": "down", "candidates": {down} }}
              ]
            }}"###
        );
        PuzzleSpec::parse_from_str(&json).unwrap()
    }

    #[test]
    fn test_step_before_initialize_errors() {
        let mut session = Session::new();
        assert!(session.step().is_err());
        assert!(session.run_to_completion(None).is_err());
    }

    #[test]
    fn test_initialize_snapshot_shape() {
        let mut session = Session::new();
        let init = session
            .initialize(cross_spec(r#"[["CRANE", 0.9]]"#, r#"[["TAN", 0.8]]"#))
            .unwrap();

        assert_eq!(init.grid.len(), 3);
        assert_eq!(init.grid[0].len(), 5);
        assert_eq!(init.across_clues.len(), 1);
        assert_eq!(init.down_clues.len(), 1);
        assert_eq!(init.across_clues[0].number, 2);
        assert_eq!(init.across_clues[0].start, [1, 0]);
        assert_eq!(init.down_clues[0].length, 3);

        // Cell numbering: only clue starts carry numbers.
        assert_eq!(init.grid[0][2].number, Some(1));
        assert_eq!(init.grid[1][0].number, Some(2));
        assert_eq!(init.grid[1][2].number, None);
        // Ownership ids on a crossing cell.
        assert_eq!(init.grid[1][2].across_id, Some(2));
        assert_eq!(init.grid[1][2].down_id, Some(1));
    }

    #[test]
    fn test_step_reports_assignment() {
        let mut session = Session::new();
        session
            .initialize(cross_spec(r#"[["CRANE", 0.9]]"#, r#"[["TAN", 0.8]]"#))
            .unwrap();

        let outcome = session.step().unwrap();
        assert!(outcome.progress);
        assert_eq!(outcome.message, "Assigned 'CRANE' to 2 Across");
        assert_eq!(outcome.assigned_clues.len(), 1);
        assert_eq!(outcome.assigned_clues[0].assigned.as_deref(), Some("CRANE"));
        assert_eq!(outcome.solved, None);
        assert_eq!(outcome.grid[1][0].letter, Some('C'));
    }

    #[test]
    fn test_run_to_completion_accumulates_changes() {
        let mut session = Session::new();
        session
            .initialize(cross_spec(r#"[["CRANE", 0.9]]"#, r#"[["TAN", 0.8]]"#))
            .unwrap();

        let outcome = session.run_to_completion(None).unwrap();
        assert_eq!(outcome.solved, Some(true));
        assert_eq!(outcome.message, "Puzzle complete");
        let words: Vec<Option<&str>> = outcome
            .assigned_clues
            .iter()
            .map(|a| a.assigned.as_deref())
            .collect();
        assert_eq!(words, vec![Some("CRANE"), Some("TAN")]);
    }

    #[test]
    fn test_stepwise_and_run_to_completion_agree() {
        let across = r#"[["CRONE", 0.99], ["CRANE", 0.9]]"#;
        let down = r#"[["TAN", 0.95], ["MAN", 0.5]]"#;

        let mut stepped = Session::new();
        stepped.initialize(cross_spec(across, down)).unwrap();
        let mut last = None;
        for _ in 0..100 {
            let outcome = stepped.step().unwrap();
            let done = outcome.solved.is_some();
            last = Some(outcome);
            if done {
                break;
            }
        }
        let stepped_final = last.unwrap();

        let mut looped = Session::new();
        looped.initialize(cross_spec(across, down)).unwrap();
        let looped_final = looped.run_to_completion(None).unwrap();

        assert_eq!(stepped_final.grid, looped_final.grid);
        assert_eq!(stepped_final.solved, looped_final.solved);
    }

    #[test]
    fn test_terminal_steps_are_noops() {
        let mut session = Session::new();
        session
            .initialize(cross_spec(r#"[["CRANE", 0.9]]"#, r#"[["TEN", 0.8]]"#))
            .unwrap();

        let outcome = session.run_to_completion(None).unwrap();
        assert_eq!(outcome.solved, Some(false));
        assert_eq!(outcome.message, "No valid assignments could be made");

        let grid_before = outcome.grid.clone();
        let again = session.step().unwrap();
        assert_eq!(again.solved, Some(false));
        assert!(!again.progress);
        assert_eq!(again.grid, grid_before);
    }

    #[test]
    fn test_max_steps_cap_leaves_session_resumable() {
        let mut session = Session::new();
        session
            .initialize(cross_spec(
                r#"[["CRONE", 0.99], ["CRANE", 0.9]]"#,
                r#"[["TAN", 0.95], ["MAN", 0.5]]"#,
            ))
            .unwrap();

        let capped = session.run_to_completion(Some(2)).unwrap();
        assert_eq!(capped.solved, None);
        assert!(capped.message.contains("Maximum steps (2) reached"));

        // The session picks up where the cap stopped it.
        let finished = session.run_to_completion(None).unwrap();
        assert_eq!(finished.solved, Some(true));
    }

    #[test]
    fn test_reinitialize_resets_state() {
        let mut session = Session::new();
        session
            .initialize(cross_spec(r#"[["CRANE", 0.9]]"#, r#"[["TAN", 0.8]]"#))
            .unwrap();
        session.run_to_completion(None).unwrap();
        assert_eq!(session.state(), Some(SolverState::Complete));

        let init = session
            .initialize(cross_spec(r#"[["CRANE", 0.9]]"#, r#"[["TAN", 0.8]]"#))
            .unwrap();
        assert_eq!(session.state(), Some(SolverState::Ready));
        assert!(init.grid[1].iter().all(|c| c.letter.is_none()));
    }
}
