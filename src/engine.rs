//! The solver engine: variable/value selection, propagation, and
//! chronological backtracking over an explicit history stack.
//!
//! # Stepping model
//!
//! Each [`Engine::step`] call performs exactly one observable unit of work:
//!
//! - **assignment**: the selected clue's best untried candidate fits and is
//!   written into the grid (history entry pushed, clue leaves the frontier);
//! - **failed attempt**: that candidate conflicts with a crossing letter;
//!   it is marked tried at the current depth and the conflict is reported;
//! - **backtrack**: no unassigned clue has an untried candidate left, so the
//!   chronologically newest history entry is popped (strict LIFO, regardless
//!   of clue number or direction) and its grid writes undone.
//!
//! A backtrack only happens once the current partial assignment is proven
//! stuck, which is what makes exhausting the popped candidate sound.
//!
//! # Tried-candidate scoping
//!
//! Marks are scoped to search depth: every history entry records the marks
//! added while it was on top of the stack and discards them when popped. The
//! popped entry's own candidate was marked *before* its push, so it lives in
//! the entry below (or the base set) and stays exhausted at the restored
//! depth. Re-initialization is the only thing that clears the base set.

use std::collections::{BTreeSet, HashMap, HashSet};

use log::{debug, info};

use crate::clue::{ClueKey, ClueStore};
use crate::grid::{AppliedCells, Conflict, Grid};
use crate::propagate;

/// Where the engine is in its lifecycle. Transitions only occur inside
/// [`Engine::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverState {
    /// Clue store built, history empty, nothing attempted yet.
    Ready,
    /// At least one step taken, frontier non-empty.
    InProgress,
    /// Every clue assigned.
    Complete,
    /// Backtracking ran past an empty history with clues unassigned: no
    /// assignment of the available candidates satisfies all constraints.
    Exhausted,
}

/// What a single step did. The façade turns these into user-facing results.
#[derive(Debug, Clone, PartialEq)]
pub enum StepEvent {
    /// A candidate was written into the grid.
    Assigned { key: ClueKey, word: String, confidence: f64 },
    /// The best untried candidate clashed with a crossing letter; nothing
    /// was mutated except marking the candidate tried at this depth.
    Conflict { key: ClueKey, word: String, conflict: Conflict },
    /// The newest assignment was undone and its clue returned to the
    /// frontier.
    Backtracked { key: ClueKey, word: String },
    /// Frontier empty. `solved` is the match against the known solution when
    /// one was supplied, otherwise true.
    Complete { solved: bool },
    /// Terminal failure: candidates exhausted with clues still open.
    Exhausted,
}

impl StepEvent {
    /// Whether this step advanced the fill.
    #[must_use]
    pub fn progress(&self) -> bool {
        matches!(self, StepEvent::Assigned { .. })
    }
}

/// One undo record. The stack of these, read bottom-to-top, is the exact
/// chronological order in which clues were assigned, and is the sole source
/// of truth for undo.
#[derive(Debug, Clone)]
struct HistoryEntry {
    key: ClueKey,
    #[allow(dead_code)] // part of the recorded undo contract; read in tests
    candidate_index: usize,
    previous_assigned: Option<String>,
    previous_confidence: Option<f64>,
    applied: AppliedCells,
    /// Tried-candidate marks added while this entry was the top of the
    /// stack; discarded when the entry is popped.
    marks_since: Vec<(ClueKey, usize)>,
}

/// The solving engine for one puzzle. Single-threaded and synchronous: each
/// `step` runs to completion, and the caller paces (or stops) the search.
#[derive(Debug)]
pub struct Engine {
    grid: Grid,
    clues: ClueStore,
    history: Vec<HistoryEntry>,
    /// Clues not yet assigned, ordered by (number, direction) so iteration
    /// and tie-breaking are deterministic.
    frontier: BTreeSet<ClueKey>,
    tried: HashMap<ClueKey, HashSet<usize>>,
    state: SolverState,
    /// Known-correct solution rows (`#` for black), if supplied.
    solution: Option<Vec<String>>,
    /// Cached once a terminal state is reached; repeat steps are no-ops.
    solved: Option<bool>,
}

impl Engine {
    #[must_use]
    pub fn new(grid: Grid, clues: ClueStore, solution: Option<Vec<String>>) -> Self {
        let frontier = clues.keys().into_iter().collect();
        Self {
            grid,
            clues,
            history: Vec::new(),
            frontier,
            tried: HashMap::new(),
            state: SolverState::Ready,
            solution,
            solved: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> SolverState {
        self.state
    }

    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[must_use]
    pub fn clues(&self) -> &ClueStore {
        &self.clues
    }

    /// `None` while in progress; `Some` once the frontier has emptied or the
    /// search exhausted.
    #[must_use]
    pub fn solved(&self) -> Option<bool> {
        self.solved
    }

    #[must_use]
    pub fn history_depth(&self) -> usize {
        self.history.len()
    }

    /// Index of the best (highest-confidence) candidate of `key` not yet
    /// tried at the current depth. Candidates are stored best-first, so the
    /// first unmarked index wins.
    fn best_untried(&self, key: ClueKey) -> Option<(usize, f64)> {
        let clue = self.clues.get(key)?;
        let marks = self.tried.get(&key);
        clue.candidates
            .iter()
            .enumerate()
            .find(|(i, _)| !marks.is_some_and(|m| m.contains(i)))
            .map(|(i, c)| (i, c.confidence))
    }

    /// Select the next clue to attempt: highest best-untried confidence,
    /// ties broken by lowest number, then Across before Down. Deterministic
    /// for identical clue/candidate data.
    fn select(&self) -> Option<(ClueKey, usize)> {
        let mut best: Option<(ClueKey, usize, f64)> = None;
        // Frontier iterates in ascending key order, so keeping the first of
        // equal confidences implements the tie-break.
        for &key in &self.frontier {
            if let Some((idx, confidence)) = self.best_untried(key) {
                let better = match best {
                    None => true,
                    Some((_, _, best_conf)) => confidence.total_cmp(&best_conf).is_gt(),
                };
                if better {
                    best = Some((key, idx, confidence));
                }
            }
        }
        best.map(|(key, idx, _)| (key, idx))
    }

    fn mark_tried(&mut self, key: ClueKey, index: usize) {
        self.tried.entry(key).or_default().insert(index);
        if let Some(top) = self.history.last_mut() {
            top.marks_since.push((key, index));
        }
        // With an empty history the mark lands in the never-cleared base set.
    }

    /// Perform one unit of work. See the module docs for the three outcomes.
    pub fn step(&mut self) -> StepEvent {
        match self.state {
            SolverState::Complete => {
                return StepEvent::Complete { solved: self.solved.unwrap_or(true) };
            }
            SolverState::Exhausted => return StepEvent::Exhausted,
            SolverState::Ready | SolverState::InProgress => {}
        }

        if self.frontier.is_empty() {
            let solved = self.check_solution();
            self.state = SolverState::Complete;
            self.solved = Some(solved);
            info!("puzzle complete (solved = {solved})");
            return StepEvent::Complete { solved };
        }

        if let Some((key, index)) = self.select() {
            self.mark_tried(key, index);
            self.state = SolverState::InProgress;

            let clue = self
                .clues
                .get_mut(key)
                .unwrap_or_else(|| unreachable!("frontier key {key} missing from store"));
            let previous_assigned = clue.assigned.clone();
            let previous_confidence = clue.assigned_confidence;
            let word = clue.candidates[index].word.clone();

            match propagate::try_assign(&mut self.grid, clue, index) {
                Ok(applied) => {
                    let confidence = clue.candidates[index].confidence;
                    debug!("assigned '{word}' to {key} (confidence {confidence})");
                    self.history.push(HistoryEntry {
                        key,
                        candidate_index: index,
                        previous_assigned,
                        previous_confidence,
                        applied,
                        marks_since: Vec::new(),
                    });
                    self.frontier.remove(&key);
                    StepEvent::Assigned { key, word, confidence }
                }
                Err(conflict) => {
                    let pattern = self.clues.pattern(&self.grid, key).unwrap_or_default();
                    debug!("conflict on '{word}' for {key} (pattern {pattern}): {conflict}");
                    StepEvent::Conflict { key, word, conflict }
                }
            }
        } else {
            self.backtrack()
        }
    }

    /// Pop the newest history entry and undo it, or transition to
    /// `Exhausted` when there is nothing left to unwind.
    fn backtrack(&mut self) -> StepEvent {
        let Some(entry) = self.history.pop() else {
            info!("candidates exhausted with {} clue(s) unassigned", self.frontier.len());
            self.state = SolverState::Exhausted;
            self.solved = Some(false);
            return StepEvent::Exhausted;
        };

        // Marks made above this depth belong to the abandoned subtree.
        for (key, index) in &entry.marks_since {
            if let Some(marks) = self.tried.get_mut(key) {
                marks.remove(index);
            }
        }

        let clue = self
            .clues
            .get_mut(entry.key)
            .unwrap_or_else(|| unreachable!("history key {} missing from store", entry.key));
        let word = clue.assigned.clone().unwrap_or_default();
        propagate::unassign(
            &mut self.grid,
            clue,
            &entry.applied,
            entry.previous_assigned,
            entry.previous_confidence,
        );
        self.frontier.insert(entry.key);
        self.state = SolverState::InProgress;
        debug!("backtracked '{word}' from {}", entry.key);
        StepEvent::Backtracked { key: entry.key, word }
    }

    /// Whether the engine has settled into `Complete` or `Exhausted`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self.state, SolverState::Complete | SolverState::Exhausted)
    }

    fn check_solution(&self) -> bool {
        match &self.solution {
            None => true,
            Some(rows) => self.grid.render_rows() == *rows,
        }
    }
}
