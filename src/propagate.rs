//! Constraint propagation: writing a candidate into the grid, or undoing it.
//!
//! This layer is the only code that turns a clue assignment into grid
//! mutations, and it is transactional: on conflict, neither the grid nor the
//! clue is touched. Conflicts are reported to the engine, never retried here.

use crate::clue::Clue;
use crate::grid::{AppliedCells, Conflict, Grid};

/// Attempt to assign `clue.candidates[candidate_index]` to the clue.
///
/// Delegates the span write to [`Grid::place`]; on success, records the word
/// and confidence on the clue and returns the exact set of cells written (for
/// later exact undo). On conflict, all state is left untouched and the
/// conflict (which cell, which two letters disagree) is returned.
///
/// # Errors
///
/// Returns [`Conflict`] when an already-lettered crossing cell disagrees.
pub fn try_assign(
    grid: &mut Grid,
    clue: &mut Clue,
    candidate_index: usize,
) -> Result<AppliedCells, Conflict> {
    debug_assert!(
        candidate_index < clue.candidates.len(),
        "candidate index {candidate_index} out of range for {}",
        clue.key()
    );
    debug_assert!(clue.assigned.is_none(), "clue {} is already assigned", clue.key());

    let candidate = &clue.candidates[candidate_index];
    let applied = grid.place(&clue.span(), &candidate.word)?;

    clue.assigned = Some(candidate.word.clone());
    clue.assigned_confidence = Some(candidate.confidence);
    Ok(applied)
}

/// Undo a prior [`try_assign`]: clear exactly the cells it wrote and restore
/// the clue's previous assignment fields (recorded in the history entry).
pub fn unassign(
    grid: &mut Grid,
    clue: &mut Clue,
    applied: &AppliedCells,
    previous_assigned: Option<String>,
    previous_confidence: Option<f64>,
) {
    debug_assert!(clue.assigned.is_some(), "unassigning clue {} with no assignment", clue.key());
    grid.clear(applied);
    clue.assigned = previous_assigned;
    clue.assigned_confidence = previous_confidence;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clue::{ClueKey, ClueStore, Direction};
    use crate::grid::Pos;

    fn two_clue_fixture() -> (Grid, ClueStore) {
        // Row 1 holds a 5-letter across; column 2 a 3-letter down crossing
        // it at the down clue's second letter.
        let layout: Vec<Vec<bool>> = ["##*##", "*****", "##*##"]
            .iter()
            .map(|r| r.chars().map(|ch| ch == '#').collect())
            .collect();
        let mut grid = Grid::from_layout(&layout);
        let mut store = ClueStore::derive(&mut grid);

        store.attach(
            ClueKey { number: 2, direction: Direction::Across },
            "5 letters".to_string(),
            vec![("CRANE".to_string(), 0.9)],
        );
        store.attach(
            ClueKey { number: 1, direction: Direction::Down },
            "3 letters".to_string(),
            vec![("TEN".to_string(), 0.95), ("TAN".to_string(), 0.4)],
        );
        (grid, store)
    }

    #[test]
    fn test_try_assign_success_updates_clue_and_grid() {
        let (mut grid, mut store) = two_clue_fixture();
        let key = ClueKey { number: 2, direction: Direction::Across };
        let clue = store.get_mut(key).unwrap();

        let applied = try_assign(&mut grid, clue, 0).unwrap();

        assert_eq!(applied.len(), 5);
        assert_eq!(clue.assigned.as_deref(), Some("CRANE"));
        assert_eq!(clue.assigned_confidence, Some(0.9));
        assert_eq!(grid.letter(Pos::new(1, 2)), Some('A'));
    }

    #[test]
    fn test_try_assign_conflict_leaves_state_untouched() {
        let (mut grid, mut store) = two_clue_fixture();
        let across = ClueKey { number: 2, direction: Direction::Across };
        let down = ClueKey { number: 1, direction: Direction::Down };

        let clue = store.get_mut(across).unwrap();
        try_assign(&mut grid, clue, 0).unwrap();

        // "TEN" needs 'E' at (1, 2) where CRANE put 'A'.
        let clue = store.get_mut(down).unwrap();
        let conflict = try_assign(&mut grid, clue, 0).unwrap_err();

        assert_eq!(conflict.pos, Pos::new(1, 2));
        assert_eq!(conflict.existing, 'A');
        assert_eq!(conflict.proposed, 'E');
        assert_eq!(clue.assigned, None);
        assert_eq!(clue.assigned_confidence, None);
        assert_eq!(grid.letter(Pos::new(0, 2)), None);
    }

    #[test]
    fn test_unassign_restores_previous_state() {
        let (mut grid, mut store) = two_clue_fixture();
        let across = ClueKey { number: 2, direction: Direction::Across };
        let down = ClueKey { number: 1, direction: Direction::Down };

        let clue = store.get_mut(across).unwrap();
        try_assign(&mut grid, clue, 0).unwrap();

        let clue = store.get_mut(down).unwrap();
        let applied = try_assign(&mut grid, clue, 1).unwrap(); // "TAN" fits
        unassign(&mut grid, clue, &applied, None, None);

        assert_eq!(clue.assigned, None);
        assert_eq!(grid.letter(Pos::new(0, 2)), None);
        // The crossing letter owned by the across clue survives.
        assert_eq!(grid.letter(Pos::new(1, 2)), Some('A'));
    }
}
