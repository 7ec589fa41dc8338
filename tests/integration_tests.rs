//! Integration tests for the Gridfill crossword solver.
//!
//! These tests drive the complete pipeline from puzzle-file parsing through
//! clue derivation and solving to final-grid validation, using a realistic
//! 5x5 puzzle whose highest-confidence candidates are not all correct.

use std::fs;

use gridfill::puzzle::PuzzleSpec;
use gridfill::session::{CellSnapshot, Session, StepOutcome};
use gridfill::LayoutError;

const SAMPLE_PUZZLE: &str = "tests/fixtures/sample_puzzle.json";

/// Load the sample puzzle from fixtures
fn load_sample_spec() -> PuzzleSpec {
    let content = fs::read_to_string(SAMPLE_PUZZLE).expect("Failed to read sample puzzle");
    PuzzleSpec::parse_from_str(&content).expect("Sample puzzle should parse")
}

/// Helper to flatten a grid snapshot into display rows ('#' black, '.' empty)
fn grid_rows(grid: &[Vec<CellSnapshot>]) -> Vec<String> {
    grid.iter()
        .map(|row| {
            row.iter()
                .map(|cell| {
                    if cell.is_black {
                        '#'
                    } else {
                        cell.letter.unwrap_or('.')
                    }
                })
                .collect()
        })
        .collect()
}

/// Helper to run an initialized session one step at a time to a terminal
/// state, collecting every outcome
fn step_until_terminal(session: &mut Session) -> Vec<StepOutcome> {
    let mut outcomes = Vec::new();
    for _ in 0..10_000 {
        let outcome = session.step().expect("session is initialized");
        let done = outcome.solved.is_some();
        outcomes.push(outcome);
        if done {
            return outcomes;
        }
    }
    panic!("solver did not reach a terminal state");
}

#[cfg(test)]
mod solving {
    use super::*;

    #[test]
    fn test_sample_puzzle_solves_to_known_solution() {
        let mut session = Session::new();
        session.initialize(load_sample_spec()).unwrap();

        let outcome = session.run_to_completion(None).unwrap();

        assert_eq!(outcome.solved, Some(true));
        assert_eq!(outcome.message, "Puzzle complete");
        assert_eq!(
            grid_rows(&outcome.grid),
            vec!["#TWIN", "#OHMY", "GRAPE", "ISLE#", "NOEL#"]
        );
    }

    #[test]
    fn test_wrong_high_confidence_candidates_are_rejected() {
        // SOCK (1 Across) and SNOW (8 Across) outrank the correct words but
        // clash with crossings; the solver must fall through past them.
        let mut session = Session::new();
        session.initialize(load_sample_spec()).unwrap();

        let outcome = session.run_to_completion(None).unwrap();

        let words: Vec<&str> = outcome
            .assigned_clues
            .iter()
            .filter_map(|a| a.assigned.as_deref())
            .collect();
        assert!(words.contains(&"TWIN"));
        assert!(words.contains(&"NOEL"));
        assert!(!words.contains(&"SOCK"));
        assert!(!words.contains(&"SNOW"));
    }

    #[test]
    fn test_stepwise_matches_run_to_completion() {
        let mut stepped = Session::new();
        stepped.initialize(load_sample_spec()).unwrap();
        let outcomes = step_until_terminal(&mut stepped);
        let stepped_final = outcomes.last().unwrap();

        let mut looped = Session::new();
        looped.initialize(load_sample_spec()).unwrap();
        let looped_final = looped.run_to_completion(None).unwrap();

        assert_eq!(stepped_final.solved, looped_final.solved);
        assert_eq!(grid_rows(&stepped_final.grid), grid_rows(&looped_final.grid));
    }

    #[test]
    fn test_solving_is_deterministic() {
        let run = || {
            let mut session = Session::new();
            session.initialize(load_sample_spec()).unwrap();
            step_until_terminal(&mut session)
                .into_iter()
                .map(|o| o.message)
                .collect::<Vec<_>>()
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn test_terminal_state_survives_repeated_stepping() {
        let mut session = Session::new();
        session.initialize(load_sample_spec()).unwrap();
        let finished = session.run_to_completion(None).unwrap();
        let rows = grid_rows(&finished.grid);

        for _ in 0..3 {
            let again = session.step().unwrap();
            assert!(!again.progress);
            assert_eq!(again.solved, Some(true));
            assert_eq!(grid_rows(&again.grid), rows);
        }
    }

    #[test]
    fn test_max_steps_cap_is_resumable() {
        let mut session = Session::new();
        session.initialize(load_sample_spec()).unwrap();

        let capped = session.run_to_completion(Some(3)).unwrap();
        assert_eq!(capped.solved, None);
        assert!(capped.message.contains("Maximum steps (3) reached"));

        let finished = session.run_to_completion(None).unwrap();
        assert_eq!(finished.solved, Some(true));
        assert_eq!(
            grid_rows(&finished.grid),
            vec!["#TWIN", "#OHMY", "GRAPE", "ISLE#", "NOEL#"]
        );
    }
}

#[cfg(test)]
mod initialization {
    use super::*;

    #[test]
    fn test_fixture_loads_from_path() {
        let spec = PuzzleSpec::load_from_path(SAMPLE_PUZZLE).unwrap();
        let mut session = Session::new();
        let init = session.initialize(spec).unwrap();

        assert_eq!(init.across_clues.len(), 5);
        assert_eq!(init.down_clues.len(), 5);
        assert_eq!(grid_rows(&init.grid)[0], "#....");
    }

    #[test]
    fn test_clue_numbering_matches_supplied_geometry() {
        // Every clue in the fixture carries its expected start and length;
        // initialize cross-checks them against the derived numbering and
        // would fail on any disagreement.
        let mut session = Session::new();
        let init = session.initialize(load_sample_spec()).unwrap();

        let six_across = init.across_clues.iter().find(|c| c.number == 6).unwrap();
        let six_down = init.down_clues.iter().find(|c| c.number == 6).unwrap();
        assert_eq!(six_across.start, [2, 0]);
        assert_eq!(six_down.start, [2, 0]);
        assert_eq!(six_across.length, 5);
        assert_eq!(six_down.length, 3);
    }

    #[test]
    fn test_geometry_mismatch_is_rejected() {
        let mut spec = load_sample_spec();
        spec.clues[0].length = Some(3);

        let mut session = Session::new();
        let err = session.initialize(spec).unwrap_err();
        assert!(matches!(err, LayoutError::GeometryMismatch { .. }));
        assert_eq!(err.code(), "L007");
    }

    #[test]
    fn test_wrong_solution_reports_unsolved() {
        let mut spec = load_sample_spec();
        spec.solution.as_mut().unwrap()[0] = "#TWIG".to_string();

        let mut session = Session::new();
        session.initialize(spec).unwrap();
        let outcome = session.run_to_completion(None).unwrap();

        // The fill completes, but it no longer matches the stated solution.
        assert_eq!(outcome.message, "Puzzle complete");
        assert_eq!(outcome.solved, Some(false));
    }

    #[test]
    fn test_step_without_initialize_is_an_error() {
        let mut session = Session::new();
        assert!(session.step().is_err());
    }
}
