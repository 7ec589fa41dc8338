use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use gridfill::puzzle::PuzzleSpec;
use gridfill::session::Session;

/// Gridfill crossword solver
#[derive(Parser, Debug)]
#[command(
    author,
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")"),
    about,
    long_about = None
)]
struct Cli {
    /// Path to the puzzle file (JSON: rows, clues with candidates, optional solution)
    puzzle: String,

    /// Maximum number of solver steps before giving up
    #[arg(short = 'n', long, default_value_t = 10_000)]
    max_steps: usize,

    /// Print the grid and message after every individual step
    #[arg(short, long)]
    step_by_step: bool,
}

/// Entry point of the Gridfill CLI.
///
/// Delegates to [`try_main`], catching any errors and printing them
/// in a user-friendly way before exiting with code 1.
fn main() -> ExitCode {
    // Set up logging
    let debug_enabled = std::env::var("GRIDFILL_DEBUG").is_ok();
    gridfill::log::init_logger(debug_enabled);

    log::info!("Starting Gridfill solver");

    if let Err(e) = try_main() {
        // Print the error message to stderr, with detailed formatting if it's a LayoutError
        if let Some(layout_err) = e.downcast_ref::<gridfill::LayoutError>() {
            eprintln!("Error: {}", layout_err.display_detailed());
        } else {
            eprintln!("Error: {e}");
        }
        // Exit explicitly with a nonzero code so scripts can detect failure
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Core application logic for the Gridfill CLI.
///
/// Steps:
/// 1. Parse CLI arguments with Clap.
/// 2. Load and validate the puzzle file.
/// 3. Drive the solver, either step by step or in one run.
/// 4. Print the final grid on stdout.
/// 5. Print performance metrics (timings, counts) on stderr.
///
/// Returns `Ok(())` on success or an error (e.g., malformed puzzle file,
/// invalid layout) which bubbles up to [`main`].
fn try_main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let cli = Cli::parse();

    // 1. Load and validate the puzzle
    let t_load = Instant::now();
    let spec = PuzzleSpec::load_from_path(&cli.puzzle)?;
    let mut session = Session::new();
    let init = session.initialize(spec)?;
    let load_secs = t_load.elapsed().as_secs_f64();

    let clue_count = init.across_clues.len() + init.down_clues.len();

    // 2. Solve
    let t_solve = Instant::now();
    let (outcome, steps) = if cli.step_by_step {
        let mut steps = 0usize;
        loop {
            let outcome = session.step()?;
            steps += 1;
            println!("[step {steps}] {}", outcome.message);
            print_grid(&outcome.grid);
            if outcome.solved.is_some() || steps >= cli.max_steps {
                break (outcome, steps);
            }
        }
    } else {
        (session.run_to_completion(Some(cli.max_steps))?, 0)
    };
    let solve_secs = t_solve.elapsed().as_secs_f64();

    // 3. Final grid and assignments on stdout
    if !cli.step_by_step {
        print_grid(&outcome.grid);
    }
    for assigned in &outcome.assigned_clues {
        if let Some(word) = &assigned.assigned {
            println!("{} {}: {word}", assigned.number, assigned.direction);
        }
    }

    match outcome.solved {
        Some(true) => eprintln!("✓ {}", outcome.message),
        Some(false) => eprintln!("✗ {}", outcome.message),
        None => eprintln!("⚠️  {}", outcome.message),
    }

    // 4. Diagnostics to stderr
    if cli.step_by_step {
        eprintln!(
            "Loaded {clue_count} clues in {load_secs:.3}s; {steps} steps in {solve_secs:.3}s."
        );
    } else {
        eprintln!("Loaded {clue_count} clues in {load_secs:.3}s; solved in {solve_secs:.3}s.");
    }

    Ok(())
}

fn print_grid(grid: &[Vec<gridfill::session::CellSnapshot>]) {
    for row in grid {
        let line: String = row
            .iter()
            .map(|cell| {
                if cell.is_black {
                    '#'
                } else {
                    cell.letter.unwrap_or('.')
                }
            })
            .collect();
        println!("{line}");
    }
}
