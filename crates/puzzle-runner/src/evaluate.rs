//! The evaluation loop
//!
//! One analysis per puzzle, in rating order. The loop stops at the first
//! puzzle whose engine move differs from the known solution — the harness
//! exists to find the first regression, not a pass rate.

use puzzle_core::puzzle::{setup_position, Puzzle};

use crate::error::RunnerError;
use crate::report;
use crate::uci::{Analyze, SearchLimit, SearchResult};

/// Per-puzzle result. `halt` tells the consumer loop to stop.
#[derive(Debug, Clone)]
pub struct EvaluationOutcome {
    pub puzzle: Puzzle,
    /// FEN actually analyzed: the puzzle position after its setup move.
    pub position: String,
    pub result: SearchResult,
    pub correct: bool,
    pub halt: bool,
}

impl EvaluationOutcome {
    /// Score an engine answer against the puzzle's solution move. A
    /// null-move answer is simply an unequal move: incorrect, halting.
    pub fn score(puzzle: &Puzzle, position: String, result: SearchResult) -> Self {
        let correct = result.best_move() == puzzle.expected_move();
        Self {
            puzzle: puzzle.clone(),
            position,
            result,
            correct,
            halt: !correct,
        }
    }
}

/// Analyze a single puzzle: apply the setup move, run one bounded search,
/// compare the answer.
pub async fn evaluate_one<E: Analyze>(
    puzzle: &Puzzle,
    engine: &mut E,
    limit: SearchLimit,
) -> Result<EvaluationOutcome, RunnerError> {
    let position = setup_position(puzzle)?;
    let result = engine.analyze(&position, limit).await?;
    Ok(EvaluationOutcome::score(puzzle, position, result))
}

/// Evaluate puzzles in order, printing one report block per puzzle, until
/// the set is exhausted or an outcome halts the run.
pub async fn run<E: Analyze>(
    puzzles: &[Puzzle],
    engine: &mut E,
    limit: SearchLimit,
) -> Result<Vec<EvaluationOutcome>, RunnerError> {
    let mut outcomes = Vec::new();

    for (i, puzzle) in puzzles.iter().enumerate() {
        let outcome = evaluate_one(puzzle, engine, limit).await?;
        print!("{}", report::render(&outcome, i + 1));

        let halt = outcome.halt;
        outcomes.push(outcome);
        if halt {
            break;
        }
    }

    Ok(outcomes)
}
