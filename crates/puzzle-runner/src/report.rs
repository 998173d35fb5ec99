//! Report rendering
//!
//! Pure formatting of evaluation outcomes into fixed-field text blocks.
//! Statistics the engine never reported render as empty fields, never as
//! zero — an empty column must not read as a measurement.

use std::fmt::Display;

use crate::evaluate::EvaluationOutcome;

/// Node throughput: plain integer below 1000 nodes/sec, megascale with one
/// fractional digit at or above it.
pub fn format_nps(nps: u64) -> String {
    if nps >= 1_000 {
        format!("{:.1}M", nps as f64 / 1_000_000.0)
    } else {
        nps.to_string()
    }
}

fn opt<T: Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Render one outcome as a report block. `index` is 1-based.
pub fn render(outcome: &EvaluationOutcome, index: usize) -> String {
    let puzzle = &outcome.puzzle;
    let result = &outcome.result;

    let mut out = format!(
        "---\nPuzzle {index}\tid: {}, r: {}, fen: {}\n",
        puzzle.id, puzzle.rating, outcome.position
    );

    if outcome.correct {
        out.push_str(&format!("Correct move:  \t{}\n", result.best_move()));
    } else {
        out.push_str(&format!(
            "Wrong move:    \tfound {}, best: {}\n",
            result.best_move(),
            puzzle.expected_move()
        ));
    }

    let depth = if result.depth.is_none() && result.seldepth.is_none() {
        String::new()
    } else {
        format!("{}/{}", opt(result.depth), opt(result.seldepth))
    };

    out.push_str(&format!("Depth:         \t{depth}\n"));
    out.push_str(&format!("Nodes:         \t{}\n", opt(result.nodes)));
    out.push_str(&format!("NPS:           \t{}\n", opt(result.nps.map(format_nps))));
    out.push_str(&format!("Relative score:\t{}\n", opt(result.score)));

    out
}
