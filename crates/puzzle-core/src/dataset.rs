//! Lichess puzzle CSV loading
//!
//! Row layout: `PuzzleId,FEN,Moves,Rating,RatingDeviation,Popularity,NbPlays,
//! Themes,GameUrl,OpeningTags`. Only the first four columns are used; the
//! fields are unquoted in this dataset, so rows split on plain commas.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use thiserror::Error;

use crate::puzzle::Puzzle;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("malformed puzzle row at line {line}: {reason}")]
    Format { line: usize, reason: String },

    #[error("puzzle {id}: {reason}")]
    Position { id: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Load up to `limit` puzzles from the CSV at `path`, sorted ascending by
/// rating. The sort is stable, so equal ratings keep their source order.
/// Reading stops as soon as `limit` rows have been accepted.
pub fn load(path: &Path, limit: usize) -> Result<Vec<Puzzle>, DatasetError> {
    let reader = BufReader::new(File::open(path)?);
    let mut puzzles: Vec<Puzzle> = Vec::with_capacity(limit);

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        // First line is the column header.
        if idx == 0 {
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }

        puzzles.push(parse_row(&line, idx + 1)?);

        if puzzles.len() >= limit {
            break;
        }
    }

    puzzles.sort_by_key(|p| p.rating);

    Ok(puzzles)
}

fn parse_row(line: &str, line_no: usize) -> Result<Puzzle, DatasetError> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() < 4 {
        return Err(DatasetError::Format {
            line: line_no,
            reason: format!("expected at least 4 fields, got {}: `{line}`", fields.len()),
        });
    }

    let moves: Vec<String> = fields[2].split(' ').map(str::to_string).collect();
    if moves.len() < 2 {
        return Err(DatasetError::Format {
            line: line_no,
            reason: format!("move list `{}` needs a setup move and a solution move", fields[2]),
        });
    }

    let rating: i32 = fields[3].trim().parse().map_err(|_| DatasetError::Format {
        line: line_no,
        reason: format!("rating `{}` is not an integer", fields[3]),
    })?;

    Ok(Puzzle {
        id: fields[0].to_string(),
        fen: fields[1].to_string(),
        rating,
        moves,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    const HEADER: &str =
        "PuzzleId,FEN,Moves,Rating,RatingDeviation,Popularity,NbPlays,Themes,GameUrl,OpeningTags";

    fn write_dataset(name: &str, rows: &[&str]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("puzzle-core-{name}-{}.csv", std::process::id()));
        let mut file = File::create(&path).unwrap();
        writeln!(file, "{HEADER}").unwrap();
        for row in rows {
            writeln!(file, "{row}").unwrap();
        }
        path
    }

    #[test]
    fn test_parse_row_round_trip() {
        let row = "00008,r6k1/pp2r1pp/3p1p2/3P1q2/3QP3/8/PP3PPP/5RK1 w - - 0 1,e2e4 e7e5,1200,75,93,100,mate,url,";
        let puzzle = parse_row(row, 2).unwrap();
        assert_eq!(puzzle.id, "00008");
        assert_eq!(puzzle.rating, 1200);
        assert_eq!(puzzle.moves, vec!["e2e4", "e7e5"]);
    }

    #[test]
    fn test_parse_row_too_few_fields() {
        let err = parse_row("00008,somefen,e2e4 e7e5", 7).unwrap_err();
        match err {
            DatasetError::Format { line, .. } => assert_eq!(line, 7),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_row_non_integer_rating() {
        let err = parse_row("00008,somefen,e2e4 e7e5,high,75", 3).unwrap_err();
        assert!(err.to_string().contains("line 3"));
        assert!(err.to_string().contains("high"));
    }

    #[test]
    fn test_parse_row_short_move_list() {
        let err = parse_row("00008,somefen,e2e4,1200,75", 4).unwrap_err();
        assert!(err.to_string().contains("setup move"));
    }

    #[test]
    fn test_load_sorts_by_rating_stable() {
        let path = write_dataset(
            "sort",
            &[
                "a,fen1,e2e4 e7e5,1500,0,0,0,t,u,",
                "b,fen2,e2e4 e7e5,900,0,0,0,t,u,",
                "c,fen3,e2e4 e7e5,1500,0,0,0,t,u,",
            ],
        );
        let puzzles = load(&path, 10).unwrap();
        std::fs::remove_file(&path).unwrap();

        let ids: Vec<&str> = puzzles.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert!(puzzles.windows(2).all(|w| w[0].rating <= w[1].rating));
    }

    #[test]
    fn test_load_respects_limit_in_source_order() {
        let path = write_dataset(
            "limit",
            &[
                "a,fen1,e2e4 e7e5,1500,0,0,0,t,u,",
                "b,fen2,e2e4 e7e5,900,0,0,0,t,u,",
                "c,fen3,e2e4 e7e5,800,0,0,0,t,u,",
            ],
        );
        // The first two source rows are retained, then sorted.
        let puzzles = load(&path, 2).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(puzzles.len(), 2);
        assert_eq!(puzzles[0].id, "b");
        assert_eq!(puzzles[1].id, "a");
    }

    #[test]
    fn test_load_shorter_source_than_limit() {
        let path = write_dataset("short", &["a,fen1,e2e4 e7e5,1500,0,0,0,t,u,"]);
        let puzzles = load(&path, 100).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(puzzles.len(), 1);
    }

    #[test]
    fn test_load_reports_malformed_row_line() {
        let path = write_dataset(
            "badrow",
            &[
                "a,fen1,e2e4 e7e5,1500,0,0,0,t,u,",
                "b,fen2,e2e4 e7e5,not-a-rating,0,0,0,t,u,",
            ],
        );
        let err = load(&path, 10).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(err.to_string().contains("line 3"), "got: {err}");
    }
}
