//! Puzzle data model and the setup-move transform

use std::str::FromStr;

use chess::{Board, ChessMove, File, Piece, Rank, Square};

use crate::dataset::DatasetError;

/// A tactical puzzle from the Lichess database.
///
/// `fen` is the position *before* the puzzle starts. `moves[0]` is the
/// opponent's forcing setup move, applied before the engine sees the
/// position; `moves[1]` is the solution move the engine must find.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Puzzle {
    pub id: String,
    pub fen: String,
    pub rating: i32,
    pub moves: Vec<String>,
}

impl Puzzle {
    /// The move the engine is expected to find.
    pub fn expected_move(&self) -> &str {
        &self.moves[1]
    }
}

/// Parse a UCI move token ("e2e4", "e7e8q") into a `ChessMove`.
///
/// Returns `None` for tokens that are not syntactically a move; legality
/// against a position is checked separately.
pub fn parse_uci_move(uci: &str) -> Option<ChessMove> {
    let bytes = uci.as_bytes();
    if bytes.len() < 4 {
        return None;
    }

    let (from_file, from_rank, to_file, to_rank) = (bytes[0], bytes[1], bytes[2], bytes[3]);
    if !(b'a'..=b'h').contains(&from_file)
        || !(b'1'..=b'8').contains(&from_rank)
        || !(b'a'..=b'h').contains(&to_file)
        || !(b'1'..=b'8').contains(&to_rank)
    {
        return None;
    }

    let from = Square::make_square(
        Rank::from_index((from_rank - b'1') as usize),
        File::from_index((from_file - b'a') as usize),
    );
    let to = Square::make_square(
        Rank::from_index((to_rank - b'1') as usize),
        File::from_index((to_file - b'a') as usize),
    );

    let promotion = if bytes.len() > 4 {
        match bytes[4] {
            b'q' => Some(Piece::Queen),
            b'r' => Some(Piece::Rook),
            b'b' => Some(Piece::Bishop),
            b'n' => Some(Piece::Knight),
            _ => None,
        }
    } else {
        None
    };

    Some(ChessMove::new(from, to, promotion))
}

/// FEN of the position under test: the puzzle's starting position after
/// the setup move. Pure and deterministic.
pub fn setup_position(puzzle: &Puzzle) -> Result<String, DatasetError> {
    let board = Board::from_str(&puzzle.fen).map_err(|e| DatasetError::Position {
        id: puzzle.id.clone(),
        reason: format!("invalid FEN: {e}"),
    })?;

    let setup = &puzzle.moves[0];
    let chess_move = parse_uci_move(setup).ok_or_else(|| DatasetError::Position {
        id: puzzle.id.clone(),
        reason: format!("unparseable setup move `{setup}`"),
    })?;

    if !board.legal(chess_move) {
        return Err(DatasetError::Position {
            id: puzzle.id.clone(),
            reason: format!("illegal setup move `{setup}`"),
        });
    }

    Ok(board.make_move_new(chess_move).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    fn puzzle(fen: &str, moves: &[&str]) -> Puzzle {
        Puzzle {
            id: "00008".to_string(),
            fen: fen.to_string(),
            rating: 1200,
            moves: moves.iter().map(|m| m.to_string()).collect(),
        }
    }

    #[test]
    fn test_parse_uci_move() {
        let m = parse_uci_move("e2e4").unwrap();
        assert_eq!(m.get_source().to_string(), "e2");
        assert_eq!(m.get_dest().to_string(), "e4");
        assert_eq!(m.get_promotion(), None);
    }

    #[test]
    fn test_parse_uci_move_promotion() {
        let m = parse_uci_move("e7e8q").unwrap();
        assert_eq!(m.get_promotion(), Some(Piece::Queen));
    }

    #[test]
    fn test_parse_uci_move_rejects_garbage() {
        assert_eq!(parse_uci_move(""), None);
        assert_eq!(parse_uci_move("e2"), None);
        assert_eq!(parse_uci_move("zz99"), None);
        assert_eq!(parse_uci_move("!!!!"), None);
    }

    #[test]
    fn test_setup_position_applies_first_move() {
        let p = puzzle(START_FEN, &["g1f3", "g8f6"]);
        let fen = setup_position(&p).unwrap();
        assert!(
            fen.starts_with("rnbqkbnr/pppppppp/8/8/8/5N2/PPPPP1PP/RNBQKB1R b"),
            "unexpected position: {fen}"
        );
    }

    #[test]
    fn test_setup_position_matches_direct_application() {
        let p = puzzle(START_FEN, &["e2e4", "e7e5"]);
        let board = Board::from_str(START_FEN).unwrap();
        let expected = board.make_move_new(parse_uci_move("e2e4").unwrap()).to_string();
        assert_eq!(setup_position(&p).unwrap(), expected);
    }

    #[test]
    fn test_setup_position_is_deterministic() {
        let p = puzzle(START_FEN, &["e2e4", "e7e5"]);
        assert_eq!(setup_position(&p).unwrap(), setup_position(&p).unwrap());
    }

    #[test]
    fn test_setup_position_rejects_illegal_move() {
        let p = puzzle(START_FEN, &["e2e5", "e7e5"]);
        let err = setup_position(&p).unwrap_err();
        assert!(err.to_string().contains("e2e5"));
    }

    #[test]
    fn test_setup_position_rejects_bad_fen() {
        let p = puzzle("not a fen", &["e2e4", "e7e5"]);
        assert!(setup_position(&p).is_err());
    }
}
