//! Bidirectional mapping between chess moves and coordinates of the 8x8x73
//! AlphaZero-style action tensor.
//!
//! A coordinate is (origin row, origin column, plane), rows board-relative
//! with row 0 = rank 8. Planes [0,56) are queen rides (8 directions times 7
//! distances), [56,64) knight jumps, [64,73) underpromotions (straight push
//! and the two capture diagonals, times knight/bishop/rook).

use chess::{ChessMove, Color, File, Piece, Rank, Square};
use ndarray::Array3;

use crate::position::Position;

pub const QUEEN_PLANES: usize = 56;
pub const KNIGHT_PLANES: usize = 8;
pub const UNDERPROMOTION_PLANES: usize = 9;
pub const PLANES_NUM: usize = QUEEN_PLANES + KNIGHT_PLANES + UNDERPROMOTION_PLANES;

/// Knight plane for a (dCol, dRow) jump, indexed `[dCol + 2][dRow + 2]`;
/// -1 marks deltas that are not knight jumps.
///
/// ```text
/// [ ][5][ ][3][ ]
/// [7][ ][ ][ ][1]
/// [ ][ ][K][ ][ ]
/// [6][ ][ ][ ][0]
/// [ ][4][ ][2][ ]
/// ```
const KNIGHT_JUMP_PLANE: [[i8; 5]; 5] = [
    [-1, 7, -1, 6, -1],
    [5, -1, -1, -1, 4],
    [-1, -1, -1, -1, -1],
    [3, -1, -1, -1, 2],
    [-1, 1, -1, 0, -1],
];

/// Inverse of `KNIGHT_JUMP_PLANE`: (dCol, dRow) per knight plane.
const KNIGHT_JUMP_DELTA: [(i8, i8); KNIGHT_PLANES] = [
    (2, 1),
    (2, -1),
    (1, 2),
    (1, -2),
    (-1, 2),
    (-1, -2),
    (-2, 1),
    (-2, -1),
];

/// Unit (dRow, dCol) per compass direction.
///
/// ```text
/// 7 0 1
/// 6   2
/// 5 4 3
/// ```
const QUEEN_DIRECTIONS: [(i8, i8); 8] = [
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
];

/// A cell of the action tensor.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ActionCoord {
    pub row: usize,
    pub col: usize,
    pub plane: usize,
}

fn square_to_row_col(sq: Square) -> (i8, i8) {
    let idx = sq.to_index() as i8;
    (7 - idx / 8, idx % 8)
}

fn row_col_to_square(row: i8, col: i8) -> Option<Square> {
    if !(0..8).contains(&row) || !(0..8).contains(&col) {
        return None;
    }
    Some(Square::make_square(
        Rank::from_index((7 - row) as usize),
        File::from_index(col as usize),
    ))
}

/// Only knights move in (1, 2) patterns, so the jump geometry alone
/// identifies knight moves.
fn is_knight_jump(d_row: i8, d_col: i8) -> bool {
    (d_row.abs() == 2 && d_col.abs() == 1) || (d_row.abs() == 1 && d_col.abs() == 2)
}

fn underpromotion_index(promotion: Option<Piece>) -> Option<usize> {
    match promotion {
        Some(Piece::Knight) => Some(0),
        Some(Piece::Bishop) => Some(1),
        Some(Piece::Rook) => Some(2),
        _ => None,
    }
}

fn direction_of(d_row: i8, d_col: i8) -> usize {
    if d_col == 0 {
        if d_row < 0 {
            0
        } else {
            4
        }
    } else if d_row == 0 {
        if d_col > 0 {
            2
        } else {
            6
        }
    } else if d_col > 0 {
        if d_row < 0 {
            1
        } else {
            3
        }
    } else if d_row < 0 {
        7
    } else {
        5
    }
}

/// Encodes a move into its action-tensor coordinate.
///
/// Promotion to queen is encoded as a plain ride; only underpromotions get
/// their own planes. The coordinate is unique among the legal moves of any
/// single position.
pub fn encode(mv: ChessMove) -> ActionCoord {
    let (from_row, from_col) = square_to_row_col(mv.get_source());
    let (to_row, to_col) = square_to_row_col(mv.get_dest());
    let (d_row, d_col) = (to_row - from_row, to_col - from_col);

    let plane = if is_knight_jump(d_row, d_col) {
        let jump = KNIGHT_JUMP_PLANE[(d_col + 2) as usize][(d_row + 2) as usize];
        QUEEN_PLANES + jump as usize
    } else if let Some(kind) = underpromotion_index(mv.get_promotion()) {
        if d_col == 0 {
            QUEEN_PLANES + KNIGHT_PLANES + kind
        } else {
            let diagonal = if to_row < from_row && to_col > from_col
                || to_row > from_row && to_col < from_col
            {
                0
            } else {
                1
            };
            QUEEN_PLANES + KNIGHT_PLANES + (diagonal + 1) * 3 + kind
        }
    } else {
        let squares = d_row.abs().max(d_col.abs()) as usize;
        (squares - 1) * 8 + direction_of(d_row, d_col)
    };

    ActionCoord {
        row: from_row as usize,
        col: from_col as usize,
        plane,
    }
}

/// Decodes an action-tensor coordinate back into a move candidate, the exact
/// inverse of [`encode`].
///
/// Underpromotion planes are side-dependent: the side to move fixes whether
/// the pawn pushes toward row 0 or row 7, and which capture column diagonal
/// 0 refers to. Returns `None` when the coordinate points off the board.
/// Legality is not checked; queen promotions come back promotion-less and
/// are restored by [`normalize_promotion`].
pub fn decode(coord: ActionCoord, side_to_move: Color) -> Option<ChessMove> {
    let ActionCoord { row, col, plane } = coord;
    if row >= 8 || col >= 8 || plane >= PLANES_NUM {
        return None;
    }
    let (from_row, from_col) = (row as i8, col as i8);

    let (to_row, to_col, promotion) = if plane < QUEEN_PLANES {
        let squares = (plane / 8 + 1) as i8;
        let (d_row, d_col) = QUEEN_DIRECTIONS[plane % 8];
        (from_row + d_row * squares, from_col + d_col * squares, None)
    } else if plane < QUEEN_PLANES + KNIGHT_PLANES {
        let (d_col, d_row) = KNIGHT_JUMP_DELTA[plane - QUEEN_PLANES];
        (from_row + d_row, from_col + d_col, None)
    } else {
        let kind = plane - QUEEN_PLANES - KNIGHT_PLANES;
        let push = match side_to_move {
            Color::White => -1,
            Color::Black => 1,
        };
        // Diagonal 0 is the capture toward higher columns for White and
        // lower columns for Black, mirroring the encode convention.
        let d_col = match kind / 3 {
            0 => 0,
            1 => -push,
            _ => push,
        };
        let promotion = [Piece::Knight, Piece::Bishop, Piece::Rook][kind % 3];
        (from_row + push, from_col + d_col, Some(promotion))
    };

    let source = row_col_to_square(from_row, from_col)?;
    let dest = row_col_to_square(to_row, to_col)?;
    Some(ChessMove::new(source, dest, promotion))
}

/// Rewrites a decoded pawn push onto the back rank as a queen promotion.
/// Queen promotions are encoded as plain rides, so the promotion piece has
/// to be filled back in from the position.
pub fn normalize_promotion(pos: &Position, mv: ChessMove) -> ChessMove {
    if mv.get_promotion().is_some() {
        return mv;
    }
    let is_pawn = pos.board().piece_on(mv.get_source()) == Some(Piece::Pawn);
    let rank = mv.get_dest().get_rank();
    if is_pawn && (rank == Rank::First || rank == Rank::Eighth) {
        ChessMove::new(mv.get_source(), mv.get_dest(), Some(Piece::Queen))
    } else {
        mv
    }
}

/// Binary legality mask over the action tensor, rebuilt from scratch from
/// the position's legal moves.
pub fn legal_move_mask(pos: &Position) -> Array3<f32> {
    let mut mask = Array3::zeros((8, 8, PLANES_NUM));
    for mv in pos.legal_moves() {
        let coord = encode(mv);
        mask[[coord.row, coord.col, coord.plane]] = 1.0;
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::Board;
    use itertools::Itertools;
    use std::collections::HashSet;
    use std::str::FromStr;

    fn sq(file: usize, rank: usize) -> Square {
        Square::make_square(Rank::from_index(rank), File::from_index(file))
    }

    #[test]
    fn knight_move_roundtrip() {
        // Nb1-c3.
        let mv = ChessMove::new(sq(1, 0), sq(2, 2), None);
        let coord = encode(mv);
        assert!((QUEEN_PLANES..QUEEN_PLANES + KNIGHT_PLANES).contains(&coord.plane));
        assert_eq!(decode(coord, Color::White), Some(mv));
    }

    #[test]
    fn queen_move_roundtrip() {
        // e2-e4: two squares toward rank 8, direction 0.
        let mv = ChessMove::new(sq(4, 1), sq(4, 3), None);
        let coord = encode(mv);
        assert_eq!(coord, ActionCoord { row: 6, col: 4, plane: 8 });
        assert_eq!(decode(coord, Color::White), Some(mv));

        // Ra8-h8 for Black: seven squares east.
        let mv = ChessMove::new(sq(0, 7), sq(7, 7), None);
        let coord = encode(mv);
        assert_eq!(coord.plane, 6 * 8 + 2);
        assert_eq!(decode(coord, Color::Black), Some(mv));
    }

    #[test]
    fn queen_promotion_is_a_plain_ride() {
        let board = Board::from_str("4k3/4P3/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let pos = Position::from_board(board);

        let mv = ChessMove::new(sq(4, 6), sq(4, 7), Some(Piece::Queen));
        let coord = encode(mv);
        assert!(coord.plane < QUEEN_PLANES);

        // Decode drops the promotion; normalization restores the queen.
        let decoded = decode(coord, Color::White).unwrap();
        assert_eq!(decoded.get_promotion(), None);
        assert_eq!(normalize_promotion(&pos, decoded), mv);
    }

    #[test]
    fn underpromotion_planes() {
        // Straight pushes take planes 64..67.
        let push = ChessMove::new(sq(4, 6), sq(4, 7), Some(Piece::Knight));
        assert_eq!(encode(push).plane, 64);
        let push = ChessMove::new(sq(4, 6), sq(4, 7), Some(Piece::Rook));
        assert_eq!(encode(push).plane, 66);

        // White capture toward the h-file is diagonal 0 (planes 67..70).
        let cap = ChessMove::new(sq(4, 6), sq(5, 7), Some(Piece::Bishop));
        assert_eq!(encode(cap).plane, 68);
        // Toward the a-file is diagonal 1 (planes 70..73).
        let cap = ChessMove::new(sq(4, 6), sq(3, 7), Some(Piece::Bishop));
        assert_eq!(encode(cap).plane, 71);
    }

    #[test]
    fn underpromotions_roundtrip_for_both_sides() {
        let white = [
            ChessMove::new(sq(4, 6), sq(4, 7), Some(Piece::Knight)),
            ChessMove::new(sq(4, 6), sq(5, 7), Some(Piece::Bishop)),
            ChessMove::new(sq(4, 6), sq(3, 7), Some(Piece::Rook)),
        ];
        for mv in white {
            assert_eq!(decode(encode(mv), Color::White), Some(mv));
        }

        let black = [
            ChessMove::new(sq(4, 1), sq(4, 0), Some(Piece::Knight)),
            ChessMove::new(sq(4, 1), sq(3, 0), Some(Piece::Bishop)),
            ChessMove::new(sq(4, 1), sq(5, 0), Some(Piece::Rook)),
        ];
        for mv in black {
            assert_eq!(decode(encode(mv), Color::Black), Some(mv));
        }
    }

    #[test]
    fn decode_rejects_off_board() {
        // One square toward rank 8, starting on rank 8.
        assert_eq!(decode(ActionCoord { row: 0, col: 0, plane: 0 }, Color::White), None);
        // Knight jump off the a-file.
        assert_eq!(decode(ActionCoord { row: 4, col: 0, plane: 62 }, Color::White), None);
        // Plane out of range.
        assert_eq!(decode(ActionCoord { row: 4, col: 4, plane: 73 }, Color::White), None);
    }

    fn assert_injective_and_bounded(pos: &Position) {
        let moves = pos.legal_moves();
        let coords = moves.iter().map(|&m| encode(m)).collect_vec();
        for coord in &coords {
            assert!(coord.row < 8 && coord.col < 8 && coord.plane < PLANES_NUM);
        }
        let unique: HashSet<_> = coords.iter().copied().collect();
        assert_eq!(unique.len(), moves.len());

        for (&mv, &coord) in moves.iter().zip(&coords) {
            let decoded = decode(coord, pos.side_to_move()).unwrap();
            assert_eq!(normalize_promotion(pos, decoded), mv);
        }
    }

    #[test]
    fn all_legal_moves_roundtrip() {
        assert_injective_and_bounded(&Position::new());

        // Promotion-rich: the b7 pawn can push or capture on a8/c8, with all
        // four promotion pieces each.
        let board = Board::from_str("r1b5/1P6/8/8/8/8/8/4K2k w - - 0 1").unwrap();
        assert_injective_and_bounded(&Position::from_board(board));

        // Same for Black, one ply into a game.
        let mut pos = Position::new();
        pos.push(ChessMove::new(sq(4, 1), sq(4, 3), None));
        assert_injective_and_bounded(&pos);
    }

    #[test]
    fn start_position_mask_has_twenty_moves() {
        let mask = legal_move_mask(&Position::new());
        assert_eq!(mask.dim(), (8, 8, PLANES_NUM));
        assert_eq!(mask.sum(), 20.0);
    }
}
