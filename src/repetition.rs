//! Repeated-position detection over a position's move stack.
//!
//! Checking is two-phase because full position equality is expensive: a
//! cheap occupancy scan can rule a repetition out, and only when it cannot
//! is the game replayed backwards under transposition keys.

use chess::ChessMove;

use crate::position::Position;

/// Undo log for the replay phase. Every move taken back through the yard is
/// replayed on drop, so the position's stack is bit-identical on every exit
/// path, early breaks and panics included.
struct Switchyard<'a> {
    pos: &'a mut Position,
    undone: Vec<ChessMove>,
}

impl<'a> Switchyard<'a> {
    fn new(pos: &'a mut Position) -> Self {
        Self {
            pos,
            undone: Vec::new(),
        }
    }

    fn take_back(&mut self) -> Option<ChessMove> {
        let mv = self.pos.pop()?;
        self.undone.push(mv);
        Some(mv)
    }

    fn stack_len(&self) -> usize {
        self.pos.stack().len()
    }

    fn transposition_key(&self) -> u64 {
        self.pos.transposition_key()
    }

    /// Judged from the current (already rewound) position, i.e. the position
    /// `mv` was originally played from.
    fn is_irreversible(&self, mv: ChessMove) -> bool {
        self.pos.is_irreversible(mv)
    }
}

impl Drop for Switchyard<'_> {
    fn drop(&mut self) {
        while let Some(mv) = self.undone.pop() {
            self.pos.push(mv);
        }
    }
}

/// Whether the current position has occurred at least `count` times in total
/// (counting itself), under full transposition equality: piece placement,
/// side to move, castling rights and en passant.
///
/// Never errors; too little history simply yields `false`. The replay stops
/// at the first irreversible move, since no position behind such a move can
/// transpose to the current one.
pub fn is_repetition(pos: &mut Position, count: usize) -> bool {
    // Fast check, occupancy only. Equal occupancy is necessary but not
    // sufficient, so this phase can only reject.
    let occupied = pos.occupancy();
    let mut maybe_repetitions = 1;
    for entry in pos.stack().iter().rev() {
        if entry.occupancy() == occupied {
            maybe_repetitions += 1;
            if maybe_repetitions >= count {
                break;
            }
        }
    }
    if maybe_repetitions < count {
        return false;
    }

    // Full replay.
    let key = pos.transposition_key();
    let mut remaining = count;
    let mut yard = Switchyard::new(pos);
    loop {
        if remaining <= 1 {
            return true;
        }
        if yard.stack_len() < remaining - 1 {
            break;
        }
        let mv = match yard.take_back() {
            Some(mv) => mv,
            None => break,
        };
        if yard.is_irreversible(mv) {
            break;
        }
        if yard.transposition_key() == key {
            remaining -= 1;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::{File, Rank, Square};

    fn mv(from: (usize, usize), to: (usize, usize)) -> ChessMove {
        let sq = |(file, rank): (usize, usize)| {
            Square::make_square(Rank::from_index(rank), File::from_index(file))
        };
        ChessMove::new(sq(from), sq(to), None)
    }

    /// Ng1-f3, Ng8-f6, knights back. Each full shuffle revisits the start
    /// position once.
    fn knight_shuffle(pos: &mut Position) {
        pos.push(mv((6, 0), (5, 2)));
        pos.push(mv((6, 7), (5, 5)));
        pos.push(mv((5, 2), (6, 0)));
        pos.push(mv((5, 5), (6, 7)));
    }

    #[test]
    fn fresh_position_is_no_repetition() {
        let mut pos = Position::new();
        assert!(is_repetition(&mut pos, 1));
        assert!(!is_repetition(&mut pos, 2));
        assert!(!is_repetition(&mut pos, 3));
    }

    #[test]
    fn counts_knight_shuffles() {
        let mut pos = Position::new();

        knight_shuffle(&mut pos);
        assert!(is_repetition(&mut pos, 2));
        assert!(!is_repetition(&mut pos, 3));

        knight_shuffle(&mut pos);
        assert!(is_repetition(&mut pos, 3));
        assert!(!is_repetition(&mut pos, 4));

        knight_shuffle(&mut pos);
        assert!(is_repetition(&mut pos, 4));
    }

    #[test]
    fn stack_restored_bit_identically() {
        let mut pos = Position::new();
        knight_shuffle(&mut pos);
        knight_shuffle(&mut pos);

        let before = pos.clone();
        assert!(is_repetition(&mut pos, 3));
        assert!(pos == before);
        assert!(!is_repetition(&mut pos, 4));
        assert!(pos == before);
    }

    #[test]
    fn pawn_move_starts_a_fresh_repetition_count() {
        let mut pos = Position::new();
        knight_shuffle(&mut pos);
        // A pawn push leaves a position that has only occurred once.
        pos.push(mv((4, 1), (4, 3)));
        assert!(!is_repetition(&mut pos, 2));

        // Shuffles on either side of the pawn moves never combine.
        pos.push(mv((4, 6), (4, 4)));
        knight_shuffle(&mut pos);
        assert!(is_repetition(&mut pos, 2));
        assert!(!is_repetition(&mut pos, 3));
    }

    #[test]
    fn irreversible_move_cuts_the_replay() {
        use chess::Board;
        use std::str::FromStr;

        // King shuffle with full castling rights: the final piece placement
        // (and occupancy) equals the initial one, so the fast check passes,
        // but the kings' first moves gave the rights up. The replay must
        // stop at that boundary and reject.
        let board = Board::from_str("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let mut pos = Position::from_board(board);
        let king_shuffle = |pos: &mut Position| {
            pos.push(mv((4, 0), (4, 1)));
            pos.push(mv((4, 7), (4, 6)));
            pos.push(mv((4, 1), (4, 0)));
            pos.push(mv((4, 6), (4, 7)));
        };

        king_shuffle(&mut pos);
        let before = pos.clone();
        assert!(!is_repetition(&mut pos, 2));
        assert!(pos == before);

        // With the rights already gone the same shuffle is reversible.
        king_shuffle(&mut pos);
        assert!(is_repetition(&mut pos, 2));
        assert!(!is_repetition(&mut pos, 3));
    }

    #[test]
    fn side_to_move_distinguishes_positions() {
        use chess::Board;
        use std::str::FromStr;

        // White triangulates: Ke2, ...Ke7, Kd1, ...Ke8, Ke1. The final piece
        // placement equals the initial one, so the occupancy fast-check
        // passes, but the side to move flipped and the replay must reject.
        let board = Board::from_str("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let mut pos = Position::from_board(board);
        pos.push(mv((4, 0), (4, 1)));
        pos.push(mv((4, 7), (4, 6)));
        pos.push(mv((4, 1), (3, 0)));
        pos.push(mv((4, 6), (4, 7)));
        pos.push(mv((3, 0), (4, 0)));

        let before = pos.clone();
        assert!(!is_repetition(&mut pos, 2));
        assert!(pos == before);
    }
}
