//! Thin wrapper around the `chess` crate's board, adding the move stack with
//! undo and the halfmove/fullmove clocks the crate does not track.

use chess::{BitBoard, Board, BoardStatus, CastleRights, ChessMove, Color, MoveGen, Piece};
use itertools::Itertools;

use crate::repetition::is_repetition;

pub const BOARD_SIZE: usize = 8;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameResult {
    Ongoing,
    Draw,
    WhiteWins,
    BlackWins,
}

/// Everything needed to restore the position after its move is taken back:
/// the pre-move board snapshot and the clocks.
#[derive(Clone, Copy, PartialEq)]
pub struct HistoryEntry {
    board: Board,
    mv: ChessMove,
    halfmove_clock: u32,
    fullmove_number: u32,
}

impl HistoryEntry {
    /// Occupancy of the recorded position, piece-blind.
    pub fn occupancy(&self) -> BitBoard {
        *self.board.combined()
    }

    pub fn chess_move(&self) -> ChessMove {
        self.mv
    }
}

#[derive(Clone, PartialEq)]
pub struct Position {
    board: Board,
    stack: Vec<HistoryEntry>,
    halfmove_clock: u32,
    fullmove_number: u32,
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl Position {
    pub fn new() -> Self {
        Self::from_board(Board::default())
    }

    pub fn from_board(board: Board) -> Self {
        Self {
            board,
            stack: Vec::new(),
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    /// Back to the start position with an empty history.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn stack(&self) -> &[HistoryEntry] {
        &self.stack
    }

    pub fn side_to_move(&self) -> Color {
        self.board.side_to_move()
    }

    /// Squares occupied by either side, ignoring piece identity.
    pub fn occupancy(&self) -> BitBoard {
        *self.board.combined()
    }

    /// Zobrist key over piece placement, side to move, castling rights and
    /// en passant.
    pub fn transposition_key(&self) -> u64 {
        self.board.get_hash()
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    pub fn castling_rights(&self, color: Color) -> CastleRights {
        self.board.castle_rights(color)
    }

    pub fn legal_moves(&self) -> Vec<ChessMove> {
        MoveGen::new_legal(&self.board).collect_vec()
    }

    pub fn is_legal(&self, mv: ChessMove) -> bool {
        self.board.legal(mv)
    }

    /// True if `mv`, played from this position, can never be taken back by a
    /// reversible sequence: pawn moves, captures, moves that give up castling
    /// rights, and any move played while an en-passant capture is available.
    pub fn is_irreversible(&self, mv: ChessMove) -> bool {
        if self.is_pawn_move(mv) || self.is_capture(mv) || self.board.en_passant().is_some() {
            return true;
        }
        let next = self.board.make_move_new(mv);
        self.board.castle_rights(Color::White) != next.castle_rights(Color::White)
            || self.board.castle_rights(Color::Black) != next.castle_rights(Color::Black)
    }

    /// Plays `mv`, recording an undo entry on the history stack.
    pub fn push(&mut self, mv: ChessMove) {
        self.stack.push(HistoryEntry {
            board: self.board,
            mv,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
        });
        if self.is_pawn_move(mv) || self.is_capture(mv) {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        if self.board.side_to_move() == Color::Black {
            self.fullmove_number += 1;
        }
        self.board = self.board.make_move_new(mv);
    }

    /// Takes back the most recent move and returns it so it can be replayed.
    pub fn pop(&mut self) -> Option<ChessMove> {
        let entry = self.stack.pop()?;
        self.board = entry.board;
        self.halfmove_clock = entry.halfmove_clock;
        self.fullmove_number = entry.fullmove_number;
        Some(entry.mv)
    }

    pub fn is_over(&mut self, claim_draw: bool) -> bool {
        self.result(claim_draw) != GameResult::Ongoing
    }

    /// Game result, optionally honoring fifty-move and threefold-repetition
    /// draw claims. Transiently replays history for the repetition claim,
    /// restoring it before returning.
    pub fn result(&mut self, claim_draw: bool) -> GameResult {
        match self.board.status() {
            BoardStatus::Checkmate => match self.board.side_to_move() {
                Color::White => GameResult::BlackWins,
                Color::Black => GameResult::WhiteWins,
            },
            BoardStatus::Stalemate => GameResult::Draw,
            BoardStatus::Ongoing => {
                if claim_draw && (self.halfmove_clock >= 100 || is_repetition(self, 3)) {
                    GameResult::Draw
                } else {
                    GameResult::Ongoing
                }
            }
        }
    }

    fn is_pawn_move(&self, mv: ChessMove) -> bool {
        self.board.piece_on(mv.get_source()) == Some(Piece::Pawn)
    }

    fn is_capture(&self, mv: ChessMove) -> bool {
        // En-passant captures land on an empty square but are pawn moves
        // anyway, so they never slip past the clock reset.
        self.board.piece_on(mv.get_dest()).is_some()
    }
}
