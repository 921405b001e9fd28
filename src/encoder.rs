//! Observation feature planes and the sliding history window.
//!
//! Each timestep contributes 14 binary planes: 6 friendly piece types, 6
//! enemy piece types (friendly = side to move) and 2 broadcast repetition
//! planes. The observation keeps the last `HISTORY_LEN` timesteps plus 7
//! broadcast scalar planes describing only the current position.

use chess::{Color, Piece, ALL_SQUARES};
use ndarray::{s, Array3};

use crate::position::Position;
use crate::repetition::is_repetition;

pub const HISTORY_LEN: usize = 8;
pub const BINARY_PLANES: usize = 14;
pub const CONST_PLANES: usize = 7;
pub const OBSERVATION_PLANES: usize = BINARY_PLANES * HISTORY_LEN + CONST_PLANES;

fn piece_index(piece: Piece) -> usize {
    match piece {
        Piece::Pawn => 0,
        Piece::Knight => 1,
        Piece::Bishop => 2,
        Piece::Rook => 3,
        Piece::Queen => 4,
        Piece::King => 5,
    }
}

/// Feature planes of a single timestep: the 14 binary planes and the 7
/// scalar planes, each of shape (8, 8, n).
///
/// The repetition planes answer "has this position already occurred twice /
/// three times in total", broadcast over the whole board. Replaying history
/// for them mutates the position's stack transiently, hence `&mut`.
pub fn encode_planes(pos: &mut Position) -> (Array3<f32>, Array3<f32>) {
    let mut binary = Array3::zeros((8, 8, BINARY_PLANES));
    let friendly = pos.side_to_move();

    for sq in ALL_SQUARES {
        if let Some(piece) = pos.board().piece_on(sq) {
            let (row, col) = (sq.to_index() / 8, sq.to_index() % 8);
            let offset = if pos.board().color_on(sq) == Some(friendly) {
                0
            } else {
                6
            };
            binary[[row, col, offset + piece_index(piece)]] = 1.0;
        }
    }

    if is_repetition(pos, 2) {
        binary.slice_mut(s![.., .., 12]).fill(1.0);
    }
    if is_repetition(pos, 3) {
        binary.slice_mut(s![.., .., 13]).fill(1.0);
    }

    let ours = pos.castling_rights(friendly);
    let theirs = pos.castling_rights(!friendly);
    let as_f32 = |b: bool| if b { 1.0 } else { 0.0 };
    let scalars = [
        match friendly {
            Color::White => 0.0,
            Color::Black => 1.0,
        },
        pos.fullmove_number() as f32,
        as_f32(ours.has_kingside()),
        as_f32(ours.has_queenside()),
        as_f32(theirs.has_kingside()),
        as_f32(theirs.has_queenside()),
        pos.halfmove_clock() as f32,
    ];

    let mut consts = Array3::zeros((8, 8, CONST_PLANES));
    for (plane, value) in scalars.into_iter().enumerate() {
        consts.slice_mut(s![.., .., plane]).fill(value);
    }

    (binary, consts)
}

/// Fixed-width sliding window over the last `HISTORY_LEN` timesteps.
///
/// Layout: `HISTORY_LEN` groups of 14 binary planes, oldest first, followed
/// by the 7 scalar planes of the newest timestep only.
pub struct StateHistory {
    planes: Array3<f32>,
}

impl Default for StateHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl StateHistory {
    /// All zeros: the observation of "no history", used before game start.
    pub fn new() -> Self {
        Self {
            planes: Array3::zeros((8, 8, OBSERVATION_PLANES)),
        }
    }

    pub fn reset(&mut self) {
        self.planes.fill(0.0);
    }

    /// Drops the oldest binary group and the previous scalar planes, appends
    /// the new timestep at the back.
    pub fn push(&mut self, binary: &Array3<f32>, consts: &Array3<f32>) {
        assert_eq!(binary.dim(), (8, 8, BINARY_PLANES));
        assert_eq!(consts.dim(), (8, 8, CONST_PLANES));

        let kept = self
            .planes
            .slice(s![.., .., BINARY_PLANES..BINARY_PLANES * HISTORY_LEN])
            .to_owned();
        self.planes
            .slice_mut(s![.., .., ..BINARY_PLANES * (HISTORY_LEN - 1)])
            .assign(&kept);
        self.planes
            .slice_mut(s![
                .., ..,
                BINARY_PLANES * (HISTORY_LEN - 1)..BINARY_PLANES * HISTORY_LEN
            ])
            .assign(binary);
        self.planes
            .slice_mut(s![.., .., BINARY_PLANES * HISTORY_LEN..])
            .assign(consts);

        debug_assert_eq!(self.planes.dim(), (8, 8, OBSERVATION_PLANES));
    }

    pub fn observation(&self) -> Array3<f32> {
        self.planes.clone()
    }
}
