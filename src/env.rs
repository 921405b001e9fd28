//! The reset/step/render environment driver.

use chess::{ChessMove, Color};
use itertools::Itertools;
use ndarray::Array3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::codec::{self, ActionCoord, PLANES_NUM};
use crate::encoder::{encode_planes, StateHistory};
use crate::position::{GameResult, Position};
use crate::render::{self, RenderMode};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EnvState {
    Uninitialized,
    Active,
    Terminal,
}

#[derive(Debug, Error)]
pub enum EnvError {
    #[error("step() requires an Active environment, state is {0:?}")]
    InvalidState(EnvState),
    #[error("policy tensor has shape {0:?}, expected (8, 8, 73)")]
    BadPolicyShape((usize, usize, usize)),
    #[error("no legal moves in the current position")]
    NoLegalMoves,
    #[error("action coordinate {0:?} does not decode to a move")]
    BadActionCoord(ActionCoord),
    #[error("decoded move {0} is illegal in the current position")]
    IllegalMove(ChessMove),
}

#[derive(Clone, Copy, Debug)]
pub struct StepInfo {
    pub last_move: ChessMove,
    pub turn: Color,
}

pub struct Step {
    pub observation: Array3<f32>,
    pub reward: f32,
    pub terminal: bool,
    pub info: StepInfo,
}

/// A chess game exposed through fixed-shape tensors: (8, 8, 119)
/// observations in, (8, 8, 73) policies out. Owns its position and history
/// exclusively; one driver per game.
pub struct ChessEnv {
    pos: Position,
    history: StateHistory,
    state: EnvState,
    rng: StdRng,
}

impl Default for ChessEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl ChessEnv {
    pub fn new() -> Self {
        Self::from_seed(rand::thread_rng().gen())
    }

    /// Seeded variant; the seed only drives the degenerate-policy fallback.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            pos: Position::new(),
            history: StateHistory::new(),
            state: EnvState::Uninitialized,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn state(&self) -> EnvState {
        self.state
    }

    pub fn position(&self) -> &Position {
        &self.pos
    }

    /// Starts a new game and returns the initial observation.
    pub fn reset(&mut self) -> Array3<f32> {
        self.pos.reset();
        self.history.reset();
        self.state = EnvState::Active;
        self.observe()
    }

    /// Binary (8, 8, 73) mask of the legal actions, rebuilt on every call.
    pub fn legal_move_mask(&self) -> Array3<f32> {
        codec::legal_move_mask(&self.pos)
    }

    /// Applies the legal action with the greatest policy mass and advances
    /// the observation window.
    pub fn step(&mut self, policy: &Array3<f32>) -> Result<Step, EnvError> {
        if self.state != EnvState::Active {
            return Err(EnvError::InvalidState(self.state));
        }
        if policy.dim() != (8, 8, PLANES_NUM) {
            return Err(EnvError::BadPolicyShape(policy.dim()));
        }

        let coord = self.select_action(policy)?;
        let candidate = codec::decode(coord, self.pos.side_to_move())
            .ok_or(EnvError::BadActionCoord(coord))?;
        let mv = codec::normalize_promotion(&self.pos, candidate);
        if !self.pos.is_legal(mv) {
            return Err(EnvError::IllegalMove(mv));
        }
        self.pos.push(mv);

        let result = self.pos.result(true);
        let reward = match result {
            GameResult::WhiteWins => 1.0,
            GameResult::BlackWins => -1.0,
            GameResult::Ongoing | GameResult::Draw => 0.0,
        };
        let terminal = result != GameResult::Ongoing;
        if terminal {
            self.state = EnvState::Terminal;
        }
        log::debug!("applied {}, result {:?}", mv, result);

        Ok(Step {
            observation: self.observe(),
            reward,
            terminal,
            info: StepInfo {
                last_move: mv,
                turn: self.pos.side_to_move(),
            },
        })
    }

    /// Delegates to the rendering collaborator. `Human` prints the board,
    /// `RgbArray` returns the raster.
    pub fn render(&self, mode: RenderMode) -> Option<Array3<u8>> {
        match mode {
            RenderMode::Human => {
                println!("{}", render::ascii_board(&self.pos));
                None
            }
            RenderMode::RgbArray => Some(render::rgb_array(&self.pos)),
        }
    }

    fn observe(&mut self) -> Array3<f32> {
        let (binary, consts) = encode_planes(&mut self.pos);
        self.history.push(&binary, &consts);
        self.history.observation()
    }

    /// Arg-max of the policy restricted to the legal coordinates (exactly
    /// the nonzero cells of the legality mask), ties broken by the first
    /// coordinate in row-major order.
    ///
    /// When every legal cell carries the same mass the arg-max is
    /// meaningless, so a uniformly random legal coordinate is chosen
    /// instead of the original min-max rescaling, which divides by zero in
    /// that very case.
    fn select_action(&mut self, policy: &Array3<f32>) -> Result<ActionCoord, EnvError> {
        let mut coords = self
            .pos
            .legal_moves()
            .into_iter()
            .map(codec::encode)
            .collect_vec();
        if coords.is_empty() {
            return Err(EnvError::NoLegalMoves);
        }
        coords.sort_unstable_by_key(|c| (c.row, c.col, c.plane));

        let mut best = coords[0];
        let mut best_value = policy[[best.row, best.col, best.plane]];
        let mut all_equal = true;
        for &coord in &coords[1..] {
            let value = policy[[coord.row, coord.col, coord.plane]];
            if value != best_value {
                all_equal = false;
            }
            if value > best_value {
                best = coord;
                best_value = value;
            }
        }

        if all_equal {
            return Ok(coords[self.rng.gen_range(0..coords.len())]);
        }
        Ok(best)
    }
}
