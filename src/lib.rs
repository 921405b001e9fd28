//! A chess reinforcement-learning environment with AlphaZero-style
//! fixed-shape tensors: (8, 8, 119) observations, (8, 8, 73) actions.

pub mod codec;
pub mod encoder;
pub mod env;
pub mod position;
pub mod render;
pub mod repetition;
pub mod util;
