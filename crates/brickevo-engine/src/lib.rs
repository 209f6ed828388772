//! Deterministic brick-breaking simulation.
//!
//! The crate is split into the arena entities ([`core`]), the game rules
//! ([`engine`]) and the seeded random stream every stochastic decision draws
//! from ([`SimRng`]). Given the same [`GameConfig`], seed and action sequence, a
//! [`BreakoutGame`] produces bit-identical states and rewards.

pub use self::{core::*, engine::*, rng::*};

pub mod core;
pub mod engine;
mod rng;
