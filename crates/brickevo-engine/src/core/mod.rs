//! Entities living in the arena: balls, the brick grid and power-up capsules.

pub use self::{ball::*, brick_grid::*, power_up::*};

pub(crate) mod ball;
pub(crate) mod brick_grid;
pub(crate) mod power_up;
