use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::GameConfig;

/// Axis-aligned rectangle in arena coordinates (`x`, `y` is the top-left corner).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// Axis along which a ball should bounce off a brick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum BounceAxis {
    Horizontal,
    Vertical,
}

impl Rect {
    #[must_use]
    pub fn center(&self) -> DVec2 {
        DVec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Returns whether a circle of `radius` at `center` touches the rectangle
    /// (tested against the rectangle grown by `radius`).
    #[must_use]
    pub fn overlaps_circle(&self, center: DVec2, radius: f64) -> bool {
        self.x - radius <= center.x
            && center.x <= self.x + self.w + radius
            && self.y - radius <= center.y
            && center.y <= self.y + self.h + radius
    }

    /// Picks the axis with the smallest penetration depth for an overlapping circle.
    ///
    /// Ties go to [`BounceAxis::Vertical`].
    #[must_use]
    pub fn bounce_axis(&self, center: DVec2, radius: f64) -> BounceAxis {
        let pen_x = f64::min(
            center.x - (self.x - radius),
            (self.x + self.w + radius) - center.x,
        );
        let pen_y = f64::min(
            center.y - (self.y - radius),
            (self.y + self.h + radius) - center.y,
        );
        if pen_x < pen_y {
            BounceAxis::Horizontal
        } else {
            BounceAxis::Vertical
        }
    }
}

/// Liveness of every brick in the `rows × cols` grid, plus the grid geometry.
///
/// Bricks are indexed row-major starting at the top-left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrickGrid {
    cols: usize,
    brick_w: f64,
    brick_h: f64,
    padding: f64,
    offset: DVec2,
    alive: Vec<bool>,
    alive_count: usize,
}

impl BrickGrid {
    /// Creates a grid with every brick alive.
    #[must_use]
    pub fn new(config: &GameConfig) -> Self {
        let len = config.brick_count();
        Self {
            cols: config.cols,
            brick_w: config.brick_width,
            brick_h: config.brick_height,
            padding: config.brick_padding,
            offset: DVec2::new(config.offset_x, config.offset_y),
            alive: vec![true; len],
            alive_count: len,
        }
    }

    /// Marks every brick alive again.
    pub fn restore(&mut self) {
        self.alive.fill(true);
        self.alive_count = self.alive.len();
    }

    /// Total number of bricks (alive or not).
    #[must_use]
    pub fn len(&self) -> usize {
        self.alive.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alive.is_empty()
    }

    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.alive_count
    }

    #[must_use]
    pub fn destroyed_count(&self) -> usize {
        self.alive.len() - self.alive_count
    }

    #[must_use]
    pub fn is_cleared(&self) -> bool {
        self.alive_count == 0
    }

    /// Fraction of bricks destroyed, in `[0, 1]`.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn progress(&self) -> f64 {
        self.destroyed_count() as f64 / self.alive.len() as f64
    }

    #[must_use]
    pub fn is_alive(&self, index: usize) -> bool {
        self.alive[index]
    }

    /// Liveness flags in index order.
    #[must_use]
    pub fn liveness(&self) -> &[bool] {
        &self.alive
    }

    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn rect(&self, index: usize) -> Rect {
        let row = index / self.cols;
        let col = index % self.cols;
        Rect {
            x: self.offset.x + col as f64 * (self.brick_w + self.padding),
            y: self.offset.y + row as f64 * (self.brick_h + self.padding),
            w: self.brick_w,
            h: self.brick_h,
        }
    }

    /// Returns the first live brick (in index order) touched by the circle.
    #[must_use]
    pub fn first_overlapping(&self, center: DVec2, radius: f64) -> Option<usize> {
        (0..self.alive.len())
            .filter(|&i| self.alive[i])
            .find(|&i| self.rect(i).overlaps_circle(center, radius))
    }

    /// Destroys a live brick.
    ///
    /// # Panics
    ///
    /// Panics if the brick was already destroyed.
    pub fn destroy(&mut self, index: usize) {
        assert!(self.alive[index], "brick {index} destroyed twice");
        self.alive[index] = false;
        self.alive_count -= 1;
    }
}
