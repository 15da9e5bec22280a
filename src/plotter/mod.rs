//! Pens, and the per-run toolpath each pen ends up with.
use geo_types::Coord;
use nalgebra::Vector3;

pub mod error;
pub use error::*;

pub mod pen;
pub use pen::{Pen, PenRegistry};

pub mod mapper;
pub use mapper::CoordinateMapper;

/// A pixel position on the output grid. `x` is the column, `y` the row.
pub type GridPoint = Coord<i64>;

/// Builds a [`GridPoint`] from (row, col).
pub fn grid_point(row: u32, col: u32) -> GridPoint {
    Coord {
        x: col as i64,
        y: row as i64,
    }
}

/// What one pen has to do during one run.
///
/// The three lists hold the same points in three frames and are index-aligned
/// once [`CoordinateMapper::map`] has run. Plans are built fresh for every
/// image and are never shared between runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PenPlan {
    /// Pixel grid positions, in visiting order after optimization.
    pub pixels: Vec<GridPoint>,
    /// Millimetres relative to the canvas origin.
    pub canvas: Vec<Vector3<f64>>,
    /// Absolute machine coordinates.
    pub machine: Vec<Vector3<f64>>,
}

impl PenPlan {
    pub fn new() -> PenPlan {
        PenPlan::default()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }
}
