//! Image-side stages: fitting the source into the output grid, reducing it to
//! the pen palette, and sorting the surviving pixels by pen.
use serde::{Deserialize, Serialize};

pub mod resize;
pub use resize::{resize_filter, Interpolation, ResizeMode, UnknownResizeMode};

pub mod quantize;
pub use quantize::Quantizer;

pub mod record;
pub use record::record;

/// Output grid size, rows first like the pixel grid itself.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub rows: u32,
    pub cols: u32,
}

impl Resolution {
    pub fn new(rows: u32, cols: u32) -> Resolution {
        Resolution { rows, cols }
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Resolution::new(50, 50)
    }
}
