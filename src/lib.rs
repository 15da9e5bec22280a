//! ArmyOfEvilRobots dabbing toolpath generator
//!
//! Turns a raster image into a G-code program for a multi-pen plotter that
//! paints by dabbing: every pen stands for one colour, and the machine visits
//! every pixel of that colour, lowering and lifting the pen at each one.
//!
//! The pipeline runs once per image, strictly front to back:
//! resize/letterbox -> palette quantization (optionally dithered) ->
//! per-pen pixel recording -> nearest-neighbour ordering -> mapping to machine
//! coordinates -> G-code post-processing.
//!
//! ```no_run
//! use aoer_dabber_rs::prelude::*;
//! use std::path::Path;
//!
//! let config = PipelineConfig::new().with_dithering(false);
//! convert_file(
//!     Path::new("mona_lisa.jpg"),
//!     Path::new("pens.txt"),
//!     Path::new("mona_lisa.gcode"),
//!     &config,
//! )
//! .unwrap();
//! ```

/// Error types surfaced by a conversion run.
pub mod errors;

/// Pipeline configuration, loadable from RON files.
pub mod config;

/// Pen definitions, per-run pen plans and the pixel -> machine mapping.
pub mod plotter;

/// Resize, quantize and record stages.
pub mod raster;

/// Dab ordering.
pub mod optimizer;

/// G-code post-processing.
pub mod gcode;

/// Pipeline entry points: plan an image, render it, or convert files.
pub mod pipeline;

/// Make your life easy! Just import prelude::* and go.
pub mod prelude {
    pub use crate::config::PipelineConfig;
    pub use crate::errors::PipelineError;
    pub use crate::gcode::{DabHeights, DabPostMachines};
    pub use crate::optimizer::{OptimizationStrategy, Optimizer};
    pub use crate::pipeline::{convert_file, image_to_gcode, plan, DabRun};
    pub use crate::plotter::{Pen, PenPlan, PenRegistry};
    pub use crate::raster::{Interpolation, ResizeMode, Resolution};
}
