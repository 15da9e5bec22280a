use thiserror::Error;

use crate::gcode::PostError;
use crate::plotter::PenParseError;

/// Everything that can abort a conversion run. There are no retries; the first
/// failure is handed back to the caller.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to load pen definitions: {0}")]
    Pens(#[from] PenParseError),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Image has no pixels")]
    EmptyImage,
    #[error("G-code post-processing failed: {0}")]
    Post(#[from] PostError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
}
