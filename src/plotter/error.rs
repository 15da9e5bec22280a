use std::io;

use thiserror::Error;

/// Problems with a single pen-definition record. Line numbers are 1-based.
#[derive(Debug, Error)]
pub enum PenParseError {
    #[error("line {line}: expected 3 fields separated by ' | ', found {found}")]
    MissingFields { line: usize, found: usize },
    #[error("line {line}: '{value}' is not a #RRGGBB colour")]
    InvalidHex { line: usize, value: String },
    #[error("line {line}: home position '{value}' must be three numbers")]
    InvalidHome { line: usize, value: String },
    #[error("failed to read pen definitions: {0}")]
    Io(#[from] io::Error),
}

impl PenParseError {
    pub(crate) fn home(line: usize, value: &str) -> Self {
        PenParseError::InvalidHome {
            line,
            value: value.to_string(),
        }
    }
}
