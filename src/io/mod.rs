//! Plain-text mesh interchange.

pub mod off;

/// Failures while reading or writing mesh files.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("std::io::Error: {0}")]
    StdIo(#[from] std::io::Error),
    #[error("Could not parse float: {0}")]
    ParseFloat(#[from] std::num::ParseFloatError),
    #[error("Could not parse index: {0}")]
    ParseInt(#[from] std::num::ParseIntError),
    #[error("Input is malformed: {0}")]
    MalformedInput(String),
}
