use thiserror::Error;

use super::level::LevelSize;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LevelError {
    #[error("No level data available for size {size}: {reason}")]
    Source { size: LevelSize, reason: String },
    #[error("Malformed level text: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, LevelError>;
