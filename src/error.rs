//! Service-level errors.

use std::fmt;

use thiserror::Error;

use crate::ooxml::OoxmlError;
use crate::render::ValidationError;
use crate::storage::PublishError;

/// Rendering phase a deadline can expire in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    FetchingImages,
    Composing,
    Publishing,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FetchingImages => "fetching images",
            Self::Composing => "composing slides",
            Self::Publishing => "publishing",
        })
    }
}

/// Failure of a whole rendering request.
#[derive(Debug, Error)]
pub enum DeckError {
    /// Shown to the client verbatim.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("publish failed: {0}")]
    Publish(#[from] PublishError),

    #[error("timed out while {phase}")]
    Timeout { phase: Phase },

    #[error("package error: {0}")]
    Package(#[from] OoxmlError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for DeckError {
    fn from(e: std::io::Error) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<tokio::task::JoinError> for DeckError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Internal(format!("render task failed: {e}"))
    }
}

pub type Result<T, E = DeckError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = DeckError::Timeout {
            phase: Phase::FetchingImages,
        };
        assert_eq!(err.to_string(), "timed out while fetching images");

        let err: DeckError = ValidationError::new("Title is required").into();
        assert_eq!(err.to_string(), "Title is required");
    }
}
