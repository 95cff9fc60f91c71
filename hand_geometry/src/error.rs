use thiserror::Error;

/// Errors raised when detector output is turned into landmark types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeometryError {
    #[error("expected {expected} landmarks per hand, got {found}")]
    LandmarkCount { expected: usize, found: usize },
}
