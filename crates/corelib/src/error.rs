//! Core shared errors (renderer-agnostic).

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransformError {
    #[error("rotation axis has zero length")]
    ZeroLengthAxis,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ColorError {
    #[error("color must start with '#'")]
    MissingHash,
    #[error("expected 3, 4, 6 or 8 hex digits, found {0}")]
    BadLength(usize),
    #[error("invalid hex digits '{0}'")]
    BadDigit(String),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("transform error: {0}")]
    Transform(#[from] TransformError),
    #[error("color error: {0}")]
    Color(#[from] ColorError),
}

pub type CoreResult<T> = Result<T, CoreError>;
