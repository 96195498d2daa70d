//! Workspace base error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` where a
//! core conversion can fail.

use thiserror::Error;

/// The top-level error type for `bdi-core`.
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("unknown direction: {0}")]
    UnknownDirection(String),

    #[error("coordinate out of range: {0}")]
    CoordinateOutOfRange(f64),
}

/// Shorthand result type for `bdi-core`.
pub type CoreResult<T> = Result<T, CoreError>;
