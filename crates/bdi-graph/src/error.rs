//! Belief-graph error type.

use thiserror::Error;

use bdi_core::{CoreError, Position};

/// Errors produced by `bdi-graph`.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("no route from {from} to {to}")]
    NoRoute { from: Position, to: Position },

    #[error("no tile at {0}")]
    UnknownTile(Position),

    #[error("unknown tile kind: {0}")]
    UnknownTileKind(String),

    #[error("invalid percept: {0}")]
    Percept(#[from] CoreError),

    #[error("map parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type GraphResult<T> = Result<T, GraphError>;
