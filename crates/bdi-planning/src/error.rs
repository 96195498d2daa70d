use bdi_core::Position;
use bdi_deliberation::IntentionKind;
use bdi_graph::GraphError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanningError {
    #[error("routing failed: {0}")]
    Graph(#[from] GraphError),

    #[error("no shortest path from {from} to {to}")]
    NoPlan { from: Position, to: Position },

    #[error("planner does not handle {0} intentions")]
    Unsupported(IntentionKind),

    #[error("solver error: {0}")]
    Solver(String),

    #[error("goal {to} unreachable: {cause}")]
    Unreachable { to: Position, cause: Box<PlanningError> },

    #[error("cannot interpret solver action {0:?}")]
    UnknownAction(String),

    #[error("solver request failed: {0}")]
    Http(#[from] reqwest::Error),
}

pub type PlanningResult<T> = Result<T, PlanningError>;
