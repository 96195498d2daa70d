//! The `Planner` trait — one contract for every planning strategy.

use async_trait::async_trait;

use bdi_deliberation::Intention;
use bdi_graph::BeliefGraph;

use crate::{Plan, PlanningResult};

/// Turns one intention into a plan against the current beliefs.
///
/// Planning is async because a strategy may delegate to a remote service.
/// Implementations read the graph once up front; they never hold on to
/// positions after returning.
#[async_trait]
pub trait Planner: Send + Sync {
    async fn plan(&self, intention: &Intention, graph: &BeliefGraph) -> PlanningResult<Plan>;
}
