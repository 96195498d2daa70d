//! Shortest-path planner over the belief graph.

use async_trait::async_trait;

use bdi_core::{Position, TileId};
use bdi_deliberation::Intention;
use bdi_graph::{BeliefGraph, DijkstraRouter, GraphError, Passability, Router};

use crate::{Action, Plan, Planner, PlanningResult};

/// Plans with a [`Router`] over the belief graph, avoiding tiles occupied by
/// other agents and tiles reserved by the peer.
///
/// # Type parameter
///
/// `R` defaults to [`DijkstraRouter`]; swap it at compile time for a
/// different search with no runtime overhead.
#[derive(Debug, Clone, Default)]
pub struct LocalPlanner<R: Router = DijkstraRouter> {
    pub router: R,
}

impl LocalPlanner {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: Router> LocalPlanner<R> {
    pub fn with_router(router: R) -> Self {
        Self { router }
    }

    /// Synchronous form of [`Planner::plan`].
    pub fn plan_now(&self, intention: &Intention, graph: &BeliefGraph) -> PlanningResult<Plan> {
        let pass = graph.passability();

        match intention {
            Intention::Stay => Ok(Plan::empty()),

            Intention::GoTo(destination) => {
                let me = my_tile(graph)?;
                let to = tile_at(graph, *destination)?;
                Ok(Plan::new(self.moves(graph, me, to, &pass)?))
            }

            Intention::Deliver { parcel, destination } => {
                let me = my_tile(graph)?;
                // Re-read the parcel: it may have moved since deliberation.
                let current = graph.parcel(&parcel.id).unwrap_or(parcel);
                let at = tile_at(graph, current.position)?;
                let to = tile_at(graph, *destination)?;

                let mut actions = self.moves(graph, me, at, &pass)?;
                if !current.is_carried_by(&graph.me().id) {
                    actions.push(Action::PickUp(parcel.id.clone()));
                }
                actions.extend(self.moves(graph, at, to, &pass)?);
                actions.push(Action::PutDown(parcel.id.clone()));
                Ok(Plan::new(actions))
            }
        }
    }

    fn moves(
        &self,
        graph: &BeliefGraph,
        from:  TileId,
        to:    TileId,
        pass:  &Passability,
    ) -> PlanningResult<Vec<Action>> {
        let route = self.router.route(graph.tiles(), from, to, pass)?;
        Ok(route
            .directions(graph.tiles())
            .into_iter()
            .map(Action::Move)
            .collect())
    }
}

#[async_trait]
impl<R: Router> Planner for LocalPlanner<R> {
    async fn plan(&self, intention: &Intention, graph: &BeliefGraph) -> PlanningResult<Plan> {
        self.plan_now(intention, graph)
    }
}

pub(crate) fn my_tile(graph: &BeliefGraph) -> PlanningResult<TileId> {
    tile_at(graph, graph.me().position)
}

pub(crate) fn tile_at(graph: &BeliefGraph, pos: Position) -> PlanningResult<TileId> {
    Ok(graph.tiles().tile_at(pos).ok_or(GraphError::UnknownTile(pos))?)
}
