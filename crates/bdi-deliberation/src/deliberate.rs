//! Greedy intention selection.

use tracing::debug;

use bdi_graph::{BeliefGraph, Router};

use crate::{rank_delivery_options, rank_explore_options, Candidates, Intention};

/// Pick the next intention.
///
/// The cheapest reachable delivery wins.  Failing that, the farthest
/// reachable tile is explored.  With neither available the agent stays.
pub fn deliberate<R: Router + ?Sized>(graph: &BeliefGraph, router: &R) -> Intention {
    let candidates = Candidates::collect(graph);

    if let Some(best) = rank_delivery_options(graph, router, &candidates).into_iter().next() {
        debug!(parcel = %best.parcel.id, delivery = %best.delivery, steps = best.steps, "delivery selected");
        return Intention::Deliver { parcel: best.parcel, destination: best.delivery };
    }

    if let Some(far) = rank_explore_options(graph, router, &candidates).into_iter().next() {
        debug!(target = %far.target, steps = far.steps, "exploring");
        return Intention::GoTo(far.target);
    }

    Intention::Stay
}
