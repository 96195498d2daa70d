//! Reconsideration — re-evaluating the current intention while a plan runs.

use bdi_graph::{BeliefGraph, Router};

use crate::{deliberate, Intention};

/// Pluggable reconsideration policy.
///
/// Called between executor steps whenever a percept about another agent or
/// a parcel lands.  Returning `Some` proposes a replacement; the caller
/// preempts only if [`should_preempt`] agrees.
pub trait Reconsideration: Send + Sync + 'static {
    fn reconsider(
        &self,
        current: &Intention,
        graph:   &BeliefGraph,
        router:  &dyn Router,
    ) -> Option<Intention>;
}

/// Re-deliberate while idle or exploring; never abandon a delivery.
#[derive(Copy, Clone, Debug, Default)]
pub struct Cautious;

impl Reconsideration for Cautious {
    fn reconsider(&self, current: &Intention, graph: &BeliefGraph, router: &dyn Router) -> Option<Intention> {
        match current {
            Intention::Stay | Intention::GoTo(_) => Some(deliberate(graph, router)),
            Intention::Deliver { .. }            => None,
        }
    }
}

/// Never reconsider.
#[derive(Copy, Clone, Debug, Default)]
pub struct Bold;

impl Reconsideration for Bold {
    fn reconsider(&self, _current: &Intention, _graph: &BeliefGraph, _router: &dyn Router) -> Option<Intention> {
        None
    }
}

/// Preempt only when the proposal is a different kind of goal.
pub fn should_preempt(current: &Intention, proposed: &Intention) -> bool {
    current.kind() != proposed.kind()
}
