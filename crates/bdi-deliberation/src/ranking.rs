//! Path-cost ranking of candidate desires.
//!
//! Both rankers route over the belief graph with every excluded tile
//! blocked, drop unreachable candidates, and sort with a stable sort so
//! equal costs keep candidate (tile) order.  The result is a deterministic
//! function of the graph snapshot.

use bdi_core::{Position, TileId};
use bdi_graph::{BeliefGraph, ParcelBelief, Router};

use crate::Candidates;

const UNREACHABLE: u32 = u32::MAX;

/// One way to score a parcel: fetch it, then walk to `delivery`.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryOption {
    pub parcel:   ParcelBelief,
    pub delivery: Position,
    /// Moves self → parcel plus moves parcel → delivery.
    pub steps:    u32,
}

/// A reachable tile to explore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExploreOption {
    pub target: Position,
    /// Moves self → target.
    pub steps:  u32,
}

/// Every reachable (parcel, delivery tile) pair, cheapest first.
pub fn rank_delivery_options<R: Router + ?Sized>(
    graph:      &BeliefGraph,
    router:     &R,
    candidates: &Candidates,
) -> Vec<DeliveryOption> {
    let Some(me) = graph.my_tile() else { return Vec::new() };
    let map  = graph.tiles();
    let pass = graph.passability();
    let approach = router.distances(map, me, &pass);

    let per_tile = |&tile: &TileId| -> Vec<DeliveryOption> {
        let to_parcel = approach[tile.index()];
        if to_parcel == UNREACHABLE {
            return Vec::new();
        }
        let onward = router.distances(map, tile, &pass);
        let mut out = Vec::new();
        for parcel in graph.parcels_at(tile) {
            for &delivery in &candidates.delivery_tiles {
                let leg = onward[delivery.index()];
                if leg == UNREACHABLE {
                    continue;
                }
                out.push(DeliveryOption {
                    parcel:   parcel.clone(),
                    delivery: map.position(delivery),
                    steps:    to_parcel + leg,
                });
            }
        }
        out
    };

    #[cfg(not(feature = "parallel"))]
    let nested: Vec<Vec<DeliveryOption>> = candidates.parcel_tiles.iter().map(per_tile).collect();

    #[cfg(feature = "parallel")]
    let nested: Vec<Vec<DeliveryOption>> = {
        use rayon::prelude::*;
        candidates.parcel_tiles.par_iter().map(per_tile).collect()
    };

    let mut options: Vec<DeliveryOption> = nested.into_iter().flatten().collect();
    options.sort_by_key(|o| o.steps);
    options
}

/// Every reachable explore target, farthest first.
pub fn rank_explore_options<R: Router + ?Sized>(
    graph:      &BeliefGraph,
    router:     &R,
    candidates: &Candidates,
) -> Vec<ExploreOption> {
    let Some(me) = graph.my_tile() else { return Vec::new() };
    let map  = graph.tiles();
    let dist = router.distances(map, me, &graph.passability());

    let mut options: Vec<ExploreOption> = candidates
        .explore_tiles
        .iter()
        .filter(|t| dist[t.index()] != UNREACHABLE)
        .map(|&t| ExploreOption { target: map.position(t), steps: dist[t.index()] })
        .collect();
    options.sort_by(|a, b| b.steps.cmp(&a.steps));
    options
}
