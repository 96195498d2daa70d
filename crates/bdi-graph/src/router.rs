//! Routing trait and default Dijkstra implementation.
//!
//! # Pluggability
//!
//! Deliberation and planning call routing through the [`Router`] trait, so
//! alternative search strategies can be swapped in without touching either.
//! The default [`DijkstraRouter`] treats every move as unit cost.
//!
//! # Blocked tiles
//!
//! Routing never mutates the graph.  Tiles that must be avoided (occupied by
//! another agent, or reserved by a peer) are passed in as a [`Passability`]
//! mask; a route never enters a blocked tile, and a blocked source or target
//! has no route at all.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use bdi_core::{Direction, EdgeId, Position, TileId};

use crate::tiles::TileMap;
use crate::{GraphError, GraphResult};

// ── Passability ───────────────────────────────────────────────────────────────

/// Per-tile "may not enter" mask, indexed by `TileId`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Passability {
    blocked: Vec<bool>,
}

impl Passability {
    /// Every tile passable.
    pub fn open(map: &TileMap) -> Self {
        Self { blocked: vec![false; map.tile_count()] }
    }

    pub fn block(&mut self, tile: TileId) {
        self.blocked[tile.index()] = true;
    }

    #[inline]
    pub fn is_blocked(&self, tile: TileId) -> bool {
        self.blocked[tile.index()]
    }

    pub fn blocked_count(&self) -> usize {
        self.blocked.iter().filter(|&&b| b).count()
    }
}

// ── Route ─────────────────────────────────────────────────────────────────────

/// An ordered list of edges from source to destination.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Route {
    pub edges: Vec<EdgeId>,
}

impl Route {
    /// Number of moves.
    pub fn steps(&self) -> usize {
        self.edges.len()
    }

    /// `true` if the source and destination are the same tile.
    pub fn is_trivial(&self) -> bool {
        self.edges.is_empty()
    }

    /// The move sequence that walks this route.
    pub fn directions(&self, map: &TileMap) -> Vec<Direction> {
        self.edges.iter().map(|e| map.edge_dir[e.index()]).collect()
    }

    /// Every tile visited after the source, in order.
    pub fn positions(&self, map: &TileMap) -> Vec<Position> {
        self.edges
            .iter()
            .map(|e| map.position(map.edge_to[e.index()]))
            .collect()
    }
}

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable shortest-path engine over a [`TileMap`].
///
/// Implementations must be `Send + Sync` so a single router can be shared
/// across worker threads when ranking runs in parallel.
pub trait Router: Send + Sync {
    /// Shortest route from `from` to `to` avoiding blocked tiles.
    ///
    /// `from == to` on a passable tile is an empty route, not an error.
    fn route(
        &self,
        map: &TileMap,
        from: TileId,
        to: TileId,
        passability: &Passability,
    ) -> GraphResult<Route>;

    /// Step counts from `from` to every tile; `u32::MAX` marks unreachable.
    fn distances(&self, map: &TileMap, from: TileId, passability: &Passability) -> Vec<u32>;
}

// ── DijkstraRouter ────────────────────────────────────────────────────────────

/// Dijkstra's algorithm over the CSR grid with unit edge costs.
///
/// Ties are broken by `TileId` through the heap key and by edge order
/// (`Direction::ALL`) through strict-improvement relaxation, so the same
/// query always yields the same route.
#[derive(Copy, Clone, Debug, Default)]
pub struct DijkstraRouter;

impl Router for DijkstraRouter {
    fn route(
        &self,
        map: &TileMap,
        from: TileId,
        to: TileId,
        passability: &Passability,
    ) -> GraphResult<Route> {
        dijkstra(map, from, to, passability)
    }

    fn distances(&self, map: &TileMap, from: TileId, passability: &Passability) -> Vec<u32> {
        let (dist, _) = search(map, from, None, passability);
        dist
    }
}

// ── Dijkstra internals ────────────────────────────────────────────────────────

const STEP_COST: u32 = 1;

fn no_route(map: &TileMap, from: TileId, to: TileId) -> GraphError {
    GraphError::NoRoute { from: map.position(from), to: map.position(to) }
}

fn dijkstra(
    map: &TileMap,
    from: TileId,
    to: TileId,
    passability: &Passability,
) -> GraphResult<Route> {
    if passability.is_blocked(from) || passability.is_blocked(to) {
        return Err(no_route(map, from, to));
    }
    if from == to {
        return Ok(Route::default());
    }

    let (dist, prev_edge) = search(map, from, Some(to), passability);
    if dist[to.index()] == u32::MAX {
        return Err(no_route(map, from, to));
    }
    Ok(reconstruct(map, &prev_edge, to))
}

/// Run Dijkstra from `from`, stopping early once `target` is settled.
/// Returns `(dist, prev_edge)`.
fn search(
    map: &TileMap,
    from: TileId,
    target: Option<TileId>,
    passability: &Passability,
) -> (Vec<u32>, Vec<EdgeId>) {
    let n = map.tile_count();
    let mut dist      = vec![u32::MAX; n];
    let mut prev_edge = vec![EdgeId::INVALID; n];

    if passability.is_blocked(from) {
        return (dist, prev_edge);
    }
    dist[from.index()] = 0;

    // Min-heap: (cost, tile).  Secondary key TileId keeps tie-breaking deterministic.
    let mut heap: BinaryHeap<Reverse<(u32, TileId)>> = BinaryHeap::new();
    heap.push(Reverse((0, from)));

    while let Some(Reverse((cost, tile))) = heap.pop() {
        if Some(tile) == target {
            break;
        }
        // Skip stale heap entries.
        if cost > dist[tile.index()] {
            continue;
        }

        for edge in map.out_edges(tile) {
            let neighbor = map.edge_to[edge.index()];
            if passability.is_blocked(neighbor) {
                continue;
            }
            let new_cost = cost.saturating_add(STEP_COST);
            if new_cost < dist[neighbor.index()] {
                dist[neighbor.index()]      = new_cost;
                prev_edge[neighbor.index()] = edge;
                heap.push(Reverse((new_cost, neighbor)));
            }
        }
    }

    (dist, prev_edge)
}

fn reconstruct(map: &TileMap, prev_edge: &[EdgeId], to: TileId) -> Route {
    let mut edges = Vec::new();
    let mut cur = to;
    loop {
        let e = prev_edge[cur.index()];
        if e == EdgeId::INVALID {
            break;
        }
        edges.push(e);
        cur = map.edge_from[e.index()];
    }
    edges.reverse();
    Route { edges }
}
