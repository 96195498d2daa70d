//! Desire generation: which parcels, delivery tiles, and explore targets are
//! eligible this cycle.

use bdi_core::TileId;
use bdi_graph::{BeliefGraph, TileKind};

/// Eligible candidates, each list in tile order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidates {
    /// Tiles holding at least one parcel.
    pub parcel_tiles:   Vec<TileId>,
    pub delivery_tiles: Vec<TileId>,
    /// Every eligible tile other than the one self stands on.
    pub explore_tiles:  Vec<TileId>,
}

impl Candidates {
    /// Collect candidates, skipping tiles another agent stands on and tiles
    /// reserved by the peer.
    pub fn collect(graph: &BeliefGraph) -> Self {
        let tiles = graph.tiles();
        let mine  = graph.my_tile();
        let mut out = Candidates::default();

        for tile in tiles.tiles() {
            if graph.is_excluded(tile) {
                continue;
            }
            if !graph.parcels_at(tile).is_empty() {
                out.parcel_tiles.push(tile);
            }
            if tiles.kind(tile) == TileKind::Delivery {
                out.delivery_tiles.push(tile);
            }
            if Some(tile) != mine {
                out.explore_tiles.push(tile);
            }
        }
        out
    }
}
