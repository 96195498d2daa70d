//! Walkable-tile topology and builder.
//!
//! # Data layout
//!
//! The grid is stored as a directed graph in **Compressed Sparse Row (CSR)**
//! format.  Given a `TileId t`, its outgoing edges occupy the slice:
//!
//! ```text
//! edge_to[ tile_out_start[t] .. tile_out_start[t+1] ]
//! ```
//!
//! Every pair of unit-adjacent walkable tiles is joined by two directed
//! edges, each labelled with the [`Direction`] an agent must move to follow
//! it.  Within a tile's slice, edges appear in [`Direction::ALL`] order, which
//! fixes the tie-break between equally short routes.
//!
//! The topology is built once from the initial map and never changes.

use std::fmt;
use std::str::FromStr;

use bdi_core::{Direction, EdgeId, Position, TileId};

use crate::{GraphError, IndexMap};

// ── TileKind ──────────────────────────────────────────────────────────────────

/// What a walkable tile is good for.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileKind {
    /// Plain walkable tile where parcels may appear.
    #[default]
    Spawn,
    /// Parcels put down here are scored.
    Delivery,
}

impl fmt::Display for TileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileKind::Spawn    => f.write_str("spawn"),
            TileKind::Delivery => f.write_str("delivery"),
        }
    }
}

impl FromStr for TileKind {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, GraphError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spawn" | "walkable" => Ok(TileKind::Spawn),
            "delivery"           => Ok(TileKind::Delivery),
            _                    => Err(GraphError::UnknownTileKind(s.to_owned())),
        }
    }
}

// ── TileMap ───────────────────────────────────────────────────────────────────

/// Directed grid graph in CSR format plus a position index.
///
/// Fields are `pub` for direct indexed access in the router.  Do not
/// construct directly; use [`TileMapBuilder`].
#[derive(Debug, Clone)]
pub struct TileMap {
    // ── Tile data ─────────────────────────────────────────────────────────
    /// Grid position of each tile.  Indexed by `TileId`.
    pub tile_pos: Vec<Position>,

    /// Kind of each tile.  Indexed by `TileId`.
    pub tile_kind: Vec<TileKind>,

    // ── CSR edge adjacency ────────────────────────────────────────────────
    /// CSR row pointer.  Length = `tile_count + 1`.
    pub tile_out_start: Vec<u32>,

    // ── Edge data (indexed by EdgeId) ─────────────────────────────────────
    pub edge_from: Vec<TileId>,
    pub edge_to:   Vec<TileId>,
    /// Move that follows the edge.
    pub edge_dir:  Vec<Direction>,

    index: IndexMap<Position, TileId>,
}

impl TileMap {
    // ── Dimensions ────────────────────────────────────────────────────────

    pub fn tile_count(&self) -> usize {
        self.tile_pos.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tile_pos.is_empty()
    }

    // ── Lookup ────────────────────────────────────────────────────────────

    /// The tile at `pos`, or `None` if `pos` is not walkable.
    #[inline]
    pub fn tile_at(&self, pos: Position) -> Option<TileId> {
        self.index.get(&pos).copied()
    }

    #[inline]
    pub fn position(&self, tile: TileId) -> Position {
        self.tile_pos[tile.index()]
    }

    #[inline]
    pub fn kind(&self, tile: TileId) -> TileKind {
        self.tile_kind[tile.index()]
    }

    /// Iterator over all tile ids in index order.
    pub fn tiles(&self) -> impl Iterator<Item = TileId> + '_ {
        (0..self.tile_count()).map(|i| TileId(i as u32))
    }

    /// Iterator over all delivery tiles in index order.
    pub fn delivery_tiles(&self) -> impl Iterator<Item = TileId> + '_ {
        self.tiles().filter(|&t| self.kind(t) == TileKind::Delivery)
    }

    // ── Traversal ─────────────────────────────────────────────────────────

    /// Iterator over the `EdgeId`s of all outgoing edges from `tile`.
    #[inline]
    pub fn out_edges(&self, tile: TileId) -> impl Iterator<Item = EdgeId> + '_ {
        let start = self.tile_out_start[tile.index()] as usize;
        let end   = self.tile_out_start[tile.index() + 1] as usize;
        (start..end).map(|i| EdgeId(i as u32))
    }

    #[inline]
    pub fn out_degree(&self, tile: TileId) -> usize {
        let start = self.tile_out_start[tile.index()] as usize;
        let end   = self.tile_out_start[tile.index() + 1] as usize;
        end - start
    }

    /// The edge leading from `from` to `to`, if the two tiles are adjacent.
    pub fn edge_between(&self, from: TileId, to: TileId) -> Option<EdgeId> {
        self.out_edges(from).find(|e| self.edge_to[e.index()] == to)
    }
}

// ── TileMapBuilder ────────────────────────────────────────────────────────────

/// Collect walkable tiles, then call [`build`](Self::build) to derive the
/// 4-neighbour adjacency.
///
/// # Example
///
/// ```
/// use bdi_core::Position;
/// use bdi_graph::{TileKind, TileMapBuilder};
///
/// let mut b = TileMapBuilder::new();
/// b.add_tile(Position::new(0, 0), TileKind::Spawn);
/// b.add_tile(Position::new(1, 0), TileKind::Delivery);
/// let map = b.build();
/// assert_eq!(map.tile_count(), 2);
/// assert_eq!(map.edge_count(), 2); // one edge each way
/// ```
#[derive(Default)]
pub struct TileMapBuilder {
    tiles: Vec<(Position, TileKind)>,
    index: IndexMap<Position, TileId>,
}

impl TileMapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(tiles: usize) -> Self {
        Self {
            tiles: Vec::with_capacity(tiles),
            index: IndexMap::default(),
        }
    }

    /// Add a walkable tile.  Adding the same position twice keeps the first
    /// id and overwrites the kind.
    pub fn add_tile(&mut self, pos: Position, kind: TileKind) -> TileId {
        if let Some(&id) = self.index.get(&pos) {
            self.tiles[id.index()].1 = kind;
            return id;
        }
        let id = TileId(self.tiles.len() as u32);
        self.tiles.push((pos, kind));
        self.index.insert(pos, id);
        id
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Consume the builder and produce the CSR graph.
    pub fn build(self) -> TileMap {
        let n = self.tiles.len();
        let mut tile_out_start = Vec::with_capacity(n + 1);
        let mut edge_from      = Vec::with_capacity(n * 4);
        let mut edge_to        = Vec::with_capacity(n * 4);
        let mut edge_dir       = Vec::with_capacity(n * 4);

        // Tiles are visited in id order, so edges come out sorted by source.
        for (i, &(pos, _)) in self.tiles.iter().enumerate() {
            tile_out_start.push(edge_to.len() as u32);
            for dir in Direction::ALL {
                if let Some(&to) = self.index.get(&pos.step(dir)) {
                    edge_from.push(TileId(i as u32));
                    edge_to.push(to);
                    edge_dir.push(dir);
                }
            }
        }
        tile_out_start.push(edge_to.len() as u32);

        let (tile_pos, tile_kind) = self.tiles.into_iter().unzip();
        TileMap {
            tile_pos,
            tile_kind,
            tile_out_start,
            edge_from,
            edge_to,
            edge_dir,
            index: self.index,
        }
    }
}
