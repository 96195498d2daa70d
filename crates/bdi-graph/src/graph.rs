//! The belief graph: tile topology plus everything the agent believes about
//! what stands on each tile.
//!
//! # Ownership
//!
//! `BeliefGraph` is the single mutable world model.  Every mutation funnels
//! through the methods below; callers get shared references for reading and
//! must re-read after any `await` point, since percepts can land between a
//! decision and the action it leads to.
//!
//! # Indexing
//!
//! Per-tile beliefs live in parallel `Vec`s indexed by `TileId`.  Two side
//! indices map entity ids to the tile currently holding their belief, so
//! moving or refreshing a belief never scans the grid and never leaves a
//! stale copy behind.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use bdi_core::{AgentId, ParcelId, Position, TileId, Timestamp};

use crate::belief::{AgentBelief, ParcelBelief, Provenance};
use crate::percept::{AgentPercept, ParcelPercept};
use crate::router::Passability;
use crate::tiles::TileMap;
use crate::{GraphError, GraphResult, IndexMap};

pub struct BeliefGraph {
    tiles:        TileMap,
    /// At most one agent belief per tile.
    occupants:    Vec<Option<AgentBelief>>,
    parcels:      Vec<Vec<ParcelBelief>>,
    agent_index:  IndexMap<AgentId, TileId>,
    parcel_index: IndexMap<ParcelId, TileId>,
    me:           AgentBelief,
    /// Tiles pledged to the peer.
    reserved:     BTreeSet<Position>,
}

impl BeliefGraph {
    // ── Construction ──────────────────────────────────────────────────────

    /// Build the graph from the initial map and the first self percept.
    pub fn initialize(tiles: TileMap, me: &AgentPercept, now: Timestamp) -> GraphResult<Self> {
        let n = tiles.tile_count();
        let mut graph = Self {
            occupants:    vec![None; n],
            parcels:      vec![Vec::new(); n],
            agent_index:  IndexMap::default(),
            parcel_index: IndexMap::default(),
            me: AgentBelief {
                id:         me.id.clone(),
                name:       me.name.clone(),
                position:   Position::default(),
                score:      me.score,
                updated:    now,
                provenance: Provenance::Observed,
            },
            reserved: BTreeSet::new(),
            tiles,
        };
        graph.apply_agent_percept(me, now)?;
        Ok(graph)
    }

    // ── Read access ───────────────────────────────────────────────────────

    pub fn tiles(&self) -> &TileMap {
        &self.tiles
    }

    /// The self belief.  Never decayed.
    pub fn me(&self) -> &AgentBelief {
        &self.me
    }

    /// Tile under self, if self stands on a walkable tile.
    pub fn my_tile(&self) -> Option<TileId> {
        self.tiles.tile_at(self.me.position)
    }

    pub fn occupant(&self, tile: TileId) -> Option<&AgentBelief> {
        self.occupants[tile.index()].as_ref()
    }

    pub fn parcels_at(&self, tile: TileId) -> &[ParcelBelief] {
        &self.parcels[tile.index()]
    }

    /// Every parcel belief with its tile, in tile order.
    pub fn parcels(&self) -> impl Iterator<Item = (TileId, &ParcelBelief)> + '_ {
        self.parcels
            .iter()
            .enumerate()
            .flat_map(|(i, ps)| ps.iter().map(move |p| (TileId(i as u32), p)))
    }

    pub fn agent(&self, id: &AgentId) -> Option<&AgentBelief> {
        let tile = self.agent_index.get(id)?;
        self.occupants[tile.index()].as_ref()
    }

    pub fn parcel(&self, id: &ParcelId) -> Option<&ParcelBelief> {
        let tile = self.parcel_index.get(id)?;
        self.parcels[tile.index()].iter().find(|p| &p.id == id)
    }

    pub fn agent_count(&self) -> usize {
        self.agent_index.len()
    }

    pub fn parcel_count(&self) -> usize {
        self.parcel_index.len()
    }

    pub fn reserved(&self) -> &BTreeSet<Position> {
        &self.reserved
    }

    pub fn is_reserved(&self, pos: Position) -> bool {
        self.reserved.contains(&pos)
    }

    /// `true` if another agent is believed to stand on `tile`.
    pub fn is_occupied_by_other(&self, tile: TileId) -> bool {
        self.occupants[tile.index()]
            .as_ref()
            .is_some_and(|a| a.id != self.me.id)
    }

    /// `true` if `tile` may not be entered or targeted: occupied by another
    /// agent, or reserved by the peer.
    pub fn is_excluded(&self, tile: TileId) -> bool {
        self.is_occupied_by_other(tile) || self.is_reserved(self.tiles.position(tile))
    }

    /// Positions of every tile another agent is believed to stand on.
    pub fn occupied_positions(&self) -> Vec<Position> {
        self.tiles
            .tiles()
            .filter(|&t| self.is_occupied_by_other(t))
            .map(|t| self.tiles.position(t))
            .collect()
    }

    /// Routing mask with every excluded tile blocked.
    pub fn passability(&self) -> Passability {
        let mut pass = Passability::open(&self.tiles);
        for tile in self.tiles.tiles() {
            if self.is_excluded(tile) {
                pass.block(tile);
            }
        }
        pass
    }

    // ── Percepts ──────────────────────────────────────────────────────────

    fn destination_tile(&self, destination: Position) -> GraphResult<TileId> {
        self.tiles
            .tile_at(destination)
            .ok_or(GraphError::UnknownTile(destination))
    }

    /// Move (or refresh) an agent belief to the percept's destination tile.
    ///
    /// A percept for self also replaces the self belief.  Any other agent
    /// previously believed on the destination is evicted, but self never
    /// is: another agent reported on self's tile is dropped instead.
    /// Nothing is mutated when the percept cannot be resolved to a
    /// walkable tile.
    pub fn apply_agent_percept(&mut self, percept: &AgentPercept, now: Timestamp) -> GraphResult<()> {
        let (source, destination) = percept.position.resolve()?;
        let dest = self.destination_tile(destination)?;

        if percept.id != self.me.id && self.agent_index.get(&self.me.id) == Some(&dest) {
            debug!(agent = %percept.id, at = %destination, "agent reported on own tile, dropped");
            if let Some(prev) = self.agent_index.remove(&percept.id) {
                self.occupants[prev.index()] = None;
            }
            return Ok(());
        }

        let belief = AgentBelief {
            id:         percept.id.clone(),
            name:       percept.name.clone(),
            position:   destination,
            score:      percept.score,
            updated:    now,
            provenance: Provenance::Observed,
        };

        if percept.id == self.me.id {
            self.me = belief.clone();
        }

        if let Some(prev) = self.agent_index.remove(&percept.id) {
            if prev != dest {
                debug!(agent = %percept.id, from = %source, to = %destination, "agent moved");
            }
            self.occupants[prev.index()] = None;
        }
        if let Some(evicted) = self.occupants[dest.index()].replace(belief) {
            self.agent_index.remove(&evicted.id);
        }
        self.agent_index.insert(percept.id.clone(), dest);
        Ok(())
    }

    /// Move (or refresh) a parcel belief to the percept's destination tile.
    pub fn apply_parcel_percept(&mut self, percept: &ParcelPercept, now: Timestamp) -> GraphResult<()> {
        let destination = percept.position.destination()?;
        let dest = self.destination_tile(destination)?;

        let belief = ParcelBelief {
            id:         percept.id.clone(),
            position:   destination,
            reward:     percept.reward,
            carried_by: percept.carried_by.clone(),
            updated:    now,
            provenance: Provenance::Observed,
        };

        if let Some(prev) = self.parcel_index.remove(&percept.id) {
            self.parcels[prev.index()].retain(|p| p.id != percept.id);
        }
        self.parcels[dest.index()].push(belief);
        self.parcel_index.insert(percept.id.clone(), dest);
        Ok(())
    }

    /// Apply a batch of agent percepts, logging and skipping unresolvable ones.
    pub fn apply_agent_percepts(&mut self, percepts: &[AgentPercept], now: Timestamp) {
        for p in percepts {
            if let Err(e) = self.apply_agent_percept(p, now) {
                warn!(agent = %p.id, error = %e, "agent percept ignored");
            }
        }
    }

    pub fn apply_parcel_percepts(&mut self, percepts: &[ParcelPercept], now: Timestamp) {
        for p in percepts {
            if let Err(e) = self.apply_parcel_percept(p, now) {
                warn!(parcel = %p.id, error = %e, "parcel percept ignored");
            }
        }
    }

    // ── Decay ─────────────────────────────────────────────────────────────

    /// Age out parcel rewards.
    ///
    /// Beliefs no older than `max_age_ms` are untouched.  Older ones lose
    /// one reward point per elapsed `max_age_ms` and are restamped `now` as
    /// [`Provenance::Decayed`]; a belief whose reward would drop to zero or
    /// below is removed.
    pub fn decay_parcels(&mut self, max_age_ms: u64, now: Timestamp) {
        let interval = max_age_ms.max(1) as f64;
        let mut dropped = Vec::new();

        for tile_parcels in &mut self.parcels {
            tile_parcels.retain_mut(|p| {
                let age = p.age(now);
                if age <= max_age_ms {
                    return true;
                }
                let reward = p.reward - age as f64 / interval;
                if reward <= 0.0 {
                    dropped.push(p.id.clone());
                    return false;
                }
                p.reward     = reward;
                p.updated    = now;
                p.provenance = Provenance::Decayed;
                true
            });
        }

        for id in dropped {
            debug!(parcel = %id, "parcel decayed away");
            self.parcel_index.remove(&id);
        }
    }

    /// Drop every non-self agent belief at least `max_age_ms` old.
    pub fn decay_agents(&mut self, max_age_ms: u64, now: Timestamp) {
        // Explicit field borrows so the borrow checker sees disjoint access.
        let me = &self.me.id;
        let agent_index = &mut self.agent_index;

        for slot in &mut self.occupants {
            let stale = slot
                .as_ref()
                .is_some_and(|a| &a.id != me && a.age(now) >= max_age_ms);
            if stale {
                if let Some(a) = slot.take() {
                    debug!(agent = %a.id, "agent belief expired");
                    agent_index.remove(&a.id);
                }
            }
        }
    }

    // ── Post-action maintenance ───────────────────────────────────────────

    /// Remove the given parcels from the tile under self.
    pub fn remove_parcels_at_me(&mut self, ids: &[ParcelId]) {
        let Some(tile) = self.my_tile() else { return };
        let parcel_index = &mut self.parcel_index;
        self.parcels[tile.index()].retain(|p| {
            let keep = !ids.contains(&p.id);
            if !keep {
                parcel_index.remove(&p.id);
            }
            keep
        });
    }

    // ── Reservations ──────────────────────────────────────────────────────

    /// Pledge `positions` to the peer.
    ///
    /// # Panics
    ///
    /// If any position is already reserved or repeated in `positions`.  The
    /// check runs before any insertion.
    pub fn reserve(&mut self, positions: &[Position]) {
        for (i, pos) in positions.iter().enumerate() {
            assert!(
                !self.reserved.contains(pos) && !positions[..i].contains(pos),
                "tile {pos} reserved twice",
            );
        }
        self.reserved.extend(positions.iter().copied());
        debug!(tiles = positions.len(), "tiles reserved");
    }

    /// Free `positions`.
    ///
    /// # Panics
    ///
    /// If any reserved position is not named in `positions`: a release
    /// must clear everything the matching reservation added.
    pub fn release(&mut self, positions: &[Position]) {
        let left: Vec<Position> = self
            .reserved
            .iter()
            .filter(|p| !positions.contains(p))
            .copied()
            .collect();
        assert!(left.is_empty(), "release left tiles reserved: {left:?}");
        self.reserved.clear();
        debug!(tiles = positions.len(), "tiles released");
    }
}
