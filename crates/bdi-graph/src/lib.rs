//! `bdi-graph` — the agent's world model.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                    |
//! |-------------|-------------------------------------------------------------|
//! | [`tiles`]   | `TileMap` (CSR adjacency), `TileMapBuilder`, `TileKind`     |
//! | [`router`]  | `Router` trait, `Route`, `DijkstraRouter`, `Passability`    |
//! | [`belief`]  | `AgentBelief`, `ParcelBelief`, `Provenance`                 |
//! | [`percept`] | `AgentPercept`, `ParcelPercept`, `ParcelReport`             |
//! | [`graph`]   | `BeliefGraph` — the single mutable world model              |
//! | [`loader`]  | `load_tiles_csv`, `load_tiles_reader`                       |
//! | [`error`]   | `GraphError`, `GraphResult<T>`                              |
//!
//! # Feature flags
//!
//! | Flag      | Effect                                                     |
//! |-----------|------------------------------------------------------------|
//! | `fx-hash` | FxHash instead of SipHash for position and entity indices. |
//!
//! The topology (`TileMap`) is built once from the initial map and never
//! changes; only per-tile beliefs and the reservation set mutate.

pub mod belief;
pub mod error;
pub mod graph;
pub mod loader;
pub mod percept;
pub mod router;
pub mod tiles;


pub use belief::{AgentBelief, ParcelBelief, Provenance};
pub use error::{GraphError, GraphResult};
pub use graph::BeliefGraph;
pub use loader::{load_tiles_csv, load_tiles_reader};
pub use percept::{AgentPercept, ParcelPercept, ParcelReport};
pub use router::{DijkstraRouter, Passability, Route, Router};
pub use tiles::{TileKind, TileMap, TileMapBuilder};

#[cfg(not(feature = "fx-hash"))]
pub(crate) type IndexMap<K, V> = std::collections::HashMap<K, V>;
#[cfg(feature = "fx-hash")]
pub(crate) type IndexMap<K, V> = rustc_hash::FxHashMap<K, V>;
