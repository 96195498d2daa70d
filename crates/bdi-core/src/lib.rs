//! `bdi-core` — foundational types for the bdi agent workspace.
//!
//! Grid geometry, typed ids and clocks shared by every `bdi-*` crate.
//! Depends on `thiserror` only; `serde` support is opt-in.
//!
//! # Modules
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `TileId`, `EdgeId`, `AgentId`, `ParcelId`             |
//! | [`position`]    | `Position`, `Direction`, `PerceptPosition`            |
//! | [`time`]        | `Timestamp`, `Clock`, `SystemClock`, `ManualClock`    |
//! | [`error`]       | `CoreError`, `CoreResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod error;
pub mod ids;
pub mod position;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use ids::{AgentId, EdgeId, ParcelId, TileId};
pub use position::{Direction, PerceptPosition, Position};
pub use time::{Clock, ManualClock, SystemClock, Timestamp};
