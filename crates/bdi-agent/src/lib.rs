//! `bdi-agent` — control loops and pairwise coordination for the bdi agent.
//!
//! # Control loops
//!
//! ```text
//! solo:    deliberate ─▶ plan ─▶ execute ─▶ deliberate …
//!
//! paired:  deliberate ─▶ plan (local) ─▶ ask peer to reserve walked tiles
//!            ├─ reject ─▶ wait for news ─▶ deliberate …
//!            └─ accept ─▶ execute ─▶ tell peer to release ─▶ deliberate …
//! ```
//!
//! A `Stay` intention, a planning failure, or a rejected reservation parks
//! the loop until the next inbound event: nothing deliberation reads can
//! change before then.
//!
//! # Crate layout
//!
//! | Module           | Contents                                               |
//! |------------------|--------------------------------------------------------|
//! | [`agent`]        | `Agent` — solo and paired loops                        |
//! | [`builder`]      | `AgentBuilder`                                         |
//! | [`config`]       | `AgentConfig` (TOML), `load_config`                    |
//! | [`control`]      | `ControlState`, inbound event handling                 |
//! | [`coordination`] | `Coordination` state, reservation arbitration          |
//! | [`event`]        | `AgentEvent`, the inbox channel                        |
//! | [`message`]      | Peer wire messages and replies                         |
//! | [`peer`]         | `PeerChannel`, `NoPeer`, `ChannelPeer`                 |
//! | [`world`]        | `LocalWorld` — in-memory world                         |
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | Ranks delivery options on Rayon's thread pool.         |
//! | `fx-hash`  | FxHash for the belief graph's id indices.              |

pub mod agent;
pub mod builder;
pub mod config;
pub mod control;
pub mod coordination;
pub mod error;
pub mod event;
pub mod message;
pub mod peer;
pub mod world;

mod hooks;
mod timers;

#[cfg(test)]
mod tests;

pub use agent::Agent;
pub use builder::AgentBuilder;
pub use config::{load_config, AgentConfig, CommitmentConfig, GotoPlanner, ParcelDecay, ReconsiderationPolicy};
pub use control::ControlState;
pub use coordination::Coordination;
pub use error::{AgentError, AgentResult};
pub use event::{event_channel, AgentEvent, EventReceiver, EventSender, WeakEventSender};
pub use message::{Message, PeerInfo, Reply, ReserveRequest};
pub use peer::{ChannelPeer, NoPeer, PeerChannel};
pub use world::LocalWorld;
