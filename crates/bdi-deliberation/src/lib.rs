//! `bdi-deliberation` — deciding what to pursue next.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                  |
//! |---------------|-----------------------------------------------------------|
//! | [`intention`] | `Intention` (`Deliver`, `GoTo`, `Stay`), `IntentionKind`  |
//! | [`desire`]    | `Candidates` — what is eligible this cycle                |
//! | [`ranking`]   | `DeliveryOption`, `ExploreOption`, the two rankers        |
//! | [`deliberate`]| `deliberate` — greedy selection over the rankings         |
//! | [`reconsider`]| `Reconsideration` trait, `Cautious`, `Bold`               |
//!
//! # Design notes
//!
//! Deliberation is a pure function of the belief graph: it only reads, and
//! it is recomputed from scratch every cycle.  Tiles occupied by another
//! agent or reserved by the peer are excluded both as candidates and as
//! route waypoints.
//!
//! # Feature flags
//!
//! | Flag       | Effect                                                |
//! |------------|-------------------------------------------------------|
//! | `parallel` | Ranks delivery options per parcel on Rayon's pool.    |

pub mod deliberate;
pub mod desire;
pub mod intention;
pub mod ranking;
pub mod reconsider;


pub use deliberate::deliberate;
pub use desire::Candidates;
pub use intention::{Intention, IntentionKind};
pub use ranking::{rank_delivery_options, rank_explore_options, DeliveryOption, ExploreOption};
pub use reconsider::{should_preempt, Bold, Cautious, Reconsideration};
