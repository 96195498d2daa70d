//! Pairwise coordination state and reservation arbitration.
//!
//! ```text
//! Disabled ─▶ Announcing ─(ack)─▶ Paired ─(about to run a plan)─▶ Negotiating
//!                                   ▲                                 │
//!                                   ├──────────────(reject)───────────┤
//!                                   │                              (accept)
//!                                   └───── Releasing ◀─(plan ran)─────┘
//! ```

use std::fmt;

use bdi_core::{Position, Timestamp};

use crate::message::{PeerInfo, Reply, ReserveRequest};
use crate::{AgentError, AgentResult};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Coordination {
    #[default]
    Disabled,
    Announcing,
    Paired { peer: PeerInfo },
    /// Waiting on, or executing under, a reservation of `reserved_by_me`.
    Negotiating {
        peer:           PeerInfo,
        reserved_by_me: Vec<Position>,
        date:           Timestamp,
    },
    Releasing { peer: PeerInfo },
}

impl Coordination {
    pub fn name(&self) -> &'static str {
        match self {
            Coordination::Disabled           => "disabled",
            Coordination::Announcing         => "announcing",
            Coordination::Paired { .. }      => "paired",
            Coordination::Negotiating { .. } => "negotiating",
            Coordination::Releasing { .. }   => "releasing",
        }
    }

    pub fn peer(&self) -> Option<&PeerInfo> {
        match self {
            Coordination::Disabled | Coordination::Announcing => None,
            Coordination::Paired { peer }
            | Coordination::Negotiating { peer, .. }
            | Coordination::Releasing { peer } => Some(peer),
        }
    }

    /// `true` once a peer is known; percepts are then shared with it.
    pub fn is_paired(&self) -> bool {
        self.peer().is_some()
    }

    /// Decide a peer's reservation request.
    ///
    /// Outside negotiation this side claims nothing, so every request is
    /// accepted.  While negotiating, a request overlapping our own claim is
    /// accepted only if it was made strictly earlier.
    pub fn arbitrate(&self, request: &ReserveRequest) -> AgentResult<Reply> {
        match self {
            Coordination::Disabled | Coordination::Announcing => Err(AgentError::ProtocolViolation {
                state:   self.name(),
                message: "reserve",
            }),
            Coordination::Paired { .. } | Coordination::Releasing { .. } => Ok(Reply::Accept),
            Coordination::Negotiating { reserved_by_me, date, .. } => {
                let disjoint = !request.tiles.iter().any(|t| reserved_by_me.contains(t));
                if disjoint || request.timestamp() < *date {
                    Ok(Reply::Accept)
                } else {
                    Ok(Reply::Reject)
                }
            }
        }
    }

    /// Check that a release may be applied in this state.
    pub fn check_release(&self) -> AgentResult<()> {
        match self {
            Coordination::Disabled | Coordination::Announcing => Err(AgentError::ProtocolViolation {
                state:   self.name(),
                message: "release",
            }),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Coordination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.peer() {
            Some(peer) => write!(f, "{} with {peer}", self.name()),
            None       => f.write_str(self.name()),
        }
    }
}
