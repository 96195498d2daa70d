//! Timestamped, provenance-tagged beliefs stored on tiles.

use std::fmt;

use bdi_core::{AgentId, ParcelId, Position, Timestamp};

/// Where a belief came from.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub enum Provenance {
    /// Built directly from a percept.
    #[default]
    Observed,
    /// Rewritten by a decay pass.
    Decayed,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Observed => f.write_str("observed"),
            Provenance::Decayed  => f.write_str("decayed"),
        }
    }
}

/// Last known state of an agent.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentBelief {
    pub id:         AgentId,
    pub name:       String,
    pub position:   Position,
    pub score:      i64,
    pub updated:    Timestamp,
    pub provenance: Provenance,
}

impl AgentBelief {
    /// Milliseconds since this belief was last refreshed.
    #[inline]
    pub fn age(&self, now: Timestamp) -> u64 {
        now.since(self.updated)
    }
}

/// Last known state of a parcel.  `reward` is kept as a real number so
/// partial decay is not truncated away.
#[derive(Debug, Clone, PartialEq)]
pub struct ParcelBelief {
    pub id:         ParcelId,
    pub position:   Position,
    pub reward:     f64,
    pub carried_by: Option<AgentId>,
    pub updated:    Timestamp,
    pub provenance: Provenance,
}

impl ParcelBelief {
    #[inline]
    pub fn age(&self, now: Timestamp) -> u64 {
        now.since(self.updated)
    }

    /// `true` if `agent` is the recorded carrier.
    pub fn is_carried_by(&self, agent: &AgentId) -> bool {
        self.carried_by.as_ref() == Some(agent)
    }
}

impl fmt::Display for ParcelBelief {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {} ({:.1})", self.id, self.position, self.reward)
    }
}
