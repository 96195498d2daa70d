//! Intentions — the high-level goal the agent is currently committed to.

use std::fmt;

use bdi_core::Position;
use bdi_graph::ParcelBelief;

/// What the agent has decided to pursue.
///
/// Produced by [`deliberate`][crate::deliberate] and consumed by a planner.
#[derive(Debug, Clone, PartialEq)]
pub enum Intention {
    /// Fetch `parcel` and put it down on the delivery tile at `destination`.
    Deliver {
        parcel:      ParcelBelief,
        destination: Position,
    },

    /// Walk to a tile, usually to uncover parcels.
    GoTo(Position),

    /// Nothing worth doing; wait for the world to change.
    Stay,
}

/// Variant tag of an [`Intention`], used to decide preemption.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum IntentionKind {
    Deliver,
    GoTo,
    Stay,
}

impl Intention {
    pub fn kind(&self) -> IntentionKind {
        match self {
            Intention::Deliver { .. } => IntentionKind::Deliver,
            Intention::GoTo(_)        => IntentionKind::GoTo,
            Intention::Stay           => IntentionKind::Stay,
        }
    }

    /// Final tile the agent should stand on once the intention is achieved.
    pub fn destination(&self) -> Option<Position> {
        match self {
            Intention::Deliver { destination, .. } => Some(*destination),
            Intention::GoTo(p)                     => Some(*p),
            Intention::Stay                        => None,
        }
    }
}

impl fmt::Display for IntentionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntentionKind::Deliver => f.write_str("Deliver"),
            IntentionKind::GoTo    => f.write_str("GoTo"),
            IntentionKind::Stay    => f.write_str("Stay"),
        }
    }
}

impl fmt::Display for Intention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intention::Deliver { parcel, destination } => {
                write!(f, "Deliver {} to {}", parcel.position, destination)
            }
            Intention::GoTo(p) => write!(f, "GoTo {p}"),
            Intention::Stay    => f.write_str("Stay"),
        }
    }
}
