//! Inbound observations from the world.
//!
//! Percepts are what the server (or a peer forwarding its own percepts)
//! reports; beliefs are what the graph stores after resolving them.  Both
//! shapes serialize so they can be relayed to a peer unchanged.

use serde::{Deserialize, Serialize};

use bdi_core::{AgentId, ParcelId, PerceptPosition};

/// An observation of one agent, possibly mid-step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentPercept {
    pub id:       AgentId,
    pub name:     String,
    pub position: PerceptPosition,
    #[serde(default)]
    pub score:    i64,
}

/// An observation of one parcel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParcelPercept {
    pub id:         ParcelId,
    pub position:   PerceptPosition,
    pub reward:     f64,
    #[serde(default)]
    pub carried_by: Option<AgentId>,
}

/// What the world returns from a pickup or putdown: the parcels affected,
/// in percept shape.
pub type ParcelReport = ParcelPercept;
