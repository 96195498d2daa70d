//! Peer-to-peer message payloads.
//!
//! On the wire each message is a JSON object tagged by `name`:
//!
//! ```text
//! {"name":"register"}
//! {"name":"ack"}
//! {"name":"agentperceptsexchange","percepts":[..]}
//! {"name":"parcelperceptsexchange","percepts":[..]}
//! {"name":"reserve","tiles":[[1,0],[2,0]],"timeMs":1700000000000}
//! {"name":"release","tiles":[[1,0],[2,0]]}
//! ```
//!
//! Replies to `reserve` are `{"name":"accept"}` or `{"name":"reject"}`.

use std::fmt;

use serde::{Deserialize, Serialize};

use bdi_core::{AgentId, Position, Timestamp};
use bdi_graph::{AgentPercept, ParcelPercept};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "lowercase")]
pub enum Message {
    Register,
    Ack,
    AgentPerceptsExchange { percepts: Vec<AgentPercept> },
    ParcelPerceptsExchange { percepts: Vec<ParcelPercept> },
    Reserve(ReserveRequest),
    Release { tiles: Vec<Position> },
}

impl Message {
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Register                    => "register",
            Message::Ack                         => "ack",
            Message::AgentPerceptsExchange { .. }  => "agentperceptsexchange",
            Message::ParcelPerceptsExchange { .. } => "parcelperceptsexchange",
            Message::Reserve(_)                  => "reserve",
            Message::Release { .. }              => "release",
        }
    }

    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn decode(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

/// Tiles the sender intends to walk, stamped with when it decided to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReserveRequest {
    pub tiles:   Vec<Position>,
    pub time_ms: u64,
}

impl ReserveRequest {
    pub fn new(tiles: Vec<Position>, at: Timestamp) -> Self {
        Self { tiles, time_ms: at.0 }
    }

    pub fn timestamp(&self) -> Timestamp {
        Timestamp(self.time_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "lowercase")]
pub enum Reply {
    Accept,
    Reject,
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Accept => f.write_str("accept"),
            Reply::Reject => f.write_str("reject"),
        }
    }
}

/// Who a message came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerInfo {
    pub id:   AgentId,
    pub name: String,
}

impl PeerInfo {
    pub fn new(id: impl Into<AgentId>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into() }
    }
}

impl fmt::Display for PeerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
