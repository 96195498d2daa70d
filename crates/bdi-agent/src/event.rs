//! Inbound traffic for the control loop.
//!
//! World percepts, peer messages and timer ticks all arrive on one
//! unbounded channel.  The control loop is the only consumer, so every
//! belief-graph mutation happens on a single logical thread.

use tokio::sync::{mpsc, oneshot};

use bdi_graph::{AgentPercept, ParcelPercept};

use crate::message::{Message, PeerInfo, Reply, ReserveRequest};

#[derive(Debug)]
pub enum AgentEvent {
    SelfPercept(AgentPercept),
    AgentPercepts(Vec<AgentPercept>),
    ParcelPercepts(Vec<ParcelPercept>),
    /// A one-way message from the peer.
    Peer { from: PeerInfo, message: Message },
    /// A reservation request; `reply` is consumed by the answer.
    Reserve {
        from:    PeerInfo,
        request: ReserveRequest,
        reply:   oneshot::Sender<Reply>,
    },
    DecayAgents,
    DecayParcels,
    Announce,
}

impl AgentEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            AgentEvent::SelfPercept(_)    => "self percept",
            AgentEvent::AgentPercepts(_)  => "agent percepts",
            AgentEvent::ParcelPercepts(_) => "parcel percepts",
            AgentEvent::Peer { .. }       => "peer message",
            AgentEvent::Reserve { .. }    => "reserve request",
            AgentEvent::DecayAgents       => "agent decay",
            AgentEvent::DecayParcels      => "parcel decay",
            AgentEvent::Announce          => "announce",
        }
    }
}

pub type EventSender = mpsc::UnboundedSender<AgentEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<AgentEvent>;
pub type WeakEventSender = mpsc::WeakUnboundedSender<AgentEvent>;

pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
