//! Agent-to-agent messaging.

use async_trait::async_trait;
use tokio::sync::oneshot;

use bdi_core::AgentId;

use crate::event::{AgentEvent, WeakEventSender};
use crate::message::{Message, PeerInfo, Reply, ReserveRequest};
use crate::{AgentError, AgentResult};

/// Transport to the other agent.
#[async_trait]
pub trait PeerChannel: Send + Sync {
    /// One-way message to `to`.
    async fn tell(&self, to: &AgentId, message: Message) -> AgentResult<()>;

    /// One-way message to everyone listening.
    async fn shout(&self, message: Message) -> AgentResult<()>;

    /// Reservation request/response round trip.  No timeout: a silent peer
    /// stalls the caller.
    async fn ask(&self, to: &AgentId, request: ReserveRequest) -> AgentResult<Reply>;
}

/// Channel for an agent with nobody to talk to.  Messages are dropped;
/// asking fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPeer;

#[async_trait]
impl PeerChannel for NoPeer {
    async fn tell(&self, _to: &AgentId, _message: Message) -> AgentResult<()> {
        Ok(())
    }

    async fn shout(&self, _message: Message) -> AgentResult<()> {
        Ok(())
    }

    async fn ask(&self, _to: &AgentId, _request: ReserveRequest) -> AgentResult<Reply> {
        Err(AgentError::NoPeer)
    }
}

/// In-process link to another agent's event channel.
///
/// Holds the peer's sender weakly so that two linked agents do not keep
/// each other's channels open.
#[derive(Debug, Clone)]
pub struct ChannelPeer {
    me:   PeerInfo,
    peer: WeakEventSender,
}

impl ChannelPeer {
    pub fn new(me: PeerInfo, peer: WeakEventSender) -> Self {
        Self { me, peer }
    }

    fn deliver(&self, event: AgentEvent) -> AgentResult<()> {
        let tx = self.peer.upgrade().ok_or(AgentError::ChannelClosed)?;
        tx.send(event).map_err(|_| AgentError::ChannelClosed)
    }
}

#[async_trait]
impl PeerChannel for ChannelPeer {
    async fn tell(&self, _to: &AgentId, message: Message) -> AgentResult<()> {
        self.deliver(AgentEvent::Peer { from: self.me.clone(), message })
    }

    async fn shout(&self, message: Message) -> AgentResult<()> {
        self.deliver(AgentEvent::Peer { from: self.me.clone(), message })
    }

    async fn ask(&self, _to: &AgentId, request: ReserveRequest) -> AgentResult<Reply> {
        let (reply, answer) = oneshot::channel();
        self.deliver(AgentEvent::Reserve { from: self.me.clone(), request, reply })?;
        answer.await.map_err(|_| AgentError::ChannelClosed)
    }
}
