//! Control state and inbound event handling.
//!
//! `AgentCore` is everything the event handlers touch: the belief graph,
//! the coordination state, the peer link and the inbox.  The control loop
//! in [`crate::agent`] owns it alongside the planners, executor and world,
//! so a running plan's hooks can borrow the core while the executor is
//! borrowed separately.

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use bdi_core::Clock;
use bdi_deliberation::{deliberate, should_preempt, Intention, Reconsideration};
use bdi_execution::ExecutionControl;
use bdi_graph::{BeliefGraph, DijkstraRouter};

use crate::config::AgentConfig;
use crate::coordination::Coordination;
use crate::event::{AgentEvent, EventReceiver, WeakEventSender};
use crate::message::{Message, PeerInfo, Reply, ReserveRequest};
use crate::peer::PeerChannel;
use crate::timers::spawn_ticker;
use crate::{AgentError, AgentResult};

// ── ControlState ──────────────────────────────────────────────────────────────

/// Where the control loop is.  Reconsideration only acts while executing.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ControlState {
    #[default]
    Deliberating,
    Planning(Intention),
    Executing(Intention),
    /// The running plan was stopped in favour of this intention.
    Preempted(Intention),
}

impl ControlState {
    pub fn name(&self) -> &'static str {
        match self {
            ControlState::Deliberating => "deliberating",
            ControlState::Planning(_)  => "planning",
            ControlState::Executing(_) => "executing",
            ControlState::Preempted(_) => "preempted",
        }
    }

    pub fn intention(&self) -> Option<&Intention> {
        match self {
            ControlState::Deliberating => None,
            ControlState::Planning(i) | ControlState::Executing(i) | ControlState::Preempted(i) => Some(i),
        }
    }
}

impl fmt::Display for ControlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.intention() {
            Some(i) => write!(f, "{} {i}", self.name()),
            None    => f.write_str(self.name()),
        }
    }
}

// ── AgentCore ─────────────────────────────────────────────────────────────────

pub(crate) struct AgentCore {
    pub(crate) config:          AgentConfig,
    pub(crate) graph:           BeliefGraph,
    pub(crate) router:          DijkstraRouter,
    pub(crate) coordination:    Coordination,
    pub(crate) state:           ControlState,
    pub(crate) reconsideration: Box<dyn Reconsideration>,
    pub(crate) peer:            Arc<dyn PeerChannel>,
    pub(crate) clock:           Arc<dyn Clock>,
    pub(crate) events:          EventReceiver,
    /// Handed to timer tasks; weak so timers never keep the inbox open.
    pub(crate) timer_sender:    WeakEventSender,
    pub(crate) announcer:       Option<JoinHandle<()>>,
    /// Set once every event sender is gone.
    pub(crate) closed:          bool,
}

impl AgentCore {
    pub(crate) fn deliberate(&mut self) -> Intention {
        self.state = ControlState::Deliberating;
        let intention = deliberate(&self.graph, &self.router);
        info!(%intention, "deliberated");
        intention
    }

    // ── Inbox ─────────────────────────────────────────────────────────────

    /// Block until one event arrives and handle it.  `Ok(false)` once the
    /// inbox is closed.
    pub(crate) async fn next_event(&mut self) -> AgentResult<bool> {
        match self.events.recv().await {
            Some(event) => {
                self.handle(event, None).await?;
                Ok(true)
            }
            None => {
                self.closed = true;
                Ok(false)
            }
        }
    }

    /// Handle everything already queued, without waiting.  Runs between
    /// executor steps; a closed inbox stops the run.
    pub(crate) async fn drain_events(&mut self, control: &mut ExecutionControl) -> AgentResult<()> {
        loop {
            match self.events.try_recv() {
                Ok(event) => self.handle(event, Some(&mut *control)).await?,
                Err(TryRecvError::Empty) => return Ok(()),
                Err(TryRecvError::Disconnected) => {
                    self.closed = true;
                    control.stop(false);
                    return Ok(());
                }
            }
        }
    }

    /// Ask the peer to reserve tiles, handling inbound events while the
    /// answer is outstanding.  `Ok(None)` if the inbox closed meanwhile.
    pub(crate) async fn ask_serving(
        &mut self,
        peer: &PeerInfo,
        request: ReserveRequest,
    ) -> AgentResult<Option<Reply>> {
        let channel = Arc::clone(&self.peer);
        let to = peer.id.clone();
        let ask = async move { channel.ask(&to, request).await };
        tokio::pin!(ask);

        loop {
            tokio::select! {
                reply = &mut ask => return reply.map(Some),
                event = self.events.recv() => match event {
                    Some(event) => self.handle(event, None).await?,
                    None => {
                        self.closed = true;
                        return Ok(None);
                    }
                },
            }
        }
    }

    async fn handle(&mut self, event: AgentEvent, control: Option<&mut ExecutionControl>) -> AgentResult<()> {
        let now = self.clock.now();
        debug!(event = event.kind(), "inbound");

        match event {
            AgentEvent::SelfPercept(percept) => {
                if let Err(e) = self.graph.apply_agent_percept(&percept, now) {
                    warn!(error = %e, "self percept ignored");
                }
                self.exchange(Message::AgentPerceptsExchange { percepts: vec![percept] }).await;
            }
            AgentEvent::AgentPercepts(percepts) => {
                if percepts.is_empty() {
                    return Ok(());
                }
                self.graph.apply_agent_percepts(&percepts, now);
                self.exchange(Message::AgentPerceptsExchange { percepts }).await;
                self.reconsider(control);
            }
            AgentEvent::ParcelPercepts(percepts) => {
                if percepts.is_empty() {
                    return Ok(());
                }
                self.graph.apply_parcel_percepts(&percepts, now);
                self.exchange(Message::ParcelPerceptsExchange { percepts }).await;
                self.reconsider(control);
            }
            AgentEvent::Peer { from, message } => self.on_message(from, message, control).await?,
            AgentEvent::Reserve { from, request, reply } => self.on_reserve(&from, &request, reply)?,
            AgentEvent::DecayAgents => {
                if let Some(ms) = self.config.agent_decay_interval_ms {
                    self.graph.decay_agents(ms, now);
                }
            }
            AgentEvent::DecayParcels => {
                if let Some(ms) = self.config.parcel_decay.interval_ms() {
                    self.graph.decay_parcels(ms, now);
                }
            }
            AgentEvent::Announce => {
                if self.coordination == Coordination::Announcing {
                    debug!("announcing");
                    self.peer.shout(Message::Register).await?;
                }
            }
        }
        Ok(())
    }

    // ── Peer messages ─────────────────────────────────────────────────────

    async fn on_message(
        &mut self,
        from: PeerInfo,
        message: Message,
        control: Option<&mut ExecutionControl>,
    ) -> AgentResult<()> {
        let now = self.clock.now();
        match message {
            Message::Register => {
                if self.coordination == Coordination::Announcing {
                    info!(peer = %from, "peer registered, acknowledging");
                    self.peer.tell(&from.id, Message::Ack).await?;
                }
            }
            Message::Ack => {
                if self.coordination == Coordination::Announcing {
                    self.stop_announcing();
                    self.peer.tell(&from.id, Message::Ack).await?;
                    info!(peer = %from, "paired");
                    self.coordination = Coordination::Paired { peer: from };
                }
            }
            Message::AgentPerceptsExchange { percepts } => {
                if !percepts.is_empty() {
                    self.graph.apply_agent_percepts(&percepts, now);
                    self.reconsider(control);
                }
            }
            Message::ParcelPerceptsExchange { percepts } => {
                if !percepts.is_empty() {
                    self.graph.apply_parcel_percepts(&percepts, now);
                    self.reconsider(control);
                }
            }
            Message::Reserve(_) => {
                return Err(AgentError::ProtocolViolation {
                    state:   self.coordination.name(),
                    message: "reserve without a reply channel",
                });
            }
            Message::Release { tiles } => {
                self.coordination.check_release()?;
                info!(peer = %from, tiles = tiles.len(), "peer released tiles");
                self.graph.release(&tiles);
            }
        }
        Ok(())
    }

    fn on_reserve(
        &mut self,
        from: &PeerInfo,
        request: &ReserveRequest,
        reply: oneshot::Sender<Reply>,
    ) -> AgentResult<()> {
        let decision = self.coordination.arbitrate(request)?;
        if decision == Reply::Accept {
            self.graph.reserve(&request.tiles);
        }
        info!(peer = %from, tiles = ?request.tiles, %decision, "reservation request");
        if reply.send(decision).is_err() {
            warn!(peer = %from, "peer stopped waiting for the reservation reply");
        }
        Ok(())
    }

    /// Forward percepts to the peer once paired.  Best effort.
    async fn exchange(&mut self, message: Message) {
        let Some(peer) = self.coordination.peer() else { return };
        if let Err(e) = self.peer.tell(&peer.id, message).await {
            warn!(peer = %peer, error = %e, "percept exchange failed");
        }
    }

    // ── Reconsideration ───────────────────────────────────────────────────

    fn reconsider(&mut self, control: Option<&mut ExecutionControl>) {
        let ControlState::Executing(current) = &self.state else { return };
        let Some(proposed) = self.reconsideration.reconsider(current, &self.graph, &self.router) else {
            return;
        };
        if !should_preempt(current, &proposed) {
            return;
        }
        info!(%current, %proposed, "preempting");
        if let Some(control) = control {
            control.stop(true);
        }
        self.state = ControlState::Preempted(proposed);
    }

    // ── Announcing ────────────────────────────────────────────────────────

    pub(crate) fn start_announcing(&mut self) {
        let period = self.config.announcement_interval_ms;
        self.coordination = Coordination::Announcing;
        self.announcer = Some(spawn_ticker(self.timer_sender.clone(), period, || AgentEvent::Announce));
        info!(period_ms = period, "looking for a peer");
    }

    pub(crate) fn stop_announcing(&mut self) {
        if let Some(task) = self.announcer.take() {
            task.abort();
        }
    }
}
