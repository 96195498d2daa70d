//! The `Agent` and its control loops.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use bdi_deliberation::Intention;
use bdi_execution::{PlanExecutor, World};
use bdi_graph::BeliefGraph;
use bdi_planning::{LocalPlanner, Plan, Planner, PlanningResult};

use crate::config::AgentConfig;
use crate::control::{AgentCore, ControlState};
use crate::coordination::Coordination;
use crate::event::AgentEvent;
use crate::hooks::RunHooks;
use crate::message::{Message, PeerInfo, Reply, ReserveRequest};
use crate::timers::spawn_ticker;
use crate::{AgentError, AgentResult};

/// What the loop does next, decided from the coordination state.
enum Step {
    Solo,
    AwaitPeer,
    Paired(PeerInfo),
}

/// A belief-desire-intention agent.
///
/// `Agent` owns the belief graph, both planners, the executor and the
/// world link, and runs one of two loops:
///
/// - **Solo** (coordination disabled): deliberate → plan → execute, with
///   `GoTo` optionally planned by the external solver.
/// - **Paired** (after the announce/ack handshake): deliberate → plan
///   locally → reserve the walked tiles with the peer → execute on accept
///   → release.
///
/// Inbound events are handled between executor steps, while idle, and
/// while a reservation request is outstanding.
///
/// Create via [`AgentBuilder`][crate::AgentBuilder].
pub struct Agent {
    pub(crate) core:     AgentCore,
    pub(crate) local:    LocalPlanner,
    pub(crate) solver:   Option<Box<dyn Planner>>,
    pub(crate) world:    Arc<dyn World>,
    pub(crate) executor: PlanExecutor,
    pub(crate) timers:   Vec<JoinHandle<()>>,
}

impl Agent {
    // ── Read access ───────────────────────────────────────────────────────

    pub fn graph(&self) -> &BeliefGraph {
        &self.core.graph
    }

    pub fn config(&self) -> &AgentConfig {
        &self.core.config
    }

    pub fn coordination(&self) -> &Coordination {
        &self.core.coordination
    }

    pub fn state(&self) -> &ControlState {
        &self.core.state
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Run until the inbox closes or a fatal error occurs.
    pub async fn run(&mut self) -> AgentResult<()> {
        self.start_timers();
        if self.core.config.coordination {
            self.core.start_announcing();
        }
        let result = self.control_loop().await;
        self.stop_timers();
        result
    }

    async fn control_loop(&mut self) -> AgentResult<()> {
        while !self.core.closed {
            let step = match &self.core.coordination {
                Coordination::Disabled        => Step::Solo,
                Coordination::Announcing      => Step::AwaitPeer,
                Coordination::Paired { peer } => Step::Paired(peer.clone()),
                other => return Err(AgentError::InvalidState(other.name())),
            };
            match step {
                Step::Solo         => self.solo_step().await?,
                Step::AwaitPeer    => self.core.next_event().await?,
                Step::Paired(peer) => self.paired_step(peer).await?,
            };
        }
        info!("inbox closed, stopping");
        Ok(())
    }

    // ── Loops ─────────────────────────────────────────────────────────────

    async fn solo_step(&mut self) -> AgentResult<bool> {
        let intention = self.core.deliberate();
        if intention == Intention::Stay {
            debug!("nothing to do, waiting for news");
            return self.core.next_event().await;
        }

        self.core.state = ControlState::Planning(intention.clone());
        let plan = match self.plan(&intention, false).await {
            Ok(plan) => plan,
            Err(e) => {
                warn!(%intention, error = %e, "planning failed");
                self.core.state = ControlState::Deliberating;
                return self.core.next_event().await;
            }
        };

        self.execute(intention, plan).await?;
        Ok(true)
    }

    pub(crate) async fn paired_step(&mut self, peer: PeerInfo) -> AgentResult<bool> {
        let intention = self.core.deliberate();
        if intention == Intention::Stay {
            debug!("nothing to do, waiting for news");
            return self.core.next_event().await;
        }

        self.core.state = ControlState::Planning(intention.clone());
        let plan = match self.plan(&intention, true).await {
            Ok(plan) => plan,
            Err(e) => {
                warn!(%intention, error = %e, "planning failed");
                self.core.state = ControlState::Deliberating;
                return self.core.next_event().await;
            }
        };

        let tiles = plan.walked_tiles(self.core.graph.me().position);
        let date = self.core.clock.now();
        info!(%peer, tiles = ?tiles, "asking for a reservation");
        self.core.coordination = Coordination::Negotiating {
            peer:           peer.clone(),
            reserved_by_me: tiles.clone(),
            date,
        };

        let request = ReserveRequest::new(tiles.clone(), date);
        let Some(reply) = self.core.ask_serving(&peer, request).await? else {
            return Ok(false);
        };

        if reply == Reply::Reject {
            info!(%peer, "reservation rejected");
            self.core.coordination = Coordination::Paired { peer };
            self.core.state = ControlState::Deliberating;
            return self.core.next_event().await;
        }

        info!(%peer, "reservation accepted");
        self.execute(intention, plan).await?;

        info!(%peer, tiles = tiles.len(), "releasing");
        self.core.coordination = Coordination::Releasing { peer: peer.clone() };
        self.core.peer.tell(&peer.id, Message::Release { tiles }).await?;
        self.core.coordination = Coordination::Paired { peer };
        Ok(true)
    }

    // ── Plan and execute ──────────────────────────────────────────────────

    /// The solver serves `GoTo` in the solo loop when configured; the local
    /// planner serves everything else.
    async fn plan(&self, intention: &Intention, paired: bool) -> PlanningResult<Plan> {
        match (&self.solver, intention) {
            (Some(solver), Intention::GoTo(_)) if !paired => solver.plan(intention, &self.core.graph).await,
            _ => self.local.plan_now(intention, &self.core.graph),
        }
    }

    /// Run `plan` under a fresh commitment policy.  Returns whether the
    /// plan completed.
    async fn execute(&mut self, intention: Intention, plan: Plan) -> AgentResult<bool> {
        info!(%intention, %plan, "executing");
        self.core.state = ControlState::Executing(intention);

        let mut commitment = self.core.config.commitment.build(Arc::clone(&self.core.clock));
        let mut hooks = RunHooks::new(&mut self.core, commitment.as_mut());
        let success = self.executor.execute(plan, self.world.as_ref(), &mut hooks).await;
        if let Some(e) = hooks.into_error() {
            return Err(e);
        }

        match &self.core.state {
            ControlState::Preempted(next) => info!(%next, "plan preempted"),
            _ if success                  => info!("plan successful"),
            _                             => warn!("plan failed"),
        }
        if !matches!(self.core.state, ControlState::Preempted(_)) {
            self.core.state = ControlState::Deliberating;
        }
        Ok(success)
    }

    // ── Timers ────────────────────────────────────────────────────────────

    fn start_timers(&mut self) {
        let sender = &self.core.timer_sender;
        if let Some(ms) = self.core.config.agent_decay_interval_ms {
            self.timers.push(spawn_ticker(sender.clone(), ms, || AgentEvent::DecayAgents));
        }
        if let Some(ms) = self.core.config.parcel_decay.interval_ms() {
            self.timers.push(spawn_ticker(sender.clone(), ms, || AgentEvent::DecayParcels));
        }
    }

    fn stop_timers(&mut self) {
        for task in self.timers.drain(..) {
            task.abort();
        }
        self.core.stop_announcing();
    }
}

impl Drop for Agent {
    fn drop(&mut self) {
        self.stop_timers();
    }
}
