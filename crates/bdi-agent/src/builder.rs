//! Fluent builder for constructing an [`Agent`].

use std::sync::Arc;

use bdi_core::{Clock, SystemClock};
use bdi_execution::{PlanExecutor, World};
use bdi_graph::{AgentPercept, BeliefGraph, DijkstraRouter, TileMap};
use bdi_planning::{HttpSolver, LocalPlanner, Planner, SolverPlanner};

use crate::config::{AgentConfig, GotoPlanner};
use crate::control::{AgentCore, ControlState};
use crate::coordination::Coordination;
use crate::event::{event_channel, EventReceiver, EventSender};
use crate::peer::{NoPeer, PeerChannel};
use crate::{Agent, AgentError, AgentResult};

/// Fluent builder for [`Agent`].
///
/// # Required inputs
///
/// - [`AgentConfig`]
/// - [`TileMap`]: the walkable tiles, fixed for the agent's lifetime
/// - the first self percept
/// - a [`World`] (via [`.world(..)`](Self::world))
///
/// # Optional inputs (have defaults)
///
/// | Method              | Default                                          |
/// |---------------------|--------------------------------------------------|
/// | `.peer(p)`          | [`NoPeer`]; required when coordination is on     |
/// | `.clock(c)`         | [`SystemClock`]                                  |
/// | `.solver(s)`        | [`HttpSolver`] at `solver_url` if `goto_planner = "solver"` |
/// | `.channel(tx, rx)`  | A fresh unbounded channel                        |
///
/// # Example
///
/// ```rust,ignore
/// let (tx, rx) = event_channel();
/// let world = Arc::new(LocalWorld::new(tiles.clone(), "a1", "alice", start).with_events(tx.downgrade()));
/// let (mut agent, _inbox) = AgentBuilder::new(config, tiles, world.self_percept())
///     .world(world)
///     .channel(tx, rx)
///     .build()?;
/// agent.run().await?;
/// ```
pub struct AgentBuilder {
    config:  AgentConfig,
    tiles:   TileMap,
    me:      AgentPercept,
    world:   Option<Arc<dyn World>>,
    peer:    Option<Arc<dyn PeerChannel>>,
    clock:   Option<Arc<dyn Clock>>,
    solver:  Option<Box<dyn Planner>>,
    channel: Option<(EventSender, EventReceiver)>,
}

impl AgentBuilder {
    pub fn new(config: AgentConfig, tiles: TileMap, me: AgentPercept) -> Self {
        Self {
            config,
            tiles,
            me,
            world:   None,
            peer:    None,
            clock:   None,
            solver:  None,
            channel: None,
        }
    }

    pub fn world(mut self, world: Arc<dyn World>) -> Self {
        self.world = Some(world);
        self
    }

    pub fn peer(mut self, peer: impl PeerChannel + 'static) -> Self {
        self.peer = Some(Arc::new(peer));
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Planner for `GoTo` in the solo loop.  Overrides `goto_planner`.
    pub fn solver(mut self, solver: impl Planner + 'static) -> Self {
        self.solver = Some(Box::new(solver));
        self
    }

    /// Use an existing event channel, e.g. one a world or peer link was
    /// already given the sender of.
    pub fn channel(mut self, tx: EventSender, rx: EventReceiver) -> Self {
        self.channel = Some((tx, rx));
        self
    }

    /// Validate inputs, initialise the belief graph, and return the agent
    /// with the sender side of its inbox.  The inbox closes, and
    /// [`Agent::run`] returns, once every clone of that sender is dropped.
    pub fn build(self) -> AgentResult<(Agent, EventSender)> {
        self.config.validate()?;

        let world = self
            .world
            .ok_or_else(|| AgentError::Config("an agent needs a world".into()))?;
        if self.config.coordination && self.peer.is_none() {
            return Err(AgentError::Config("coordination enabled without a peer channel".into()));
        }

        let clock: Arc<dyn Clock> = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let graph = BeliefGraph::initialize(self.tiles, &self.me, clock.now())?;

        let solver = match (self.solver, self.config.goto_planner) {
            (Some(s), _) => Some(s),
            (None, GotoPlanner::Solver) => {
                let http = HttpSolver::new(self.config.solver_url.as_str());
                Some(Box::new(SolverPlanner::new(http)) as Box<dyn Planner>)
            }
            (None, GotoPlanner::Local) => None,
        };

        let (tx, rx) = self.channel.unwrap_or_else(event_channel);
        let peer = self.peer.unwrap_or_else(|| Arc::new(NoPeer));

        let core = AgentCore {
            reconsideration: self.config.reconsideration.build(),
            config:          self.config,
            graph,
            router:          DijkstraRouter,
            coordination:    Coordination::Disabled,
            state:           ControlState::Deliberating,
            peer,
            clock,
            events:          rx,
            timer_sender:    tx.downgrade(),
            announcer:       None,
            closed:          false,
        };

        let agent = Agent {
            core,
            local:    LocalPlanner::new(),
            solver,
            world,
            executor: PlanExecutor::new(),
            timers:   Vec::new(),
        };
        Ok((agent, tx))
    }
}
