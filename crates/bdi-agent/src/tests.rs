//! Unit and end-to-end tests for bdi-agent.

#[cfg(test)]
mod helpers {
    use std::sync::Arc;

    use bdi_core::{ManualClock, PerceptPosition, Position, Timestamp};
    use bdi_graph::{AgentPercept, ParcelPercept, TileKind, TileMap, TileMapBuilder};

    use crate::{
        AgentBuilder, AgentConfig, Agent, ChannelPeer, CommitmentConfig, EventReceiver, EventSender,
        LocalWorld, ParcelDecay, PeerInfo,
    };

    /// `w × h` grid with the given delivery tiles.
    pub fn grid(w: i32, h: i32, delivery: &[(i32, i32)]) -> TileMap {
        let mut b = TileMapBuilder::new();
        for y in 0..h {
            for x in 0..w {
                let kind = if delivery.contains(&(x, y)) { TileKind::Delivery } else { TileKind::Spawn };
                b.add_tile(Position::new(x, y), kind);
            }
        }
        b.build()
    }

    pub fn percept(id: &str, x: f64, y: f64) -> AgentPercept {
        AgentPercept {
            id:       id.into(),
            name:     id.to_owned(),
            position: PerceptPosition::new(x, y),
            score:    0,
        }
    }

    pub fn parcel(id: &str, x: i32, y: i32) -> ParcelPercept {
        ParcelPercept {
            id:         id.into(),
            position:   PerceptPosition::new(x as f64, y as f64),
            reward:     10.0,
            carried_by: None,
        }
    }

    /// No timers except a short announce period; quick backtracking.
    pub fn quiet_config() -> AgentConfig {
        AgentConfig {
            agent_decay_interval_ms:  None,
            announcement_interval_ms: 5,
            parcel_decay:             ParcelDecay::Infinite,
            commitment: CommitmentConfig::Backtrack { delay_ms: 1, depth: 5, max_failures: 3, within_ms: 1000 },
            ..AgentConfig::default()
        }
    }

    pub fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(Timestamp(1_000)))
    }

    /// Agent "me" on `tiles` with a peer link into `observer`.
    pub fn linked_agent(tiles: TileMap, at: (i32, i32), observer: &EventSender) -> (Agent, EventSender) {
        let me = percept("me", at.0 as f64, at.1 as f64);
        let world = LocalWorld::new(tiles.clone(), "me", "me", Position::new(at.0, at.1));
        AgentBuilder::new(quiet_config(), tiles, me)
            .world(Arc::new(world))
            .peer(ChannelPeer::new(PeerInfo::new("me", "me"), observer.downgrade()))
            .clock(clock())
            .build()
            .unwrap()
    }

    pub fn peer_info() -> PeerInfo {
        PeerInfo::new("bob", "bob")
    }

    /// Everything queued on `rx` right now.
    pub fn drain(rx: &mut EventReceiver) -> Vec<crate::AgentEvent> {
        let mut out = Vec::new();
        while let Ok(e) = rx.try_recv() {
            out.push(e);
        }
        out
    }
}

// ── Messages ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod messages {
    use bdi_core::{Position, Timestamp};

    use crate::{Message, Reply, ReserveRequest};

    #[test]
    fn wire_shapes() {
        assert_eq!(Message::Register.encode().unwrap(), r#"{"name":"register"}"#);
        let reserve = Message::Reserve(ReserveRequest::new(
            vec![Position::new(1, 0), Position::new(2, 0)],
            Timestamp(5),
        ));
        assert_eq!(reserve.encode().unwrap(), r#"{"name":"reserve","tiles":[[1,0],[2,0]],"timeMs":5}"#);
        assert_eq!(serde_json::to_string(&Reply::Reject).unwrap(), r#"{"name":"reject"}"#);
    }

    #[test]
    fn decodes_peer_traffic() {
        let release = Message::decode(r#"{"name":"release","tiles":[[1,0],[2,0]]}"#).unwrap();
        assert_eq!(release, Message::Release { tiles: vec![Position::new(1, 0), Position::new(2, 0)] });

        let raw = r#"{"name":"agentperceptsexchange","percepts":[{"id":"a1","name":"bob","position":[1.0,2.6]}]}"#;
        match Message::decode(raw).unwrap() {
            Message::AgentPerceptsExchange { percepts } => {
                assert_eq!(percepts.len(), 1);
                assert_eq!(percepts[0].score, 0);
            }
            other => panic!("unexpected {}", other.kind()),
        }

        let reply: Reply = serde_json::from_str(r#"{"name":"accept"}"#).unwrap();
        assert_eq!(reply, Reply::Accept);
    }
}

// ── Arbitration ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod arbitration {
    use bdi_core::{Position, Timestamp};

    use super::helpers::peer_info;
    use crate::{AgentError, Coordination, Reply, ReserveRequest};

    fn row(xs: &[i32]) -> Vec<Position> {
        xs.iter().map(|&x| Position::new(x, 0)).collect()
    }

    fn negotiating(tiles: &[i32], date: u64) -> Coordination {
        Coordination::Negotiating { peer: peer_info(), reserved_by_me: row(tiles), date: Timestamp(date) }
    }

    #[test]
    fn disjoint_requests_accepted_regardless_of_time() {
        let state = negotiating(&[5, 6], 100);
        for t in [50, 100, 500] {
            let req = ReserveRequest::new(row(&[1, 2]), Timestamp(t));
            assert_eq!(state.arbitrate(&req).unwrap(), Reply::Accept);
        }
    }

    #[test]
    fn overlap_goes_to_the_earlier_proposer() {
        let state = negotiating(&[1, 2, 3], 100);
        assert_eq!(state.arbitrate(&ReserveRequest::new(row(&[3, 4]), Timestamp(99))).unwrap(), Reply::Accept);
        assert_eq!(state.arbitrate(&ReserveRequest::new(row(&[3, 4]), Timestamp(101))).unwrap(), Reply::Reject);
        assert_eq!(state.arbitrate(&ReserveRequest::new(row(&[3, 4]), Timestamp(100))).unwrap(), Reply::Reject);
    }

    #[test]
    fn overlapping_requests_resolve_the_same_way_on_both_sides() {
        let a = negotiating(&[1, 2, 3], 100);
        let b = negotiating(&[3, 4, 5], 200);
        let a_asks = ReserveRequest::new(row(&[1, 2, 3]), Timestamp(100));
        let b_asks = ReserveRequest::new(row(&[3, 4, 5]), Timestamp(200));

        assert_eq!(b.arbitrate(&a_asks).unwrap(), Reply::Accept);
        assert_eq!(a.arbitrate(&b_asks).unwrap(), Reply::Reject);
    }

    #[test]
    fn paired_and_releasing_accept_everything() {
        let req = ReserveRequest::new(row(&[1]), Timestamp(0));
        assert_eq!(Coordination::Paired { peer: peer_info() }.arbitrate(&req).unwrap(), Reply::Accept);
        assert_eq!(Coordination::Releasing { peer: peer_info() }.arbitrate(&req).unwrap(), Reply::Accept);
    }

    #[test]
    fn unpaired_states_reject_the_protocol() {
        let req = ReserveRequest::new(row(&[1]), Timestamp(0));
        for state in [Coordination::Disabled, Coordination::Announcing] {
            assert!(matches!(state.arbitrate(&req), Err(AgentError::ProtocolViolation { message: "reserve", .. })));
            assert!(matches!(state.check_release(), Err(AgentError::ProtocolViolation { message: "release", .. })));
        }
        assert!(Coordination::Paired { peer: peer_info() }.check_release().is_ok());
    }

    #[test]
    fn display() {
        assert_eq!(Coordination::Announcing.to_string(), "announcing");
        assert_eq!(Coordination::Paired { peer: peer_info() }.to_string(), "paired with bob");
    }
}

// ── Config ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod config_tests {
    use std::fs;

    use crate::{load_config, AgentConfig, AgentError, CommitmentConfig, GotoPlanner, ParcelDecay, ReconsiderationPolicy};

    #[test]
    fn missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, AgentConfig::default());
        assert_eq!(cfg.agent_decay_interval_ms, Some(2000));
        assert_eq!(cfg.announcement_interval_ms, 1000);
        assert_eq!(cfg.goto_planner, GotoPlanner::Local);
    }

    #[test]
    fn parses_every_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.toml");
        fs::write(
            &path,
            r#"
parcel_decay    = "5s"
coordination    = true
reconsideration = "bold"
goto_planner    = "solver"

[commitment]
policy = "max_consecutive_failures"
max    = 4
"#,
        )
        .unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.parcel_decay, ParcelDecay::FiveSeconds);
        assert!(cfg.coordination);
        assert_eq!(cfg.reconsideration, ReconsiderationPolicy::Bold);
        assert_eq!(cfg.goto_planner, GotoPlanner::Solver);
        assert_eq!(cfg.commitment, CommitmentConfig::MaxConsecutiveFailures { max: 4 });
        assert_eq!(cfg.announcement_interval_ms, 1000);
    }

    #[test]
    fn partial_backtrack_table_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.toml");
        fs::write(&path, "[commitment]\npolicy = \"backtrack\"\ndepth = 2\n").unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(
            cfg.commitment,
            CommitmentConfig::Backtrack { delay_ms: 1000, depth: 2, max_failures: 3, within_ms: 1000 }
        );
    }

    #[test]
    fn invalid_values_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.toml");
        fs::write(&path, "announcement_interval_ms = 0\n").unwrap();
        assert!(matches!(load_config(&path), Err(AgentError::Config(_))));

        fs::write(&path, "parcel_decay = \"3s\"\n").unwrap();
        assert!(matches!(load_config(&path), Err(AgentError::Toml(_))));
    }

    #[test]
    fn parcel_decay_intervals() {
        assert_eq!(ParcelDecay::OneSecond.interval_ms(), Some(1000));
        assert_eq!(ParcelDecay::TenSeconds.interval_ms(), Some(10_000));
        assert_eq!(ParcelDecay::Infinite.interval_ms(), None);
    }
}

// ── AgentBuilder ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod builder_tests {
    use std::sync::Arc;

    use bdi_core::Position;
    use bdi_graph::GraphError;

    use super::helpers::{grid, percept, quiet_config};
    use crate::{AgentBuilder, AgentConfig, AgentError, ControlState, Coordination, LocalWorld};

    fn world() -> Arc<LocalWorld> {
        Arc::new(LocalWorld::new(grid(3, 1, &[]), "me", "me", Position::new(0, 0)))
    }

    #[test]
    fn builds_with_defaults() {
        let (agent, _tx) = AgentBuilder::new(quiet_config(), grid(3, 1, &[]), percept("me", 0.0, 0.0))
            .world(world())
            .build()
            .unwrap();
        assert_eq!(*agent.state(), ControlState::Deliberating);
        assert_eq!(*agent.coordination(), Coordination::Disabled);
        assert_eq!(agent.graph().me().position, Position::new(0, 0));
    }

    #[test]
    fn world_is_required() {
        let result = AgentBuilder::new(quiet_config(), grid(3, 1, &[]), percept("me", 0.0, 0.0)).build();
        assert!(matches!(result, Err(AgentError::Config(_))));
    }

    #[test]
    fn coordination_needs_a_peer() {
        let config = AgentConfig { coordination: true, ..quiet_config() };
        let result = AgentBuilder::new(config, grid(3, 1, &[]), percept("me", 0.0, 0.0))
            .world(world())
            .build();
        assert!(matches!(result, Err(AgentError::Config(_))));
    }

    #[test]
    fn self_off_the_map_is_an_error() {
        let result = AgentBuilder::new(quiet_config(), grid(3, 1, &[]), percept("me", 7.0, 7.0))
            .world(world())
            .build();
        assert!(matches!(result, Err(AgentError::Graph(GraphError::UnknownTile(_)))));
    }
}

// ── Inbound events ────────────────────────────────────────────────────────────

#[cfg(test)]
mod inbound {
    use bdi_core::{Position, Timestamp};
    use tokio::sync::oneshot;

    use super::helpers::{drain, grid, linked_agent, parcel, peer_info, percept};
    use crate::{event_channel, AgentError, AgentEvent, Coordination, Message, Reply, ReserveRequest};

    #[tokio::test]
    async fn register_answered_only_while_announcing() {
        let (observer, mut inbox) = event_channel();
        let (mut agent, tx) = linked_agent(grid(3, 1, &[]), (0, 0), &observer);

        tx.send(AgentEvent::Peer { from: peer_info(), message: Message::Register }).unwrap();
        assert!(agent.core.next_event().await.unwrap());
        assert!(drain(&mut inbox).is_empty());

        agent.core.coordination = Coordination::Announcing;
        tx.send(AgentEvent::Peer { from: peer_info(), message: Message::Register }).unwrap();
        agent.core.next_event().await.unwrap();
        let sent = drain(&mut inbox);
        assert!(matches!(sent.as_slice(), [AgentEvent::Peer { message: Message::Ack, .. }]));
    }

    #[tokio::test]
    async fn ack_pairs_and_acknowledges_back() {
        let (observer, mut inbox) = event_channel();
        let (mut agent, tx) = linked_agent(grid(3, 1, &[]), (0, 0), &observer);
        agent.core.coordination = Coordination::Announcing;

        tx.send(AgentEvent::Peer { from: peer_info(), message: Message::Ack }).unwrap();
        agent.core.next_event().await.unwrap();
        assert_eq!(agent.core.coordination, Coordination::Paired { peer: peer_info() });
        assert_eq!(drain(&mut inbox).len(), 1);

        // A second ack changes nothing.
        tx.send(AgentEvent::Peer { from: peer_info(), message: Message::Ack }).unwrap();
        agent.core.next_event().await.unwrap();
        assert!(drain(&mut inbox).is_empty());
    }

    #[tokio::test]
    async fn reserve_then_release_while_paired() {
        let (observer, _inbox) = event_channel();
        let (mut agent, tx) = linked_agent(grid(4, 1, &[]), (0, 0), &observer);
        agent.core.coordination = Coordination::Paired { peer: peer_info() };
        let tiles = vec![Position::new(2, 0), Position::new(3, 0)];

        let (reply, answer) = oneshot::channel();
        let request = ReserveRequest::new(tiles.clone(), Timestamp(7));
        tx.send(AgentEvent::Reserve { from: peer_info(), request, reply }).unwrap();
        agent.core.next_event().await.unwrap();
        assert_eq!(answer.await.unwrap(), Reply::Accept);
        assert!(agent.graph().is_reserved(Position::new(3, 0)));

        tx.send(AgentEvent::Peer { from: peer_info(), message: Message::Release { tiles } }).unwrap();
        agent.core.next_event().await.unwrap();
        assert!(agent.graph().reserved().is_empty());
    }

    #[tokio::test]
    async fn reserve_while_announcing_is_fatal() {
        let (observer, _inbox) = event_channel();
        let (mut agent, tx) = linked_agent(grid(4, 1, &[]), (0, 0), &observer);
        agent.core.coordination = Coordination::Announcing;

        let (reply, answer) = oneshot::channel();
        let request = ReserveRequest::new(vec![Position::new(1, 0)], Timestamp(7));
        tx.send(AgentEvent::Reserve { from: peer_info(), request, reply }).unwrap();
        let err = agent.core.next_event().await.unwrap_err();
        assert!(matches!(err, AgentError::ProtocolViolation { state: "announcing", .. }));
        assert!(answer.await.is_err());
        assert!(agent.graph().reserved().is_empty());
    }

    #[tokio::test]
    async fn release_while_disabled_is_fatal() {
        let (observer, _inbox) = event_channel();
        let (mut agent, tx) = linked_agent(grid(4, 1, &[]), (0, 0), &observer);

        let message = Message::Release { tiles: vec![Position::new(1, 0)] };
        tx.send(AgentEvent::Peer { from: peer_info(), message }).unwrap();
        assert!(matches!(
            agent.core.next_event().await,
            Err(AgentError::ProtocolViolation { state: "disabled", message: "release" })
        ));
    }

    #[tokio::test]
    async fn percepts_forwarded_only_when_paired() {
        let (observer, mut inbox) = event_channel();
        let (mut agent, tx) = linked_agent(grid(4, 1, &[]), (0, 0), &observer);

        tx.send(AgentEvent::ParcelPercepts(vec![parcel("p1", 2, 0)])).unwrap();
        agent.core.next_event().await.unwrap();
        assert!(drain(&mut inbox).is_empty());
        assert_eq!(agent.graph().parcel_count(), 1);

        agent.core.coordination = Coordination::Paired { peer: peer_info() };
        tx.send(AgentEvent::AgentPercepts(vec![percept("x", 3.0, 0.0)])).unwrap();
        tx.send(AgentEvent::AgentPercepts(Vec::new())).unwrap();
        agent.core.next_event().await.unwrap();
        agent.core.next_event().await.unwrap();
        let sent = drain(&mut inbox);
        assert_eq!(sent.len(), 1);
        assert!(matches!(
            &sent[0],
            AgentEvent::Peer { message: Message::AgentPerceptsExchange { percepts }, .. } if percepts.len() == 1
        ));
    }

    #[tokio::test]
    async fn exchanged_percepts_update_beliefs() {
        let (observer, _inbox) = event_channel();
        let (mut agent, tx) = linked_agent(grid(4, 1, &[]), (0, 0), &observer);
        agent.core.coordination = Coordination::Paired { peer: peer_info() };

        let message = Message::AgentPerceptsExchange { percepts: vec![percept("bob", 2.0, 0.0)] };
        tx.send(AgentEvent::Peer { from: peer_info(), message }).unwrap();
        agent.core.next_event().await.unwrap();
        assert_eq!(agent.graph().agent(&"bob".into()).unwrap().position, Position::new(2, 0));
    }

    #[tokio::test]
    async fn closed_inbox_reported() {
        let (observer, _inbox) = event_channel();
        let (mut agent, tx) = linked_agent(grid(2, 1, &[]), (0, 0), &observer);
        drop(tx);
        assert!(!agent.core.next_event().await.unwrap());
        assert!(agent.core.closed);
    }
}

// ── Reconsideration and hooks ─────────────────────────────────────────────────

#[cfg(test)]
mod during_execution {
    use bdi_core::{Direction, Position};
    use bdi_deliberation::{Intention, IntentionKind};
    use bdi_execution::{ActionFailure, ActionSuccess, ExecutionControl, ExecutionHooks, MaxConsecutiveFailures};
    use bdi_planning::Action;

    use super::helpers::{grid, linked_agent, parcel};
    use crate::hooks::RunHooks;
    use crate::{event_channel, AgentEvent, ControlState, ReconsiderationPolicy};

    #[tokio::test]
    async fn new_parcel_preempts_exploration() {
        let (observer, _inbox) = event_channel();
        let (mut agent, tx) = linked_agent(grid(4, 1, &[(3, 0)]), (0, 0), &observer);
        agent.core.state = ControlState::Executing(Intention::GoTo(Position::new(3, 0)));

        tx.send(AgentEvent::ParcelPercepts(vec![parcel("p1", 1, 0)])).unwrap();
        let mut control = ExecutionControl::new();
        agent.core.drain_events(&mut control).await.unwrap();

        assert!(control.is_stopped());
        assert!(control.succeeded());
        match &agent.core.state {
            ControlState::Preempted(next) => assert_eq!(next.kind(), IntentionKind::Deliver),
            other => panic!("expected preemption, got {other}"),
        }
    }

    #[tokio::test]
    async fn bold_agents_stay_the_course() {
        let (observer, _inbox) = event_channel();
        let (mut agent, tx) = linked_agent(grid(4, 1, &[(3, 0)]), (0, 0), &observer);
        agent.core.reconsideration = ReconsiderationPolicy::Bold.build();
        agent.core.state = ControlState::Executing(Intention::GoTo(Position::new(3, 0)));

        tx.send(AgentEvent::ParcelPercepts(vec![parcel("p1", 1, 0)])).unwrap();
        let mut control = ExecutionControl::new();
        agent.core.drain_events(&mut control).await.unwrap();
        assert!(!control.is_stopped());
        assert!(matches!(agent.core.state, ControlState::Executing(_)));
    }

    #[tokio::test]
    async fn putdown_success_and_pickup_failure_clean_the_tile() {
        let (observer, _inbox) = event_channel();
        let (mut agent, _tx) = linked_agent(grid(4, 1, &[(3, 0)]), (0, 0), &observer);
        let now = agent.core.clock.now();
        agent.core.graph.apply_parcel_percepts(&[parcel("p1", 0, 0), parcel("p2", 0, 0)], now);

        let mut policy = MaxConsecutiveFailures::new(3);
        let mut hooks = RunHooks::new(&mut agent.core, &mut policy);
        let mut control = ExecutionControl::new();

        hooks.post_success(&ActionSuccess::PutDown(vec![parcel("p1", 0, 0)]), &mut control);
        assert!(!control.is_stopped());

        hooks.post_failure(&ActionFailure::PickUpFailed(vec!["p2".into()]), &mut control);
        assert!(control.is_stopped());
        assert!(!control.succeeded());

        hooks.post_success(&ActionSuccess::Moved(Direction::Right), &mut control);
        drop(hooks);
        assert_eq!(agent.graph().parcel_count(), 0);
    }

    #[tokio::test]
    async fn move_outcomes_reach_the_commitment_policy() {
        let (observer, _inbox) = event_channel();
        let (mut agent, _tx) = linked_agent(grid(4, 1, &[(3, 0)]), (0, 0), &observer);

        let mut policy = MaxConsecutiveFailures::new(2);
        let mut hooks = RunHooks::new(&mut agent.core, &mut policy);
        let mut control = ExecutionControl::new();

        hooks.post_failure(&ActionFailure::MoveFailed(Direction::Right), &mut control);
        assert!(!control.is_stopped());
        assert_eq!(control.remaining(), vec![Action::Move(Direction::Right)]);

        // A success resets the streak, so one more failure is retried too.
        hooks.post_success(&ActionSuccess::Moved(Direction::Right), &mut control);
        hooks.post_failure(&ActionFailure::MoveFailed(Direction::Right), &mut control);
        assert!(!control.is_stopped());

        hooks.post_failure(&ActionFailure::MoveFailed(Direction::Right), &mut control);
        assert!(control.is_stopped());
        assert!(!control.succeeded());
        drop(hooks);
        assert_eq!(policy.failures(), 2);
    }
}

// ── End to end ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod end_to_end {
    use std::sync::Arc;
    use std::time::Duration;

    use bdi_core::{Direction, Position};
    use bdi_execution::ExecutionControl;
    use bdi_planning::Action;

    use super::helpers::{clock, grid, percept, quiet_config};
    use crate::{event_channel, AgentBuilder, AgentConfig, ChannelPeer, LocalWorld, PeerInfo};

    async fn until(check: impl Fn() -> bool) {
        while !check() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    #[tokio::test]
    async fn returns_when_the_inbox_closes() {
        let tiles = grid(1, 1, &[]);
        let world = LocalWorld::new(tiles.clone(), "me", "me", Position::new(0, 0));
        let (mut agent, tx) = AgentBuilder::new(quiet_config(), tiles, percept("me", 0.0, 0.0))
            .world(Arc::new(world))
            .build()
            .unwrap();
        drop(tx);
        agent.run().await.unwrap();
    }

    #[tokio::test]
    async fn solo_agent_finds_and_delivers_a_parcel() {
        // The parcel is only seen after the first step of exploring.
        let tiles = grid(4, 1, &[(3, 0)]);
        let (tx, rx) = event_channel();
        let world = Arc::new(
            LocalWorld::new(tiles.clone(), "me", "me", Position::new(0, 0))
                .with_parcel("p1", Position::new(1, 0), 10.0)
                .with_events(tx.downgrade()),
        );
        let (mut agent, _inbox) = AgentBuilder::new(quiet_config(), tiles, percept("me", 0.0, 0.0))
            .world(world.clone())
            .channel(tx, rx)
            .clock(clock())
            .build()
            .unwrap();

        let delivered = tokio::time::timeout(Duration::from_secs(5), async {
            tokio::select! {
                result = agent.run() => panic!("agent stopped early: {result:?}"),
                _ = until(|| world.score() > 0.0) => {}
            }
        })
        .await;

        assert!(delivered.is_ok());
        assert_eq!(world.score(), 10.0);
        assert_eq!(world.parcels_left(), 0);
    }

    #[tokio::test]
    async fn corridor_parcel_is_picked_up_on_the_way_to_delivery() {
        // 3x1 corridor: self, parcel, delivery tile.
        let tiles = grid(3, 1, &[(2, 0)]);
        let (tx, rx) = event_channel();
        let world = Arc::new(
            LocalWorld::new(tiles.clone(), "me", "me", Position::new(0, 0))
                .with_parcel("p1", Position::new(1, 0), 10.0)
                .with_events(tx.downgrade()),
        );
        world.emit();
        let (mut agent, _inbox) = AgentBuilder::new(quiet_config(), tiles, percept("me", 0.0, 0.0))
            .world(world.clone())
            .channel(tx, rx)
            .clock(clock())
            .build()
            .unwrap();

        agent.core.drain_events(&mut ExecutionControl::new()).await.unwrap();
        let intention = agent.core.deliberate();
        let plan = agent.local.plan_now(&intention, agent.graph()).unwrap();
        assert_eq!(
            plan.actions,
            vec![
                Action::Move(Direction::Right),
                Action::PickUp("p1".into()),
                Action::Move(Direction::Right),
                Action::PutDown("p1".into()),
            ],
        );

        let delivered = tokio::time::timeout(Duration::from_secs(5), async {
            tokio::select! {
                result = agent.run() => panic!("agent stopped early: {result:?}"),
                _ = until(|| world.score() > 0.0) => {}
            }
        })
        .await;

        assert!(delivered.is_ok());
        assert_eq!(world.score(), 10.0);
        assert_eq!(world.parcels_left(), 0);
        assert_eq!(world.position(), Position::new(2, 0));
    }

    #[tokio::test]
    async fn paired_agents_reserve_their_rows_and_both_deliver() {
        // Two rows, one agent each; the middle row keeps them apart.
        let tiles = grid(5, 3, &[(4, 0), (4, 2)]);
        let config = AgentConfig { coordination: true, ..quiet_config() };

        let (a_tx, a_rx) = event_channel();
        let (b_tx, b_rx) = event_channel();
        let a_info = PeerInfo::new("alice", "alice");
        let b_info = PeerInfo::new("bob", "bob");

        let a_world = Arc::new(
            LocalWorld::new(tiles.clone(), "alice", "alice", Position::new(0, 0))
                .with_parcel("pa", Position::new(2, 0), 10.0)
                .with_events(a_tx.downgrade()),
        );
        let b_world = Arc::new(
            LocalWorld::new(tiles.clone(), "bob", "bob", Position::new(0, 2))
                .with_parcel("pb", Position::new(2, 2), 10.0)
                .with_events(b_tx.downgrade()),
        );
        a_world.emit();
        b_world.emit();

        let a_peer = ChannelPeer::new(a_info, b_tx.downgrade());
        let b_peer = ChannelPeer::new(b_info, a_tx.downgrade());

        let (mut alice, _a_inbox) = AgentBuilder::new(config.clone(), tiles.clone(), percept("alice", 0.0, 0.0))
            .world(a_world.clone())
            .peer(a_peer)
            .channel(a_tx, a_rx)
            .build()
            .unwrap();
        let (mut bob, _b_inbox) = AgentBuilder::new(config, tiles, percept("bob", 0.0, 2.0))
            .world(b_world.clone())
            .peer(b_peer)
            .channel(b_tx, b_rx)
            .build()
            .unwrap();

        let done = tokio::time::timeout(Duration::from_secs(5), async {
            tokio::select! {
                result = alice.run() => panic!("alice stopped early: {result:?}"),
                result = bob.run() => panic!("bob stopped early: {result:?}"),
                _ = until(|| a_world.score() > 0.0 && b_world.score() > 0.0) => {}
            }
        })
        .await;

        assert!(done.is_ok());
        assert!(alice.coordination().is_paired());
        assert!(bob.coordination().is_paired());
    }
}

// ── Contention ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod contention {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::Notify;

    use bdi_core::{ManualClock, Position, Timestamp};
    use bdi_execution::ExecutionControl;
    use bdi_graph::{TileKind, TileMap, TileMapBuilder};

    use super::helpers::{grid, linked_agent, peer_info, percept, quiet_config};
    use crate::{
        event_channel, Agent, AgentBuilder, AgentConfig, AgentEvent, ChannelPeer, ControlState, Coordination,
        EventReceiver, LocalWorld, Message, PeerInfo, Reply, ReserveRequest,
    };

    /// Answer the first reservation request on `inbox` with `reply`.
    async fn answer(inbox: &mut EventReceiver, reply: Reply) -> ReserveRequest {
        loop {
            match inbox.recv().await {
                Some(AgentEvent::Reserve { request, reply: tx, .. }) => {
                    tx.send(reply).unwrap();
                    return request;
                }
                Some(_) => {}
                None => panic!("inbox closed before a reservation request"),
            }
        }
    }

    async fn settle(agent: &mut Agent) {
        agent.core.drain_events(&mut ExecutionControl::new()).await.unwrap();
    }

    #[tokio::test]
    async fn rejected_step_goes_back_to_paired_and_waits_for_news() {
        let (observer, mut inbox) = event_channel();
        let (mut agent, tx) = linked_agent(grid(3, 1, &[]), (0, 0), &observer);
        agent.core.coordination = Coordination::Paired { peer: peer_info() };

        let responder = async {
            let request = answer(&mut inbox, Reply::Reject).await;
            tx.send(AgentEvent::DecayAgents).unwrap();
            request
        };
        let (stepped, request) = tokio::join!(agent.paired_step(peer_info()), responder);

        assert!(stepped.unwrap());
        assert_eq!(request.tiles, vec![Position::new(0, 0), Position::new(1, 0), Position::new(2, 0)]);
        assert_eq!(request.timestamp(), Timestamp(1_000));
        assert_eq!(agent.coordination(), &Coordination::Paired { peer: peer_info() });
        assert_eq!(agent.state(), &ControlState::Deliberating);
        assert!(agent.graph().reserved().is_empty());
        assert_eq!(agent.graph().me().position, Position::new(0, 0));
    }

    #[tokio::test]
    async fn accepted_step_releases_exactly_what_it_asked_for() {
        let (observer, mut inbox) = event_channel();
        let (mut agent, _tx) = linked_agent(grid(3, 1, &[]), (0, 0), &observer);
        agent.core.coordination = Coordination::Paired { peer: peer_info() };

        let responder = async {
            let request = answer(&mut inbox, Reply::Accept).await;
            loop {
                match inbox.recv().await {
                    Some(AgentEvent::Peer { message: Message::Release { tiles }, .. }) => return (request, tiles),
                    Some(_) => {}
                    None => panic!("inbox closed before the release"),
                }
            }
        };
        let (stepped, (request, released)) = tokio::join!(agent.paired_step(peer_info()), responder);

        assert!(stepped.unwrap());
        assert_eq!(released, request.tiles);
        assert_eq!(agent.coordination(), &Coordination::Paired { peer: peer_info() });
    }

    /// A crossing: row y=1 from x=0 to x=4 and column x=2 from y=0 to
    /// y=2.  Every route between the arms passes (2, 1).
    fn crossing() -> TileMap {
        let mut b = TileMapBuilder::new();
        for x in 0..5 {
            let kind = if x == 4 { TileKind::Delivery } else { TileKind::Spawn };
            b.add_tile(Position::new(x, 1), kind);
        }
        b.add_tile(Position::new(2, 0), TileKind::Spawn);
        b.add_tile(Position::new(2, 2), TileKind::Delivery);
        b.build()
    }

    /// Take one paired step if `working`, then keep serving the inbox until
    /// the other agent's turn is over too.
    async fn turn(agent: &mut Agent, peer: &PeerInfo, working: bool, mine: &Notify, theirs: &Notify) {
        if working {
            agent.paired_step(peer.clone()).await.unwrap();
        }
        mine.notify_one();

        let finished = theirs.notified();
        tokio::pin!(finished);
        loop {
            tokio::select! {
                _ = &mut finished => return,
                served = agent.core.next_event() => assert!(served.unwrap()),
            }
        }
    }

    async fn round(
        a: &mut Agent, a_peer: &PeerInfo, a_working: bool,
        b: &mut Agent, b_peer: &PeerInfo, b_working: bool,
    ) {
        let (a_done, b_done) = (Notify::new(), Notify::new());
        tokio::join!(
            turn(a, a_peer, a_working, &a_done, &b_done),
            turn(b, b_peer, b_working, &b_done, &a_done),
        );
    }

    #[tokio::test]
    async fn agents_sharing_a_crossing_take_turns_and_both_deliver() {
        let tiles = crossing();
        let config = AgentConfig { coordination: true, ..quiet_config() };

        let (a_tx, a_rx) = event_channel();
        let (b_tx, b_rx) = event_channel();
        let a_info = PeerInfo::new("alice", "alice");
        let b_info = PeerInfo::new("bob", "bob");

        let a_world = Arc::new(
            LocalWorld::new(tiles.clone(), "alice", "alice", Position::new(0, 1))
                .with_parcel("pa", Position::new(1, 1), 10.0)
                .with_events(a_tx.downgrade()),
        );
        let b_world = Arc::new(
            LocalWorld::new(tiles.clone(), "bob", "bob", Position::new(2, 0))
                .with_parcel("pb", Position::new(2, 0), 10.0)
                .with_events(b_tx.downgrade()),
        );
        a_world.emit();
        b_world.emit();

        let a_tx_weak = a_tx.downgrade();

        // Distinct clocks: alice always asks first.
        let (mut alice, _a_inbox) = AgentBuilder::new(config.clone(), tiles.clone(), percept("alice", 0.0, 1.0))
            .world(a_world.clone())
            .peer(ChannelPeer::new(a_info.clone(), b_tx.downgrade()))
            .channel(a_tx, a_rx)
            .clock(Arc::new(ManualClock::new(Timestamp(1_000))))
            .build()
            .unwrap();
        let (mut bob, _b_inbox) = AgentBuilder::new(config, tiles, percept("bob", 2.0, 0.0))
            .world(b_world.clone())
            .peer(ChannelPeer::new(b_info.clone(), a_tx_weak))
            .channel(b_tx, b_rx)
            .clock(Arc::new(ManualClock::new(Timestamp(2_000))))
            .build()
            .unwrap();
        alice.core.coordination = Coordination::Paired { peer: b_info.clone() };
        bob.core.coordination = Coordination::Paired { peer: a_info.clone() };

        let finished = tokio::time::timeout(Duration::from_secs(5), async {
            settle(&mut alice).await;
            settle(&mut bob).await;
            settle(&mut alice).await;

            // Both routes cross (2, 1); the earlier request wins it.
            round(&mut alice, &b_info, true, &mut bob, &a_info, true).await;
            assert!(a_world.score() > 0.0);
            assert_eq!(b_world.score(), 0.0);
            assert_eq!(b_world.position(), Position::new(2, 0));

            for _ in 0..10 {
                settle(&mut alice).await;
                settle(&mut bob).await;
                let (a_working, b_working) = (a_world.score() == 0.0, b_world.score() == 0.0);
                if !a_working && !b_working {
                    break;
                }
                round(&mut alice, &b_info, a_working, &mut bob, &a_info, b_working).await;
            }
        })
        .await;

        assert!(finished.is_ok());
        assert_eq!(a_world.score(), 10.0);
        assert_eq!(b_world.score(), 10.0);
        assert!(alice.graph().reserved().is_empty());
        assert!(bob.graph().reserved().is_empty());
        assert_eq!(alice.coordination(), &Coordination::Paired { peer: b_info });
        assert_eq!(bob.coordination(), &Coordination::Paired { peer: a_info });
    }
}
