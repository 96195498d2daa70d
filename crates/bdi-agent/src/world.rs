//! In-memory world for a single agent.
//!
//! `LocalWorld` keeps the true position, the parcels and the score behind a
//! mutex and answers [`World`] calls against the tile map.  After every
//! accepted action it pushes a self percept and a full parcel percept to
//! the agent's inbox, the way a game server would.

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use bdi_core::{AgentId, Direction, ParcelId, PerceptPosition, Position};
use bdi_execution::World;
use bdi_graph::{AgentPercept, ParcelPercept, ParcelReport, TileKind, TileMap};

use crate::event::{AgentEvent, WeakEventSender};

#[derive(Debug, Clone)]
struct LocalParcel {
    id:       ParcelId,
    position: Position,
    reward:   f64,
    carried:  bool,
}

#[derive(Debug)]
struct WorldState {
    position: Position,
    score:    f64,
    parcels:  Vec<LocalParcel>,
    blocked:  BTreeSet<Position>,
}

pub struct LocalWorld {
    tiles:      TileMap,
    id:         AgentId,
    name:       String,
    state:      Mutex<WorldState>,
    events:     Option<WeakEventSender>,
    step_delay: Duration,
}

fn percept_position(p: Position) -> PerceptPosition {
    PerceptPosition::new(f64::from(p.x), f64::from(p.y))
}

impl LocalWorld {
    /// World with self standing at `start`.
    pub fn new(tiles: TileMap, id: impl Into<AgentId>, name: impl Into<String>, start: Position) -> Self {
        Self {
            tiles,
            id:    id.into(),
            name:  name.into(),
            state: Mutex::new(WorldState {
                position: start,
                score:    0.0,
                parcels:  Vec::new(),
                blocked:  BTreeSet::new(),
            }),
            events:     None,
            step_delay: Duration::ZERO,
        }
    }

    pub fn with_parcel(self, id: &str, at: Position, reward: f64) -> Self {
        self.lock().parcels.push(LocalParcel { id: ParcelId::new(id), position: at, reward, carried: false });
        self
    }

    /// Inbox to report percepts to.
    pub fn with_events(mut self, events: WeakEventSender) -> Self {
        self.events = Some(events);
        self
    }

    /// Time each move takes.  Zero still yields to the runtime.
    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    /// Make moves onto `pos` fail, as if something stood there.
    pub fn block(&self, pos: Position) {
        self.lock().blocked.insert(pos);
    }

    pub fn unblock(&self, pos: Position) {
        self.lock().blocked.remove(&pos);
    }

    pub fn position(&self) -> Position {
        self.lock().position
    }

    pub fn score(&self) -> f64 {
        self.lock().score
    }

    pub fn parcels_left(&self) -> usize {
        self.lock().parcels.len()
    }

    pub fn carried(&self) -> Vec<ParcelId> {
        self.lock().parcels.iter().filter(|p| p.carried).map(|p| p.id.clone()).collect()
    }

    pub fn self_percept(&self) -> AgentPercept {
        let state = self.lock();
        AgentPercept {
            id:       self.id.clone(),
            name:     self.name.clone(),
            position: percept_position(state.position),
            score:    state.score as i64,
        }
    }

    pub fn parcel_percepts(&self) -> Vec<ParcelPercept> {
        let state = self.lock();
        state.parcels.iter().map(|p| self.report(p)).collect()
    }

    /// Push the current self and parcel percepts to the inbox.
    pub fn emit(&self) {
        let Some(tx) = self.events.as_ref().and_then(|w| w.upgrade()) else { return };
        // A closed inbox means the agent is gone; nothing left to tell.
        let _ = tx.send(AgentEvent::SelfPercept(self.self_percept()));
        let _ = tx.send(AgentEvent::ParcelPercepts(self.parcel_percepts()));
    }

    fn lock(&self) -> MutexGuard<'_, WorldState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn report(&self, p: &LocalParcel) -> ParcelReport {
        ParcelReport {
            id:         p.id.clone(),
            position:   percept_position(p.position),
            reward:     p.reward,
            carried_by: p.carried.then(|| self.id.clone()),
        }
    }

    async fn pause(&self) {
        if self.step_delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.step_delay).await;
        }
    }
}

#[async_trait]
impl World for LocalWorld {
    async fn move_to(&self, direction: Direction) -> bool {
        self.pause().await;
        let accepted = {
            let mut state = self.lock();
            let target = state.position.step(direction);
            let open = self.tiles.tile_at(target).is_some() && !state.blocked.contains(&target);
            if open {
                state.position = target;
                for p in state.parcels.iter_mut().filter(|p| p.carried) {
                    p.position = target;
                }
            }
            open
        };
        debug!(%direction, accepted, "move");
        if accepted {
            self.emit();
        }
        accepted
    }

    async fn pickup(&self) -> Vec<ParcelReport> {
        let picked: Vec<ParcelReport> = {
            let mut state = self.lock();
            let here = state.position;
            let mut picked = Vec::new();
            for p in state.parcels.iter_mut().filter(|p| !p.carried && p.position == here) {
                p.carried = true;
                picked.push(p.clone());
            }
            picked.iter().map(|p| self.report(p)).collect()
        };
        self.emit();
        picked
    }

    async fn putdown(&self, ids: &[ParcelId]) -> Vec<ParcelReport> {
        let dropped: Vec<ParcelReport> = {
            let mut state = self.lock();
            let here = state.position;
            let on_delivery = self
                .tiles
                .tile_at(here)
                .is_some_and(|t| self.tiles.kind(t) == TileKind::Delivery);

            let mut dropped = Vec::new();
            for p in state.parcels.iter_mut().filter(|p| p.carried && ids.contains(&p.id)) {
                p.carried = false;
                dropped.push(p.clone());
            }
            if on_delivery {
                let delivered: f64 = dropped.iter().map(|p| p.reward).sum();
                state.score += delivered;
                state.parcels.retain(|p| !dropped.iter().any(|d| d.id == p.id));
            }
            dropped.iter().map(|p| self.report(p)).collect()
        };
        self.emit();
        dropped
    }
}
