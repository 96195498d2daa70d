//! Commitment policies: how a run reacts to move outcomes.
//!
//! Both policies only see moves.  They are built fresh for every plan, so
//! their counters and stacks never leak from one run into the next.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{debug, info, warn};

use bdi_core::{Clock, Direction, Timestamp};
use bdi_planning::Action;

use crate::control::ExecutionControl;

pub trait Commitment: Send {
    fn pre_action(&mut self, _action: &Action, _control: &mut ExecutionControl) {}

    fn post_success(&mut self, moved: Direction, control: &mut ExecutionControl);

    /// Called with the run halted; leaving it halted ends the run unsuccessfully.
    fn post_failure(&mut self, failed: Direction, control: &mut ExecutionControl);
}

// ── BacktrackCommitment ───────────────────────────────────────────────────────

#[derive(Debug)]
enum Phase {
    /// Inverses of the most recent successful moves, newest first.
    Advancing { reversed: VecDeque<Direction> },
    /// Inverses still to replay, next first.
    Backtracking { backtracks: VecDeque<Direction> },
}

/// On a failed move, walk back along the last few moves, replay them, and
/// retry.  Gives up once too many failures land inside a time window.
pub struct BacktrackCommitment {
    delay_ms:     u64,
    depth:        usize,
    max_failures: usize,
    within_ms:    u64,
    phase:        Phase,
    failures:     VecDeque<Timestamp>,
    clock:        Arc<dyn Clock>,
}

impl BacktrackCommitment {
    pub const DEFAULT_DELAY_MS: u64 = 1000;
    pub const DEFAULT_DEPTH: usize = 5;
    pub const DEFAULT_MAX_FAILURES: usize = 3;
    pub const DEFAULT_WITHIN_MS: u64 = 1000;

    pub fn new(
        delay_ms: u64,
        depth: usize,
        max_failures: usize,
        within_ms: u64,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            delay_ms,
            depth,
            max_failures,
            within_ms,
            phase: Phase::Advancing { reversed: VecDeque::with_capacity(depth) },
            failures: VecDeque::new(),
            clock,
        }
    }

    pub fn with_defaults(clock: Arc<dyn Clock>) -> Self {
        Self::new(
            Self::DEFAULT_DELAY_MS,
            Self::DEFAULT_DEPTH,
            Self::DEFAULT_MAX_FAILURES,
            Self::DEFAULT_WITHIN_MS,
            clock,
        )
    }

    pub fn is_backtracking(&self) -> bool {
        matches!(self.phase, Phase::Backtracking { .. })
    }

    /// Record a failure at `now` and report whether the window is full.
    fn too_many_failures(&mut self, now: Timestamp) -> bool {
        self.failures.push_back(now);
        while self
            .failures
            .front()
            .is_some_and(|&t| now.since(t) > self.within_ms)
        {
            self.failures.pop_front();
        }
        self.failures.len() >= self.max_failures
    }
}

impl Commitment for BacktrackCommitment {
    fn post_success(&mut self, moved: Direction, control: &mut ExecutionControl) {
        match &mut self.phase {
            Phase::Advancing { reversed } => {
                if self.depth == 0 {
                    return;
                }
                if reversed.len() >= self.depth {
                    reversed.pop_back();
                }
                reversed.push_front(moved.inverse());
            }
            Phase::Backtracking { backtracks } => {
                // Replay the step just undone once the walk back is over.
                control.add_front(Action::Move(moved.inverse()));
                if let Some(next) = backtracks.pop_front() {
                    control.add_front(Action::Move(next));
                } else {
                    info!("backtrack complete, advancing again");
                    self.phase = Phase::Advancing { reversed: VecDeque::with_capacity(self.depth) };
                }
            }
        }
    }

    fn post_failure(&mut self, failed: Direction, control: &mut ExecutionControl) {
        let now = self.clock.now();
        if self.too_many_failures(now) {
            warn!(
                failures = self.failures.len(),
                within_ms = self.within_ms,
                "too many failed moves, giving up"
            );
            return;
        }

        control.add_front(Action::Move(failed));
        match &mut self.phase {
            Phase::Advancing { reversed } => {
                let mut backtracks = std::mem::take(reversed);
                if let Some(first) = backtracks.pop_front() {
                    debug!(depth = backtracks.len() + 1, "move {failed} failed, backtracking");
                    control.add_front(Action::Move(first));
                    self.phase = Phase::Backtracking { backtracks };
                } else {
                    debug!("move {failed} failed with nothing to undo, waiting");
                    control.add_front(Action::Wait(self.delay_ms));
                }
            }
            Phase::Backtracking { .. } => {
                debug!("move {failed} failed while backtracking, waiting");
                control.add_front(Action::Wait(self.delay_ms));
            }
        }
        control.resume();
    }
}

// ── MaxConsecutiveFailures ────────────────────────────────────────────────────

/// Retry a failed move until `max` failures in a row; any success resets
/// the count.
#[derive(Debug, Clone)]
pub struct MaxConsecutiveFailures {
    max:      u32,
    failures: u32,
}

impl MaxConsecutiveFailures {
    pub fn new(max: u32) -> Self {
        Self { max, failures: 0 }
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }
}

impl Commitment for MaxConsecutiveFailures {
    fn post_success(&mut self, _moved: Direction, _control: &mut ExecutionControl) {
        self.failures = 0;
    }

    fn post_failure(&mut self, failed: Direction, control: &mut ExecutionControl) {
        self.failures += 1;
        if self.failures < self.max {
            debug!(attempt = self.failures, "retrying {failed}");
            control.add_front(Action::Move(failed));
            control.resume();
        } else {
            warn!(failures = self.failures, "move {failed} keeps failing, stopping");
            control.stop(false);
        }
    }
}
