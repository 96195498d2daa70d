//! The executor's mutable state, handed to every hook.

use std::collections::VecDeque;

use bdi_planning::{Action, Plan};

/// Action deque plus the stop and outcome flags.
///
/// Hooks receive `&mut ExecutionControl` and steer the run through it:
/// splice corrective actions in front, resume after a failure, or stop.
#[derive(Debug, Default)]
pub struct ExecutionControl {
    queue:   VecDeque<Action>,
    stopped: bool,
    success: bool,
}

impl ExecutionControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the queue with `plan` and clear both flags.
    pub(crate) fn load(&mut self, plan: Plan) {
        self.queue.clear();
        self.queue.extend(plan);
        self.stopped = false;
        self.success = false;
    }

    pub(crate) fn pop_front(&mut self) -> Option<Action> {
        self.queue.pop_front()
    }

    /// Halt without touching the queue or the outcome.
    pub(crate) fn halt(&mut self) {
        self.stopped = true;
    }

    /// Let the loop continue with whatever is queued.
    pub fn resume(&mut self) {
        self.stopped = false;
    }

    /// Push `action` to run next, and resume.
    pub fn add_front(&mut self, action: Action) {
        self.queue.push_front(action);
        self.stopped = false;
    }

    /// Drop every queued action and halt with the given outcome.
    pub fn stop(&mut self, success: bool) {
        self.queue.clear();
        self.stopped = true;
        self.success = success;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn succeeded(&self) -> bool {
        self.success
    }

    /// Snapshot of the actions still queued, front first.
    pub fn remaining(&self) -> Vec<Action> {
        self.queue.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
