//! The plan executor and the hook seam it drives.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, trace};

use bdi_planning::{Action, Plan};

use crate::commitment::Commitment;
use crate::control::ExecutionControl;
use crate::outcome::{ActionFailure, ActionSuccess};
use crate::world::World;

// ── ExecutionHooks ────────────────────────────────────────────────────────────

/// Callbacks the executor makes around each action.
///
/// A failure halts the loop before [`post_failure`](Self::post_failure)
/// runs; the hook must call [`ExecutionControl::resume`] (or `add_front`)
/// for execution to continue.
#[async_trait]
pub trait ExecutionHooks: Send {
    /// Runs before each action is popped.  May stop the run.
    async fn between_steps(&mut self, _control: &mut ExecutionControl) {}

    /// Runs after an action is popped and before it is dispatched.
    fn handle_pre(&mut self, _action: &Action, _control: &mut ExecutionControl) {}

    fn post_success(&mut self, outcome: &ActionSuccess, control: &mut ExecutionControl);

    fn post_failure(&mut self, outcome: &ActionFailure, control: &mut ExecutionControl);
}

/// Hooks that hand move outcomes to a [`Commitment`] and stop the run on
/// any pickup or putdown failure.
pub struct CommitmentHooks<'a> {
    pub commitment: &'a mut dyn Commitment,
}

impl<'a> CommitmentHooks<'a> {
    pub fn new(commitment: &'a mut dyn Commitment) -> Self {
        Self { commitment }
    }
}

#[async_trait]
impl<'a> ExecutionHooks for CommitmentHooks<'a> {
    fn handle_pre(&mut self, action: &Action, control: &mut ExecutionControl) {
        self.commitment.pre_action(action, control);
    }

    fn post_success(&mut self, outcome: &ActionSuccess, control: &mut ExecutionControl) {
        if let ActionSuccess::Moved(d) = outcome {
            self.commitment.post_success(*d, control);
        }
    }

    fn post_failure(&mut self, outcome: &ActionFailure, control: &mut ExecutionControl) {
        match outcome {
            ActionFailure::MoveFailed(d) => self.commitment.post_failure(*d, control),
            _ => control.stop(false),
        }
    }
}

// ── PlanExecutor ──────────────────────────────────────────────────────────────

/// Runs plans one action at a time against a [`World`].
#[derive(Debug, Default)]
pub struct PlanExecutor {
    control: ExecutionControl,
}

impl PlanExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn control(&self) -> &ExecutionControl {
        &self.control
    }

    /// Load `plan` and run until the queue drains (success) or a hook
    /// leaves the run stopped.  Returns the outcome flag.
    pub async fn execute<W, H>(&mut self, plan: Plan, world: &W, hooks: &mut H) -> bool
    where
        W: World + ?Sized,
        H: ExecutionHooks + ?Sized,
    {
        let ctl = &mut self.control;
        ctl.load(plan);
        debug!(actions = ctl.len(), "executing plan");

        while !ctl.is_stopped() {
            hooks.between_steps(ctl).await;
            if ctl.is_stopped() {
                break;
            }

            let Some(action) = ctl.pop_front() else {
                ctl.stop(true);
                break;
            };

            hooks.handle_pre(&action, ctl);
            trace!(%action, "dispatching");

            match action {
                Action::Move(d) => {
                    if world.move_to(d).await {
                        hooks.post_success(&ActionSuccess::Moved(d), ctl);
                    } else {
                        ctl.halt();
                        hooks.post_failure(&ActionFailure::MoveFailed(d), ctl);
                    }
                }
                Action::PickUp(id) => {
                    let picked = world.pickup().await;
                    if picked.iter().any(|p| p.id == id) {
                        hooks.post_success(&ActionSuccess::PickedUp(picked), ctl);
                    } else {
                        ctl.halt();
                        hooks.post_failure(&ActionFailure::PickUpFailed(vec![id]), ctl);
                    }
                }
                Action::PutDown(id) => {
                    let dropped = world.putdown(std::slice::from_ref(&id)).await;
                    if dropped.iter().any(|p| p.id == id) {
                        hooks.post_success(&ActionSuccess::PutDown(dropped), ctl);
                    } else {
                        ctl.halt();
                        hooks.post_failure(&ActionFailure::PutDownFailed(vec![id]), ctl);
                    }
                }
                Action::Wait(ms) => tokio::time::sleep(Duration::from_millis(ms)).await,
            }
        }

        debug!(success = ctl.succeeded(), left = ctl.len(), "execution finished");
        ctl.succeeded()
    }
}
