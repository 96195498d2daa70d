//! Execution hooks for one plan run.

use async_trait::async_trait;
use tracing::{debug, error, warn};

use bdi_core::ParcelId;
use bdi_execution::{ActionFailure, ActionSuccess, Commitment, CommitmentHooks, ExecutionControl, ExecutionHooks};
use bdi_planning::Action;

use crate::control::AgentCore;
use crate::AgentError;

/// [`CommitmentHooks`] plus the agent's own bookkeeping: keeps the belief
/// graph in step with pickups and putdowns and serves the inbox between
/// steps.
pub(crate) struct RunHooks<'a> {
    core:       &'a mut AgentCore,
    policy:     CommitmentHooks<'a>,
    /// A fatal error raised while serving the inbox mid-run.
    error:      Option<AgentError>,
}

impl<'a> RunHooks<'a> {
    pub(crate) fn new(core: &'a mut AgentCore, commitment: &'a mut dyn Commitment) -> Self {
        Self { core, policy: CommitmentHooks::new(commitment), error: None }
    }

    pub(crate) fn into_error(self) -> Option<AgentError> {
        self.error
    }
}

#[async_trait]
impl<'a> ExecutionHooks for RunHooks<'a> {
    async fn between_steps(&mut self, control: &mut ExecutionControl) {
        if let Err(e) = self.core.drain_events(control).await {
            error!(error = %e, "stopping the run");
            control.stop(false);
            self.error = Some(e);
        }
    }

    fn handle_pre(&mut self, action: &Action, control: &mut ExecutionControl) {
        debug!(%action, "pre");
        self.policy.handle_pre(action, control);
    }

    fn post_success(&mut self, outcome: &ActionSuccess, control: &mut ExecutionControl) {
        debug!(%outcome, remaining = control.len(), "action succeeded");
        // No percept reports delivered parcels; the next parcel percept
        // reports a pickup.
        if let ActionSuccess::PutDown(parcels) = outcome {
            let ids: Vec<ParcelId> = parcels.iter().map(|p| p.id.clone()).collect();
            self.core.graph.remove_parcels_at_me(&ids);
        }
        self.policy.post_success(outcome, control);
    }

    fn post_failure(&mut self, outcome: &ActionFailure, control: &mut ExecutionControl) {
        warn!(%outcome, "action failed");
        if let ActionFailure::PickUpFailed(ids) | ActionFailure::PutDownFailed(ids) = outcome {
            self.core.graph.remove_parcels_at_me(ids);
        }
        self.policy.post_failure(outcome, control);
    }
}
