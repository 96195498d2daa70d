//! The world interface the executor dispatches to.

use async_trait::async_trait;

use bdi_core::{Direction, ParcelId};
use bdi_graph::ParcelReport;

/// Actions the agent can take in the world.  Each call is one request/reply
/// round trip.
#[async_trait]
pub trait World: Send + Sync {
    /// Step one tile; `false` if the world refused the move.
    async fn move_to(&self, direction: Direction) -> bool;

    /// Pick up everything on the current tile; returns what was picked up.
    async fn pickup(&self) -> Vec<ParcelReport>;

    /// Put down the given parcels; returns what was put down.
    async fn putdown(&self, ids: &[ParcelId]) -> Vec<ParcelReport>;
}
