//! Periodic timer tasks.  They only enqueue events; the control loop does
//! the work.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::event::{AgentEvent, WeakEventSender};

/// Send `make()` every `period_ms` until the inbox closes.  The first tick
/// fires one period after spawning.
pub(crate) fn spawn_ticker(
    events: WeakEventSender,
    period_ms: u64,
    make: fn() -> AgentEvent,
) -> JoinHandle<()> {
    let period = Duration::from_millis(period_ms.max(1));
    tokio::spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let Some(tx) = events.upgrade() else { break };
            if tx.send(make()).is_err() {
                break;
            }
        }
    })
}
