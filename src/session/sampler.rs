use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use super::orchestrator::{EventSender, SessionEvent};

/// Periodic speaking-rate sampler
///
/// Sends a tick into the orchestrator mailbox on a fixed interval while the
/// session is active. The orchestrator computes the actual metrics: the
/// sampler never reads or writes session state itself.
pub(crate) struct MetricSampler;

impl MetricSampler {
    pub(crate) fn spawn(
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
        events: EventSender,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // First tick of a tokio interval fires immediately; the session
            // just started, so discard it.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if !events.send(SessionEvent::Tick).await {
                            break;
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }

            info!("Metric sampler stopped");
        })
    }
}
