//! Fixed-interval ticker that drives the [`Reconciler`] until cancelled.

use std::sync::Arc;
use std::time::Duration;

use remote::{Error, RemoteItemClient};
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::reconciler::Reconciler;

/// Default sync interval, per the configuration default (§6).
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

pub struct PeriodicDriver<C: RemoteItemClient> {
    reconciler: Arc<Reconciler<C>>,
    interval: Duration,
}

impl<C: RemoteItemClient> PeriodicDriver<C> {
    pub fn new(reconciler: Arc<Reconciler<C>>, interval: Duration) -> Self {
        PeriodicDriver { reconciler, interval }
    }

    /// Runs until `cancel` fires or the token expires. Waits a full
    /// `interval` before the first pass (`interval_at` with a first deadline
    /// one interval out, since `tokio::time::interval` alone fires its first
    /// tick immediately). A tick that lands while the previous pass is still
    /// running is dropped rather than queued (`MissedTickBehavior::Skip`).
    /// Cancellation is also raced against an in-flight pass, so it aborts
    /// promptly instead of waiting out the current reconcile.
    ///
    /// An `Unauthenticated` result ends the loop silently rather than
    /// retrying: token expiry is not detected ahead of time, so the next
    /// tick would just fail the same way until the user logs in again and
    /// restarts sync (§7).
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("periodic driver cancelled");
                    return;
                }
                _ = ticker.tick() => {}
            }

            tracing::debug!("reconcile tick");
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("periodic driver cancelled mid-pass");
                    return;
                }
                result = self.reconciler.reconcile() => {
                    match result {
                        Ok(()) => {}
                        Err(Error::Unauthenticated) => {
                            tracing::info!("token rejected, ending background sync silently");
                            return;
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "reconcile pass failed");
                        }
                    }
                }
            }
        }
    }
}
