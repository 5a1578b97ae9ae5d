//! Start/stop lifecycle around a [`PeriodicDriver`], with a fresh
//! cancellation scope per `start`.

use std::sync::{Arc, Mutex};

use remote::RemoteItemClient;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::driver::PeriodicDriver;

struct Running {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// `Start` is a no-op while already running; `Stop` cancels and waits for
/// the driver task to exit, then clears the slot so a later `Start` begins
/// a fresh scope.
pub struct JobSupervisor<C: RemoteItemClient + 'static> {
    driver: Arc<PeriodicDriver<C>>,
    running: Mutex<Option<Running>>,
}

impl<C: RemoteItemClient + 'static> JobSupervisor<C> {
    pub fn new(driver: PeriodicDriver<C>) -> Self {
        JobSupervisor {
            driver: Arc::new(driver),
            running: Mutex::new(None),
        }
    }

    /// Derives a child of `parent` and spawns the driver on it. No-op if
    /// already running.
    pub fn start(&self, parent: &CancellationToken) {
        let mut slot = self.running.lock().unwrap();
        if slot.is_some() {
            tracing::debug!("start called while already running, ignoring");
            return;
        }
        let cancel = parent.child_token();
        let driver = Arc::clone(&self.driver);
        let run_token = cancel.clone();
        let handle = tokio::spawn(async move { driver.run(run_token).await });
        *slot = Some(Running { cancel, handle });
        tracing::info!("job supervisor started");
    }

    /// Signals cancellation and waits for the driver task to exit. No-op if
    /// not running.
    pub async fn stop(&self) {
        let running = self.running.lock().unwrap().take();
        if let Some(Running { cancel, handle }) = running {
            cancel.cancel();
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "periodic driver task panicked");
            }
            tracing::info!("job supervisor stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.lock().unwrap().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciler::Reconciler;
    use remote::{InMemoryRemoteStore, SharedToken};
    use std::time::Duration;
    use store::LocalStore;

    fn new_supervisor() -> JobSupervisor<InMemoryRemoteStore> {
        let token = SharedToken::new();
        let remote = InMemoryRemoteStore::new(token);
        let local = Arc::new(LocalStore::new());
        let reconciler = Arc::new(Reconciler::new(local, Arc::new(remote), Duration::from_secs(1)));
        let driver = PeriodicDriver::new(reconciler, Duration::from_secs(3600));
        JobSupervisor::new(driver)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn start_stop_start_again() {
        let supervisor = new_supervisor();
        let root = CancellationToken::new();

        supervisor.start(&root);
        assert!(supervisor.is_running());

        supervisor.stop().await;
        assert!(!supervisor.is_running());

        supervisor.start(&root);
        assert!(supervisor.is_running());
        supervisor.stop().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn double_start_is_idempotent() {
        let supervisor = new_supervisor();
        let root = CancellationToken::new();

        supervisor.start(&root);
        supervisor.start(&root);
        assert!(supervisor.is_running());

        supervisor.stop().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn cancelling_the_root_scope_stops_the_driver() {
        let supervisor = new_supervisor();
        let root = CancellationToken::new();
        supervisor.start(&root);

        root.cancel();
        tokio::time::sleep(Duration::from_millis(50)).await;

        // The driver task has exited on its own; an explicit stop still
        // joins it cleanly without hanging.
        tokio::time::timeout(Duration::from_secs(1), supervisor.stop())
            .await
            .expect("stop should not hang after external cancellation");
    }
}
