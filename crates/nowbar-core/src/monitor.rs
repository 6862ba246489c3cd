//! Presentation monitor loop.
//!
//! Fixed-period driver: every tick reads the system state provider and
//! lets the presentation controller reconcile what is on screen. The
//! controller is owned by the spawned task, so all presentation state
//! mutation is serialized there.

use std::time::Duration;

use log::debug;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::presenter::{DisplayHost, PresentationController};
use crate::provider::SystemStateProvider;

pub const DEFAULT_MONITOR_PERIOD: Duration = Duration::from_secs(5);

/// Handle to the running monitor loop.
pub struct ServiceMonitor {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ServiceMonitor {
    /// Spawn the loop. The first tick fires immediately.
    pub fn start<P, H>(
        provider: P,
        mut controller: PresentationController<H>,
        period: Duration,
    ) -> Self
    where
        P: SystemStateProvider + 'static,
        H: DisplayHost + Send + 'static,
        H::Handle: Send,
    {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let mut ticks = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = ticks.tick() => {
                        let snapshot = provider.snapshot();
                        controller.tick(&snapshot);
                    }
                    // Resolves on stop() or when the handle is dropped.
                    _ = &mut shutdown_rx => {
                        controller.hide();
                        debug!("monitor loop stopped");
                        break;
                    }
                }
            }
        });
        ServiceMonitor {
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }

    /// Stop the loop and drive the presentation back to hidden.
    ///
    /// Idempotent. Once this returns, no further tick runs.
    pub async fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OverlayRejected;
    use crate::types::{ChargeMethod, DisplayContent, StatusSnapshot};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct HostState {
        overlay: bool,
        notification: bool,
    }

    /// Host whose screen state can be observed after the controller
    /// moves into the loop task.
    #[derive(Clone, Default)]
    struct SharedHost {
        state: Arc<Mutex<HostState>>,
    }

    impl DisplayHost for SharedHost {
        type Handle = ();

        fn overlay_capable(&self) -> bool {
            true
        }

        fn show_overlay(&mut self, _content: &DisplayContent) -> Result<(), OverlayRejected> {
            self.state.lock().unwrap().overlay = true;
            Ok(())
        }

        fn update_overlay(&mut self, _handle: &mut (), _content: &DisplayContent) {}

        fn remove_overlay(&mut self, _handle: ()) {
            self.state.lock().unwrap().overlay = false;
        }

        fn post_notification(&mut self, _content: &DisplayContent) {
            self.state.lock().unwrap().notification = true;
        }

        fn cancel_notification(&mut self) {
            self.state.lock().unwrap().notification = false;
        }
    }

    #[derive(Clone)]
    struct FlagProvider {
        snapshot: Arc<Mutex<StatusSnapshot>>,
        reads: Arc<AtomicUsize>,
    }

    impl FlagProvider {
        fn new(snapshot: StatusSnapshot) -> Self {
            FlagProvider {
                snapshot: Arc::new(Mutex::new(snapshot)),
                reads: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl SystemStateProvider for FlagProvider {
        fn snapshot(&self) -> StatusSnapshot {
            self.reads.fetch_add(1, Ordering::SeqCst);
            *self.snapshot.lock().unwrap()
        }
    }

    fn media() -> StatusSnapshot {
        StatusSnapshot {
            media_active: true,
            battery_pct: 80,
            is_charging: false,
            charge_method: ChargeMethod::None,
        }
    }

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_is_immediate_then_periodic() {
        let provider = FlagProvider::new(media());
        let host = SharedHost::default();
        let mut monitor = ServiceMonitor::start(
            provider.clone(),
            PresentationController::new(host.clone()),
            Duration::from_secs(5),
        );

        settle().await;
        assert_eq!(provider.reads.load(Ordering::SeqCst), 1);
        assert!(host.state.lock().unwrap().overlay);

        tokio::time::advance(Duration::from_secs(5)).await;
        settle().await;
        assert_eq!(provider.reads.load(Ordering::SeqCst), 2);

        monitor.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_drives_presentation_hidden() {
        let provider = FlagProvider::new(media());
        let host = SharedHost::default();
        let mut monitor = ServiceMonitor::start(
            provider.clone(),
            PresentationController::new(host.clone()),
            Duration::from_secs(5),
        );

        settle().await;
        assert!(host.state.lock().unwrap().overlay);

        monitor.stop().await;
        {
            let state = host.state.lock().unwrap();
            assert!(!state.overlay);
            assert!(!state.notification);
        }

        // No ticks after stop returns, and stop is idempotent.
        let reads = provider.reads.load(Ordering::SeqCst);
        tokio::time::advance(Duration::from_secs(30)).await;
        settle().await;
        assert_eq!(provider.reads.load(Ordering::SeqCst), reads);
        monitor.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn state_change_is_picked_up_on_next_tick() {
        let provider = FlagProvider::new(media());
        let host = SharedHost::default();
        let mut monitor = ServiceMonitor::start(
            provider.clone(),
            PresentationController::new(host.clone()),
            Duration::from_secs(5),
        );

        settle().await;
        assert!(host.state.lock().unwrap().overlay);

        *provider.snapshot.lock().unwrap() = StatusSnapshot::default();
        tokio::time::advance(Duration::from_secs(5)).await;
        settle().await;
        assert!(!host.state.lock().unwrap().overlay);

        monitor.stop().await;
    }
}
