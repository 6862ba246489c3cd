//! Battery status stream.
//!
//! Single-subscriber, latest-value delivery: the sink is a watch slot
//! that each tick overwrites, so a slow or absent consumer never
//! blocks the producer. The monitor loop is independent of this one;
//! both read the provider on their own cadence.

use std::sync::Arc;
use std::time::Duration;

use log::debug;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

use crate::battery::BatteryReport;
use crate::provider::SystemStateProvider;

pub const DEFAULT_STREAM_PERIOD: Duration = Duration::from_secs(30);

/// Owns the battery stream loop and its single subscriber slot.
pub struct BatteryStream<P: SystemStateProvider> {
    provider: Arc<P>,
    period: Duration,
    active: Option<ActiveSink>,
}

struct ActiveSink {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl<P: SystemStateProvider + 'static> BatteryStream<P> {
    pub fn new(provider: Arc<P>, period: Duration) -> Self {
        BatteryStream {
            provider,
            period,
            active: None,
        }
    }

    /// Arm the loop and return the receiving end of the sink slot.
    ///
    /// Replaces any prior subscriber: the old loop is fully cancelled
    /// before the new one is armed, so loops never overlap. The first
    /// delivery lands on the loop's first tick, not at subscribe time.
    pub async fn subscribe(&mut self) -> watch::Receiver<Option<BatteryReport>> {
        self.unsubscribe().await;

        let (report_tx, report_rx) = watch::channel(None);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let provider = Arc::clone(&self.provider);
        let period = self.period;

        let task = tokio::spawn(async move {
            let mut ticks = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = ticks.tick() => {
                        let snapshot = provider.snapshot();
                        let report = BatteryReport::from_snapshot(&snapshot);
                        if report_tx.send(Some(report)).is_err() {
                            debug!("battery sink dropped, stopping stream loop");
                            break;
                        }
                    }
                    _ = &mut shutdown_rx => {
                        debug!("battery stream loop stopped");
                        break;
                    }
                }
            }
        });

        self.active = Some(ActiveSink {
            shutdown: shutdown_tx,
            task,
        });
        report_rx
    }

    /// Stop the loop and clear the sink. Idempotent.
    pub async fn unsubscribe(&mut self) {
        if let Some(active) = self.active.take() {
            let _ = active.shutdown.send(());
            let _ = active.task.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChargeMethod, StatusSnapshot};

    struct StaticProvider(StatusSnapshot);

    impl SystemStateProvider for StaticProvider {
        fn snapshot(&self) -> StatusSnapshot {
            self.0
        }
    }

    fn charging(pct: i32) -> StatusSnapshot {
        StatusSnapshot {
            media_active: false,
            battery_pct: pct,
            is_charging: true,
            charge_method: ChargeMethod::Usb,
        }
    }

    fn stream(pct: i32) -> BatteryStream<StaticProvider> {
        BatteryStream::new(
            Arc::new(StaticProvider(charging(pct))),
            Duration::from_secs(30),
        )
    }

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn first_delivery_lands_on_first_tick() {
        let mut stream = stream(42);
        let mut rx = stream.subscribe().await;

        // Nothing is delivered at subscribe time.
        assert!(rx.borrow().is_none());

        settle().await;
        assert!(rx.has_changed().unwrap());
        let report = rx.borrow_and_update().clone().unwrap();
        assert_eq!(report.snapshot.battery_pct, 42);
        assert!(report.snapshot.is_charging);

        stream.unsubscribe().await;
    }

    #[tokio::test(start_paused = true)]
    async fn delivers_on_the_period() {
        let mut stream = stream(42);
        let mut rx = stream.subscribe().await;
        settle().await;
        let _ = rx.borrow_and_update();

        tokio::time::advance(Duration::from_secs(30)).await;
        settle().await;
        assert!(rx.has_changed().unwrap());

        stream.unsubscribe().await;
    }

    #[tokio::test(start_paused = true)]
    async fn resubscribe_replaces_prior_sink() {
        let mut stream = stream(42);
        let mut first = stream.subscribe().await;
        settle().await;
        let _ = first.borrow_and_update();

        let mut second = stream.subscribe().await;
        settle().await;

        // The prior loop is gone: its sender side was dropped, and only
        // the new sink sees deliveries.
        assert!(first.has_changed().is_err());
        assert!(second.borrow_and_update().is_some());

        tokio::time::advance(Duration::from_secs(30)).await;
        settle().await;
        assert!(second.has_changed().unwrap());

        stream.unsubscribe().await;
    }

    #[tokio::test(start_paused = true)]
    async fn unsubscribe_stops_the_loop() {
        let mut stream = stream(42);
        let mut rx = stream.subscribe().await;
        settle().await;
        let _ = rx.borrow_and_update();

        stream.unsubscribe().await;
        tokio::time::advance(Duration::from_secs(90)).await;
        settle().await;

        // Sender side is gone, no further values arrive.
        assert!(rx.has_changed().is_err());

        // Idempotent.
        stream.unsubscribe().await;
    }
}
