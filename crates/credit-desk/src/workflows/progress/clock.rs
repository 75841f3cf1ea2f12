//! Periodic tick sources for progress runs.
//!
//! A [`Ticker`] never touches run state itself. It only delivers [`RunHandle`]s into
//! whatever queue the owner drains, and hands back a [`TickGuard`] that silences the
//! source when cancelled or dropped.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc::{UnboundedSender, WeakUnboundedSender};
use tokio::time::MissedTickBehavior;
use tracing::debug;

use super::run::RunHandle;

/// Source of periodic ticks for a single run.
pub trait Ticker: Send {
    fn schedule(&mut self, run: RunHandle, period: Duration) -> TickGuard;
}

/// Cancellation guard for a scheduled tick source. Dropping it cancels the source.
pub struct TickGuard {
    run: RunHandle,
    on_cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl TickGuard {
    pub fn new(run: RunHandle, on_cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            run,
            on_cancel: Some(Box::new(on_cancel)),
        }
    }

    pub fn run(&self) -> RunHandle {
        self.run
    }

    pub fn cancel(mut self) {
        self.fire();
    }

    fn fire(&mut self) {
        if let Some(on_cancel) = self.on_cancel.take() {
            on_cancel();
        }
    }
}

impl Drop for TickGuard {
    fn drop(&mut self) {
        self.fire();
    }
}

impl std::fmt::Debug for TickGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickGuard")
            .field("run", &self.run)
            .field("armed", &self.on_cancel.is_some())
            .finish()
    }
}

/// Wall-clock ticker backed by one `tokio::time::interval` task per run.
///
/// Only a weak sender is retained, so a ticker never keeps its owner's queue open.
pub struct TokioTicker<E> {
    sink: WeakUnboundedSender<E>,
}

impl<E> TokioTicker<E>
where
    E: From<RunHandle> + Send + 'static,
{
    pub fn new(sink: &UnboundedSender<E>) -> Self {
        Self {
            sink: sink.downgrade(),
        }
    }
}

impl<E> Ticker for TokioTicker<E>
where
    E: From<RunHandle> + Send + 'static,
{
    fn schedule(&mut self, run: RunHandle, period: Duration) -> TickGuard {
        let sink = self.sink.clone();
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of an interval completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(sender) = sink.upgrade() else {
                    break;
                };
                if sender.send(E::from(run)).is_err() {
                    break;
                }
            }
            debug!(%run, "tick source stopped");
        });

        let abort = task.abort_handle();
        TickGuard::new(run, move || abort.abort())
    }
}

/// Ticker that never fires on its own; the owner delivers ticks by hand.
///
/// Used by frame-driven presentation layers and by tests that need exact tick counts.
#[derive(Debug, Clone, Default)]
pub struct ManualTicker {
    log: Arc<Mutex<TickLog>>,
}

#[derive(Debug, Default)]
struct TickLog {
    scheduled: Vec<(RunHandle, Duration)>,
    stopped: Vec<RunHandle>,
}

impl ManualTicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every run ever scheduled, in scheduling order.
    pub fn scheduled(&self) -> Vec<RunHandle> {
        let log = self.log.lock().expect("tick log mutex poisoned");
        log.scheduled.iter().map(|(run, _)| *run).collect()
    }

    pub fn period_of(&self, run: RunHandle) -> Option<Duration> {
        let log = self.log.lock().expect("tick log mutex poisoned");
        log.scheduled
            .iter()
            .find(|(scheduled, _)| *scheduled == run)
            .map(|(_, period)| *period)
    }

    /// Runs whose guard has not been cancelled or dropped.
    pub fn live(&self) -> Vec<RunHandle> {
        let log = self.log.lock().expect("tick log mutex poisoned");
        log.scheduled
            .iter()
            .map(|(run, _)| *run)
            .filter(|run| !log.stopped.contains(run))
            .collect()
    }

    pub fn is_live(&self, run: RunHandle) -> bool {
        self.live().contains(&run)
    }
}

impl Ticker for ManualTicker {
    fn schedule(&mut self, run: RunHandle, period: Duration) -> TickGuard {
        self.log
            .lock()
            .expect("tick log mutex poisoned")
            .scheduled
            .push((run, period));

        let log = Arc::clone(&self.log);
        TickGuard::new(run, move || {
            log.lock()
                .expect("tick log mutex poisoned")
                .stopped
                .push(run);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::progress::run::next_run_handle;
    use tokio::sync::mpsc;

    #[test]
    fn manual_guard_stops_source_on_drop() {
        let mut ticker = ManualTicker::new();
        let run = next_run_handle();
        let guard = ticker.schedule(run, Duration::from_millis(50));
        assert!(ticker.is_live(run));
        assert_eq!(ticker.period_of(run), Some(Duration::from_millis(50)));

        drop(guard);
        assert!(!ticker.is_live(run));
        assert_eq!(ticker.scheduled(), vec![run]);
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_ticker_delivers_until_cancelled() {
        let (tx, mut rx) = mpsc::unbounded_channel::<RunHandle>();
        let mut ticker = TokioTicker::new(&tx);
        let run = next_run_handle();
        let guard = ticker.schedule(run, Duration::from_millis(100));

        for _ in 0..3 {
            let delivered = rx.recv().await.expect("tick delivered");
            assert_eq!(delivered, run);
        }

        guard.cancel();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(rx.try_recv().is_err(), "no ticks after cancellation");
    }
}
