//! Change observer that feeds the Observer API and the snapshot writer.
//!
//! Every drained batch goes to the observer's broadcast channel. A
//! `Ticked` event on a multiple of the snapshot interval also wakes the
//! snapshot writer.

use std::sync::Arc;

use codeshop_core::runner::ChangeObserver;
use codeshop_observer::AppState;
use codeshop_types::{Change, ChangeEvent};
use tokio::sync::Notify;
use tracing::debug;

/// Bridges the simulation loops to the Observer API.
#[derive(Debug)]
pub struct EngineObserver {
    app: Arc<AppState>,
    snapshot_due: Arc<Notify>,
    snapshot_interval_ticks: u64,
}

impl EngineObserver {
    /// Create an observer. An interval of 0 disables periodic snapshots.
    pub const fn new(
        app: Arc<AppState>,
        snapshot_due: Arc<Notify>,
        snapshot_interval_ticks: u64,
    ) -> Self {
        Self {
            app,
            snapshot_due,
            snapshot_interval_ticks,
        }
    }

    fn snapshot_tick(&self, events: &[ChangeEvent]) -> Option<u64> {
        let interval = self.snapshot_interval_ticks;
        if interval == 0 {
            return None;
        }
        events
            .iter()
            .filter(|e| e.change == Change::Ticked)
            .map(|e| e.tick)
            .find(|tick| tick.checked_rem(interval) == Some(0))
    }
}

impl ChangeObserver for EngineObserver {
    fn on_events(&self, events: &[ChangeEvent]) {
        let receivers = self.app.broadcast(events);
        debug!(events = events.len(), receivers, "Change events broadcast");

        if let Some(tick) = self.snapshot_tick(events) {
            debug!(tick, "Snapshot due");
            self.snapshot_due.notify_one();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use codeshop_core::config::CompanyConfig;
    use codeshop_core::{EntityStore, OperatorState};
    use tokio::sync::Mutex;

    use super::*;

    fn observer(interval: u64) -> (EngineObserver, Arc<AppState>, Arc<Notify>) {
        let config = CompanyConfig::default();
        let operator = Arc::new(OperatorState::new(&config.simulation));
        let store = Arc::new(Mutex::new(EntityStore::new(config)));
        let app = Arc::new(AppState::new(store, operator));
        let due = Arc::new(Notify::new());
        (
            EngineObserver::new(Arc::clone(&app), Arc::clone(&due), interval),
            app,
            due,
        )
    }

    fn ticked(tick: u64) -> ChangeEvent {
        ChangeEvent {
            tick,
            change: Change::Ticked,
        }
    }

    #[tokio::test]
    async fn interval_tick_wakes_writer() {
        let (observer, _, due) = observer(5);
        observer.on_events(&[ticked(5)]);
        let woke = tokio::time::timeout(Duration::from_millis(100), due.notified()).await;
        assert!(woke.is_ok());
    }

    #[test]
    fn off_interval_ticks_do_not() {
        let (observer, _, _) = observer(5);
        assert_eq!(observer.snapshot_tick(&[ticked(4), ticked(6)]), None);
        assert_eq!(observer.snapshot_tick(&[ticked(9), ticked(10)]), Some(10));
    }

    #[test]
    fn zero_interval_disables_snapshots() {
        let (observer, _, _) = observer(0);
        assert_eq!(observer.snapshot_tick(&[ticked(10)]), None);
    }

    #[tokio::test]
    async fn events_reach_subscribers() {
        let (observer, app, _) = observer(0);
        let mut rx = app.subscribe();
        observer.on_events(&[ticked(1)]);
        assert_eq!(rx.recv().await.unwrap(), ticked(1));
    }
}
