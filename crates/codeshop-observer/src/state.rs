//! Shared application state for the Observer API server.
//!
//! [`AppState`] holds the live store, the operator controls, and the
//! broadcast channel for change events. It is also the engine's
//! [`ChangeObserver`]: events drained by the simulation loops and by
//! command handlers reach `WebSocket` clients through the same channel.

use std::sync::Arc;

use codeshop_core::operator::OperatorState;
use codeshop_core::runner::{ChangeObserver, SharedStore};
use codeshop_core::store::EntityStore;
use codeshop_types::ChangeEvent;
use tokio::sync::broadcast;

/// Capacity of the broadcast channel for change events.
///
/// A subscriber that falls further behind receives
/// [`broadcast::error::RecvError::Lagged`] and skips ahead.
const BROADCAST_CAPACITY: usize = 256;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The entity store shared with the simulation loops.
    pub store: SharedStore,
    /// Operator control state shared with the simulation loops.
    pub operator: Arc<OperatorState>,
    /// Broadcast sender for change events.
    pub tx: broadcast::Sender<ChangeEvent>,
}

impl AppState {
    /// Create application state around a running store and its operator.
    pub fn new(store: SharedStore, operator: Arc<OperatorState>) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            store,
            operator,
            tx,
        }
    }

    /// Subscribe to the change event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    /// Publish events to all connected clients.
    ///
    /// Returns the number of receivers reached by the last event, 0 when
    /// nobody is listening.
    pub fn broadcast(&self, events: &[ChangeEvent]) -> usize {
        events
            .iter()
            .map(|event| self.tx.send(event.clone()).unwrap_or(0))
            .last()
            .unwrap_or(0)
    }

    /// Run a command against the store, then publish the events it
    /// produced once the lock is released.
    pub async fn command<T>(&self, f: impl FnOnce(&mut EntityStore) -> T) -> T {
        let (result, events) = {
            let mut store = self.store.lock().await;
            let result = f(&mut store);
            (result, store.drain_events())
        };
        self.broadcast(&events);
        result
    }
}

impl ChangeObserver for AppState {
    fn on_events(&self, events: &[ChangeEvent]) {
        self.broadcast(events);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use codeshop_core::config::CompanyConfig;
    use codeshop_types::{Change, TaskDefinition, TaskType};
    use tokio::sync::Mutex;

    use super::*;

    fn state() -> AppState {
        let config = CompanyConfig::default();
        let operator = Arc::new(OperatorState::new(&config.simulation));
        let store = Arc::new(Mutex::new(EntityStore::new(config)));
        AppState::new(store, operator)
    }

    #[tokio::test]
    async fn command_events_reach_subscribers() {
        let state = state();
        let mut rx = state.subscribe();

        let task_id = state
            .command(|store| {
                store.create_task(&TaskDefinition::new("Login", "", TaskType::Feature, 3))
            })
            .await;

        let event = rx.recv().await.unwrap();
        assert_eq!(event.change, Change::TaskCreated { task_id });
    }

    #[test]
    fn broadcast_without_listeners_is_fine() {
        let state = state();
        assert_eq!(state.broadcast(&[]), 0);
        let event = ChangeEvent {
            tick: 0,
            change: Change::Ticked,
        };
        assert_eq!(state.broadcast(&[event]), 0);
    }
}
