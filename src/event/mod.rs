//! Event system for state-change delivery.
//!
//! Decoded notifications and connection transitions are fanned out on a
//! bounded broadcast channel. Observers registered through the
//! [`ObserverRegistry`] are invoked from a drain task on that channel,
//! never from the decode path itself, so a slow observer can lag (and
//! skip intermediate snapshots) but can never stall protocol decoding.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::protocol::NotificationEvent;
use crate::types::{ConnectionState, DeviceInfo, LocomotiveState};

/// Event types that can be dispatched.
#[derive(Debug, Clone)]
pub enum Event {
    /// Connection lifecycle transition.
    Connection(ConnectionState),
    /// A notification was decoded (including `Unknown` frames, which
    /// surface here for diagnostics).
    Notification(NotificationEvent),
    /// The cached locomotive state after a change was applied.
    State(LocomotiveState),
    /// Device information was read after a connect.
    DeviceInfo(DeviceInfo),
}

/// A subscription to events.
pub struct Subscription {
    receiver: broadcast::Receiver<Event>,
}

impl Subscription {
    /// Receives the next event.
    ///
    /// Returns `None` once the dispatcher is gone. A lagging subscriber
    /// skips the events it missed and keeps receiving.
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

struct EventDispatcherInner {
    sender: broadcast::Sender<Event>,
}

/// Dispatches events to subscribers.
#[derive(Clone)]
pub struct EventDispatcher {
    inner: Arc<EventDispatcherInner>,
}

impl EventDispatcher {
    /// Creates a new event dispatcher with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            inner: Arc::new(EventDispatcherInner { sender }),
        }
    }

    /// Dispatches an event to all subscribers.
    pub fn dispatch(&self, event: Event) {
        // Broadcast to all subscribers (ignore send errors - no receivers is fine)
        let _ = self.inner.sender.send(event);
    }

    /// Subscribes to all events from this dispatcher.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        let receiver = self.inner.sender.subscribe();
        Subscription { receiver }
    }
}

/// Callback invoked with each new locomotive state snapshot.
///
/// Implemented for any `Fn(&LocomotiveState) + Send + Sync` closure.
pub trait StateObserver: Send + Sync {
    /// Called with the state after each applied change.
    fn on_state(&self, state: &LocomotiveState);
}

impl<F> StateObserver for F
where
    F: Fn(&LocomotiveState) + Send + Sync,
{
    fn on_state(&self, state: &LocomotiveState) {
        self(state);
    }
}

type ObserverMap = HashMap<usize, Arc<dyn StateObserver>>;

/// Registry of state observers, fed from a dispatcher drain task.
///
/// Registration is keyed by `Arc` identity: adding the same `Arc` twice
/// has the effect of once, and removal is idempotent.
pub struct ObserverRegistry {
    observers: Arc<Mutex<ObserverMap>>,
    drain_task: JoinHandle<()>,
}

impl ObserverRegistry {
    /// Creates a registry and spawns its drain task on the dispatcher.
    #[must_use]
    pub fn spawn(dispatcher: &EventDispatcher) -> Self {
        let observers: Arc<Mutex<ObserverMap>> = Arc::new(Mutex::new(HashMap::new()));
        let mut subscription = dispatcher.subscribe();

        let drain_observers = Arc::clone(&observers);
        let drain_task = tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                if let Event::State(state) = event {
                    let snapshot: Vec<Arc<dyn StateObserver>> = drain_observers
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .values()
                        .cloned()
                        .collect();
                    for observer in snapshot {
                        observer.on_state(&state);
                    }
                }
            }
        });

        Self {
            observers,
            drain_task,
        }
    }

    /// Registers an observer. Adding the same `Arc` again is a no-op.
    pub fn add(&self, observer: Arc<dyn StateObserver>) {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(Self::key(&observer), observer);
    }

    /// Removes an observer; removing one that is not registered is a no-op.
    pub fn remove(&self, observer: &Arc<dyn StateObserver>) {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&Self::key(observer));
    }

    /// Returns the number of registered observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` when no observer is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn key(observer: &Arc<dyn StateObserver>) -> usize {
        Arc::as_ptr(observer).cast::<()>() as usize
    }
}

impl Drop for ObserverRegistry {
    fn drop(&mut self) {
        self.drain_task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_event_dispatch() {
        let dispatcher = EventDispatcher::new(16);
        let mut sub = dispatcher.subscribe();

        dispatcher.dispatch(Event::Connection(ConnectionState::Connected));

        let event = tokio::time::timeout(Duration::from_millis(100), sub.recv())
            .await
            .unwrap();

        assert!(matches!(
            event,
            Some(Event::Connection(ConnectionState::Connected))
        ));
    }

    #[tokio::test]
    async fn test_observer_receives_state() {
        let dispatcher = EventDispatcher::new(16);
        let registry = ObserverRegistry::spawn(&dispatcher);

        let seen: Arc<Mutex<Vec<LocomotiveState>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let observer: Arc<dyn StateObserver> = Arc::new(move |state: &LocomotiveState| {
            sink.lock().unwrap().push(state.clone());
        });
        registry.add(observer);

        let state = LocomotiveState {
            throttle: 42,
            ..LocomotiveState::default()
        };
        dispatcher.dispatch(Event::State(state));
        // Non-state events must not reach observers.
        dispatcher.dispatch(Event::Notification(NotificationEvent::Unknown(vec![1])));

        tokio::time::sleep(Duration::from_millis(50)).await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].throttle, 42);
    }

    #[tokio::test]
    async fn test_add_same_observer_twice_invokes_once() {
        let dispatcher = EventDispatcher::new(16);
        let registry = ObserverRegistry::spawn(&dispatcher);

        let count = Arc::new(Mutex::new(0usize));
        let sink = Arc::clone(&count);
        let observer: Arc<dyn StateObserver> = Arc::new(move |_: &LocomotiveState| {
            *sink.lock().unwrap() += 1;
        });

        registry.add(Arc::clone(&observer));
        registry.add(Arc::clone(&observer));
        assert_eq!(registry.len(), 1);

        dispatcher.dispatch(Event::State(LocomotiveState::default()));
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_remove_observer_is_idempotent() {
        let dispatcher = EventDispatcher::new(16);
        let registry = ObserverRegistry::spawn(&dispatcher);

        let observer: Arc<dyn StateObserver> = Arc::new(|_: &LocomotiveState| {});
        registry.add(Arc::clone(&observer));
        assert_eq!(registry.len(), 1);

        registry.remove(&observer);
        registry.remove(&observer);
        assert!(registry.is_empty());
    }
}
