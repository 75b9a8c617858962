//! Cached locomotive state.
//!
//! The cache holds the crate's single copy of [`LocomotiveState`]. Only
//! two inputs mutate it: decoded notifications and connection
//! transitions. Commands never touch the cache, so reads reflect what
//! the locomotive reported rather than what was last requested.

use crate::event::{Event, EventDispatcher};
use crate::protocol::NotificationEvent;
use crate::types::{ConnectionState, LocomotiveState};
use std::sync::{PoisonError, RwLock};

/// Shared state cache fed by the notification pipeline.
pub struct StateCache {
    state: RwLock<LocomotiveState>,
    dispatcher: EventDispatcher,
}

impl StateCache {
    /// Creates an empty cache that publishes through `dispatcher`.
    #[must_use]
    pub fn new(dispatcher: EventDispatcher) -> Self {
        Self {
            state: RwLock::new(LocomotiveState::default()),
            dispatcher,
        }
    }

    /// Returns a copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> LocomotiveState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the current connection state.
    #[must_use]
    pub fn connection(&self) -> ConnectionState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .connection
            .clone()
    }

    /// Folds a decoded notification into the cache.
    ///
    /// Dispatch order is fixed: the notification itself first, then the
    /// updated state. [`NotificationEvent::Unknown`] frames dispatch the
    /// notification only; the state is left untouched.
    pub fn apply(&self, event: NotificationEvent) {
        if matches!(event, NotificationEvent::Unknown(_)) {
            self.dispatcher.dispatch(Event::Notification(event));
            return;
        }

        let updated = {
            let mut state = self
                .state
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            match &event {
                NotificationEvent::SpeedChanged(throttle) => state.throttle = *throttle,
                NotificationEvent::DirectionChanged(direction) => state.direction = *direction,
                NotificationEvent::LightsChanged(on) => state.lights_on = *on,
                NotificationEvent::HornChanged(on) => state.horn_on = *on,
                NotificationEvent::BellChanged(on) => state.bell_on = *on,
                NotificationEvent::SmokeChanged(on) => state.smoke_on = *on,
                NotificationEvent::VolumeChanged { channel, level } => {
                    state.volumes.set_level(*channel, *level);
                }
                NotificationEvent::Status {
                    throttle,
                    direction,
                    lights_on,
                    bell_on,
                } => {
                    state.throttle = *throttle;
                    state.direction = *direction;
                    state.lights_on = *lights_on;
                    state.bell_on = *bell_on;
                }
                NotificationEvent::Unknown(_) => {}
            }
            state.clone()
        };

        self.dispatcher.dispatch(Event::Notification(event));
        self.dispatcher.dispatch(Event::State(updated));
    }

    /// Records a connection transition.
    ///
    /// Dispatches the transition first, then the updated state.
    pub fn set_connection(&self, connection: ConnectionState) {
        let updated = {
            let mut state = self
                .state
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            state.connection = connection.clone();
            state.clone()
        };

        self.dispatcher.dispatch(Event::Connection(connection));
        self.dispatcher.dispatch(Event::State(updated));
    }
}
