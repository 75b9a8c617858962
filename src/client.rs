//! High-level locomotive client.
//!
//! This module provides the [`LionChief`] client that combines the
//! transport, connection session, state cache and event fan-out into a
//! unified interface. One client instance controls one locomotive.

use std::sync::Arc;

use crate::cache::StateCache;
use crate::error::{CommandError, ConnectError, DisconnectError};
use crate::event::{EventDispatcher, ObserverRegistry, StateObserver, Subscription};
use crate::protocol::Command;
use crate::retry::RetryPolicy;
use crate::session::ConnectionSession;
use crate::transport::{BleTransport, Transport};
use crate::types::{
    ConnectionState, DeviceInfo, Direction, LocomotiveAddress, LocomotiveState, VolumeChannel,
};

/// Broadcast capacity of the event channel.
const EVENT_CAPACITY: usize = 64;

/// Client for controlling a LionChief locomotive.
///
/// Commands go down through the session; notifications come back up
/// through the cache and are observable via [`subscribe`] or a
/// registered [`StateObserver`]. Must be created from within a Tokio
/// runtime.
///
/// [`subscribe`]: Self::subscribe
pub struct LionChief<T: Transport> {
    session: Arc<ConnectionSession<T>>,
    cache: Arc<StateCache>,
    dispatcher: EventDispatcher,
    observers: ObserverRegistry,
}

impl LionChief<BleTransport> {
    /// Creates a client that reaches the locomotive at `address` over BLE.
    ///
    /// # Arguments
    ///
    /// * `address` - Bluetooth address of the locomotive (e.g.,
    ///   `"FC:1F:C3:9F:A5:4A".parse()?`)
    ///
    /// # Returns
    ///
    /// A new client (not yet connected).
    #[must_use]
    pub fn ble(address: LocomotiveAddress) -> Self {
        Self::with_transport(BleTransport::new(address))
    }
}

impl<T: Transport + 'static> LionChief<T> {
    /// Creates a client over an arbitrary transport.
    #[must_use]
    pub fn with_transport(transport: T) -> Self {
        Self::with_retry_policy(transport, RetryPolicy::default())
    }

    /// Creates a client with an explicit connect retry policy.
    #[must_use]
    pub fn with_retry_policy(transport: T, policy: RetryPolicy) -> Self {
        let dispatcher = EventDispatcher::new(EVENT_CAPACITY);
        let cache = Arc::new(StateCache::new(dispatcher.clone()));
        let observers = ObserverRegistry::spawn(&dispatcher);
        let session = Arc::new(ConnectionSession::new(
            transport,
            Arc::clone(&cache),
            dispatcher.clone(),
            policy,
        ));
        Self {
            session,
            cache,
            dispatcher,
            observers,
        }
    }

    /// Connects to the locomotive, retrying with exponential backoff.
    ///
    /// Returns immediately when already connected. A concurrent
    /// [`disconnect`] aborts the attempt.
    ///
    /// [`disconnect`]: Self::disconnect
    pub async fn connect(&self) -> Result<(), ConnectError> {
        self.session.connect().await
    }

    /// Disconnects from the locomotive.
    ///
    /// A polite shutdown frame goes out first so the locomotive drops
    /// the link cleanly; a failure there is logged and ignored.
    pub async fn disconnect(&self) -> Result<(), DisconnectError> {
        if let Err(error) = self.send(Command::Shutdown).await {
            tracing::debug!("shutdown frame not delivered: {error}");
        }
        self.session.disconnect().await
    }

    /// Sets the throttle position (0..=100).
    pub async fn set_throttle(&self, throttle: u8) -> Result<(), CommandError> {
        self.send(Command::SetSpeed(throttle)).await
    }

    /// Sets the travel direction.
    pub async fn set_direction(&self, direction: Direction) -> Result<(), CommandError> {
        self.send(Command::SetDirection(direction)).await
    }

    /// Switches the headlights.
    pub async fn set_lights(&self, on: bool) -> Result<(), CommandError> {
        self.send(Command::SetLights(on)).await
    }

    /// Switches the horn.
    pub async fn set_horn(&self, on: bool) -> Result<(), CommandError> {
        self.send(Command::SetHorn(on)).await
    }

    /// Switches the bell.
    pub async fn set_bell(&self, on: bool) -> Result<(), CommandError> {
        self.send(Command::SetBell(on)).await
    }

    /// Switches the smoke unit.
    pub async fn set_smoke(&self, on: bool) -> Result<(), CommandError> {
        self.send(Command::SetSmoke(on)).await
    }

    /// Sets one volume channel (0..=10).
    pub async fn set_volume(&self, channel: VolumeChannel, level: u8) -> Result<(), CommandError> {
        self.send(Command::SetVolume { channel, level }).await
    }

    /// Plays a recorded announcement by code.
    pub async fn play_announcement(&self, code: u8) -> Result<(), CommandError> {
        self.send(Command::PlayAnnouncement(code)).await
    }

    /// Encodes and sends one command.
    ///
    /// Parameters are validated before anything touches the transport.
    pub async fn send(&self, command: Command) -> Result<(), CommandError> {
        let frame = command.encode()?;
        self.session.send_frame(frame).await
    }

    /// Returns a copy of the last state reported by the locomotive.
    ///
    /// The cache is fed by notifications only; a command the locomotive
    /// has not confirmed is not reflected here.
    #[must_use]
    pub fn current_state(&self) -> LocomotiveState {
        self.cache.snapshot()
    }

    /// Returns the current connection state.
    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.session.connection()
    }

    /// Returns the device information read during the last connect.
    #[must_use]
    pub fn device_info(&self) -> DeviceInfo {
        self.session.device_info()
    }

    /// Registers a state observer.
    ///
    /// Adding the same `Arc` twice keeps a single registration.
    pub fn add_observer(&self, observer: Arc<dyn StateObserver>) {
        self.observers.add(observer);
    }

    /// Removes a previously registered observer.
    pub fn remove_observer(&self, observer: &Arc<dyn StateObserver>) {
        self.observers.remove(observer);
    }

    /// Subscribes to the event stream.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        self.dispatcher.subscribe()
    }
}
