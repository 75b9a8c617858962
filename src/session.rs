//! Connection session management.
//!
//! [`ConnectionSession`] owns the transport and drives the connection
//! lifecycle: retry with exponential backoff, the notification pipeline,
//! and teardown. Exactly one in-flight transport operation exists at a
//! time; the transport lock is the serialization point.
//!
//! A disconnect always wins over an in-progress connect. The authority
//! for that race is the session's connection state, which flips without
//! waiting for the transport lock.

use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;

use crate::cache::StateCache;
use crate::device_info::read_device_info;
use crate::error::{CommandError, ConnectError, DisconnectError};
use crate::event::{Event, EventDispatcher};
use crate::protocol::{self, uuids, CommandFrame, NotificationEvent};
use crate::retry::RetryPolicy;
use crate::transport::{Transport, TransportResult};
use crate::types::{ConnectionState, DeviceInfo};

/// Buffered raw frames between the transport and the decode task.
const PIPELINE_CAPACITY: usize = 32;

/// Applies `next` when the current state satisfies `allowed`.
///
/// The cache mirror happens under the same guard, so transitions reach
/// subscribers in the order they were applied.
fn transition_if(
    state: &Mutex<ConnectionState>,
    cache: &StateCache,
    allowed: impl FnOnce(&ConnectionState) -> bool,
    next: ConnectionState,
) -> bool {
    let mut current = state.lock().unwrap_or_else(PoisonError::into_inner);
    if !allowed(&current) {
        return false;
    }
    *current = next.clone();
    cache.set_connection(next);
    true
}

/// Session that owns the transport and the connection state machine.
pub struct ConnectionSession<T: Transport> {
    transport: Arc<tokio::sync::Mutex<T>>,
    state: Arc<Mutex<ConnectionState>>,
    cache: Arc<StateCache>,
    dispatcher: EventDispatcher,
    policy: RetryPolicy,
    cancel: Notify,
    pipeline: Mutex<Option<JoinHandle<()>>>,
    device_info: Arc<Mutex<DeviceInfo>>,
}

impl<T: Transport + 'static> ConnectionSession<T> {
    /// Creates a new session over `transport`.
    pub fn new(
        transport: T,
        cache: Arc<StateCache>,
        dispatcher: EventDispatcher,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            transport: Arc::new(tokio::sync::Mutex::new(transport)),
            state: Arc::new(Mutex::new(ConnectionState::Disconnected)),
            cache,
            dispatcher,
            policy,
            cancel: Notify::new(),
            pipeline: Mutex::new(None),
            device_info: Arc::new(Mutex::new(DeviceInfo::default())),
        }
    }

    /// Returns the current connection state.
    #[must_use]
    pub fn connection(&self) -> ConnectionState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the device information read during the last connect.
    #[must_use]
    pub fn device_info(&self) -> DeviceInfo {
        self.device_info
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Establishes the session, retrying per the session's policy.
    ///
    /// Returns immediately when the session is already connected or a
    /// connect is in progress. A concurrent [`disconnect`] aborts the
    /// attempt loop and wins the session's final state.
    ///
    /// [`disconnect`]: Self::disconnect
    pub async fn connect(&self) -> Result<(), ConnectError> {
        let started = transition_if(
            &self.state,
            &self.cache,
            |s| {
                !matches!(
                    s,
                    ConnectionState::Connecting | ConnectionState::Connected
                )
            },
            ConnectionState::Connecting,
        );
        if !started {
            return Ok(());
        }

        let mut attempt: u32 = 1;
        let (frames, info) = loop {
            if !matches!(self.connection(), ConnectionState::Connecting) {
                return Err(ConnectError::Aborted);
            }
            match self.try_attempt().await {
                Ok(Some(link)) => break link,
                Ok(None) => return Err(ConnectError::Aborted),
                Err(error) => {
                    attempt += 1;
                    match self.policy.next_delay(attempt) {
                        Some(delay) => {
                            tracing::warn!(
                                "connect attempt {} failed: {error}; retrying in {delay:?}",
                                attempt - 1
                            );
                            tokio::select! {
                                () = tokio::time::sleep(delay) => {}
                                () = self.cancel.notified() => {}
                            }
                        }
                        None => {
                            let attempts = self.policy.max_attempts();
                            tracing::error!(
                                "connect failed after {attempts} attempts: {error}"
                            );
                            transition_if(
                                &self.state,
                                &self.cache,
                                |s| matches!(s, ConnectionState::Connecting),
                                ConnectionState::Failed {
                                    reason: error.to_string(),
                                },
                            );
                            return Err(ConnectError::Exhausted {
                                attempts,
                                last: error,
                            });
                        }
                    }
                }
            }
        };

        let established = transition_if(
            &self.state,
            &self.cache,
            |s| matches!(s, ConnectionState::Connecting),
            ConnectionState::Connected,
        );
        if !established {
            let mut transport = self.transport.lock().await;
            if let Err(error) = transport.disconnect().await {
                tracing::debug!("stale link release failed: {error}");
            }
            return Err(ConnectError::Aborted);
        }

        *self
            .device_info
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = info.clone();
        self.dispatcher.dispatch(Event::DeviceInfo(info));
        self.spawn_pipeline(frames);
        tracing::info!("locomotive session established");
        Ok(())
    }

    /// One transport connect attempt plus link wiring.
    ///
    /// `Ok(None)` means the attempt was cancelled; any link brought up in
    /// the meantime has been released.
    async fn try_attempt(
        &self,
    ) -> TransportResult<Option<(mpsc::Receiver<Bytes>, DeviceInfo)>> {
        let mut transport = self.transport.lock().await;
        if !matches!(self.connection(), ConnectionState::Connecting) {
            return Ok(None);
        }

        transport.connect().await?;

        // The state can flip while the attempt is in flight; the fresh
        // link is stale in that case.
        if !matches!(self.connection(), ConnectionState::Connecting) {
            if let Err(error) = transport.disconnect().await {
                tracing::debug!("stale link release failed: {error}");
            }
            return Ok(None);
        }

        let (tx, rx) = mpsc::channel(PIPELINE_CAPACITY);
        if let Err(error) = transport.subscribe(uuids::NOTIFY_CHARACTERISTIC, tx).await {
            if let Err(release) = transport.disconnect().await {
                tracing::debug!("link release after failed subscribe: {release}");
            }
            return Err(error);
        }

        let info = read_device_info(&mut *transport).await;
        Ok(Some((rx, info)))
    }

    /// Decode task: raw frames in, cache updates out.
    ///
    /// A closed channel while the session is still `Connected` means the
    /// link dropped out from under us.
    fn spawn_pipeline(&self, mut frames: mpsc::Receiver<Bytes>) {
        let cache = Arc::clone(&self.cache);
        let state = Arc::clone(&self.state);
        let transport = Arc::clone(&self.transport);
        let device_info = Arc::clone(&self.device_info);

        let task = tokio::spawn(async move {
            while let Some(raw) = frames.recv().await {
                let event = protocol::decode(&raw);
                if let NotificationEvent::Unknown(bytes) = &event {
                    tracing::debug!("unrecognized frame: {}", hex::encode(bytes));
                }
                cache.apply(event);
            }

            let lost = transition_if(
                &state,
                &cache,
                |s| matches!(s, ConnectionState::Connected),
                ConnectionState::Disconnected,
            );
            if lost {
                tracing::warn!("notification pipeline closed; link lost");
                *device_info.lock().unwrap_or_else(PoisonError::into_inner) =
                    DeviceInfo::default();
                let mut transport = transport.lock().await;
                if let Err(error) = transport.disconnect().await {
                    tracing::debug!("transport release after link loss failed: {error}");
                }
            }
        });

        let previous = self
            .pipeline
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(task);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Tears the session down.
    ///
    /// Idempotent, and always leaves the session `Disconnected` even when
    /// the transport release fails. Wakes any backoff sleep so an
    /// in-progress connect aborts promptly.
    pub async fn disconnect(&self) -> Result<(), DisconnectError> {
        let started = transition_if(
            &self.state,
            &self.cache,
            |s| {
                !matches!(
                    s,
                    ConnectionState::Disconnected | ConnectionState::Disconnecting
                )
            },
            ConnectionState::Disconnecting,
        );
        if !started {
            return Ok(());
        }
        self.cancel.notify_waiters();

        let result = {
            let mut transport = self.transport.lock().await;
            transport.disconnect().await
        };

        if let Some(task) = self
            .pipeline
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
        *self
            .device_info
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = DeviceInfo::default();

        let finished = transition_if(
            &self.state,
            &self.cache,
            |s| matches!(s, ConnectionState::Disconnecting),
            ConnectionState::Disconnected,
        );
        if finished {
            tracing::info!("locomotive session closed");
        }
        result.map_err(DisconnectError)
    }

    /// Writes one command frame to the locomotive.
    pub async fn send_frame(&self, frame: CommandFrame) -> Result<(), CommandError> {
        if !matches!(self.connection(), ConnectionState::Connected) {
            return Err(CommandError::NotConnected);
        }
        let mut transport = self.transport.lock().await;
        // A teardown can slip in while waiting for the transport.
        if !matches!(self.connection(), ConnectionState::Connected) {
            return Err(CommandError::NotConnected);
        }
        tracing::debug!("send {}", hex::encode(frame.as_bytes()));
        transport
            .write(uuids::COMMAND_CHARACTERISTIC, frame.into_bytes())
            .await?;
        Ok(())
    }
}

impl<T: Transport> Drop for ConnectionSession<T> {
    fn drop(&mut self) {
        if let Some(task) = self
            .pipeline
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventDispatcher;
    use crate::protocol::Opcode;
    use crate::transport::{MockHandle, MockTransport};
    use std::time::Duration;

    fn session_with_mock() -> (Arc<ConnectionSession<MockTransport>>, MockHandle, Arc<StateCache>) {
        let transport = MockTransport::new();
        let handle = transport.handle();
        let dispatcher = EventDispatcher::new(16);
        let cache = Arc::new(StateCache::new(dispatcher.clone()));
        let session = Arc::new(ConnectionSession::new(
            transport,
            Arc::clone(&cache),
            dispatcher,
            RetryPolicy::default(),
        ));
        (session, handle, cache)
    }

    async fn yield_briefly() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_connects_on_first_attempt() {
        let (session, handle, _cache) = session_with_mock();

        session.connect().await.unwrap();

        assert_eq!(session.connection(), ConnectionState::Connected);
        assert_eq!(handle.connect_calls(), 1);
        assert_eq!(handle.subscribed(), Some(uuids::NOTIFY_CHARACTERISTIC));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_doubles_between_attempts() {
        let (session, handle, _cache) = session_with_mock();
        handle.fail_connects(2);

        let start = tokio::time::Instant::now();
        session.connect().await.unwrap();

        // Two failures: 500ms before the second attempt, 1s before the
        // third.
        assert_eq!(start.elapsed(), Duration::from_millis(1500));
        assert_eq!(handle.connect_calls(), 3);
        assert_eq!(session.connection(), ConnectionState::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_after_max_attempts() {
        let (session, handle, _cache) = session_with_mock();
        handle.fail_connects(3);

        let error = session.connect().await.unwrap_err();

        assert!(matches!(
            error,
            ConnectError::Exhausted { attempts: 3, .. }
        ));
        assert_eq!(handle.connect_calls(), 3);
        assert!(matches!(
            session.connection(),
            ConnectionState::Failed { .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_after_exhaustion() {
        let (session, handle, _cache) = session_with_mock();
        handle.fail_connects(3);

        assert!(session.connect().await.is_err());
        session.connect().await.unwrap();

        assert_eq!(session.connection(), ConnectionState::Connected);
        assert_eq!(handle.connect_calls(), 4);
    }

    #[tokio::test]
    async fn test_reentrant_connect_is_noop() {
        let (session, handle, _cache) = session_with_mock();

        session.connect().await.unwrap();
        session.connect().await.unwrap();

        assert_eq!(handle.connect_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_aborts_backoff() {
        let (session, handle, _cache) = session_with_mock();
        handle.fail_connects(3);

        let connecting = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.connect().await }
        });
        yield_briefly().await;

        session.disconnect().await.unwrap();
        let result = connecting.await.unwrap();

        assert!(matches!(result, Err(ConnectError::Aborted)));
        assert_eq!(session.connection(), ConnectionState::Disconnected);
        assert_eq!(handle.connect_calls(), 1);
    }

    #[tokio::test]
    async fn test_disconnect_wins_over_inflight_attempt() {
        let (session, handle, _cache) = session_with_mock();
        let gate = handle.hold_connects();

        let connecting = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.connect().await }
        });
        yield_briefly().await;

        let disconnecting = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.disconnect().await }
        });
        yield_briefly().await;

        gate.notify_one();
        let connect_result = connecting.await.unwrap();
        disconnecting.await.unwrap().unwrap();

        assert!(matches!(connect_result, Err(ConnectError::Aborted)));
        assert_eq!(session.connection(), ConnectionState::Disconnected);
        assert!(!handle.is_connected());
    }

    #[tokio::test]
    async fn test_send_frame_requires_connection() {
        let (session, handle, _cache) = session_with_mock();

        let frame = CommandFrame::new(Opcode::Speed, &[50]);
        let error = session.send_frame(frame).await.unwrap_err();

        assert!(matches!(error, CommandError::NotConnected));
        assert!(handle.writes().is_empty());
    }

    #[tokio::test]
    async fn test_send_frame_writes_to_command_characteristic() {
        let (session, handle, _cache) = session_with_mock();
        session.connect().await.unwrap();

        session
            .send_frame(CommandFrame::new(Opcode::Speed, &[50]))
            .await
            .unwrap();

        assert_eq!(
            handle.writes(),
            vec![(
                uuids::COMMAND_CHARACTERISTIC,
                vec![0x00, 0x45, 50, 0x00]
            )]
        );
    }

    #[tokio::test]
    async fn test_send_frame_surfaces_transport_failure() {
        let (session, handle, _cache) = session_with_mock();
        session.connect().await.unwrap();
        handle.fail_next_write();

        let error = session
            .send_frame(CommandFrame::new(Opcode::Bell, &[0x01]))
            .await
            .unwrap_err();

        assert!(matches!(error, CommandError::TransportFailure(_)));
        assert_eq!(session.connection(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_notification_flows_into_cache() {
        let (session, handle, cache) = session_with_mock();
        session.connect().await.unwrap();

        assert!(handle.notify(&[0x00, 0x45, 50, 0x00]).await);
        yield_briefly().await;

        assert_eq!(cache.snapshot().throttle, 50);
    }

    #[tokio::test]
    async fn test_link_loss_transitions_to_disconnected() {
        let (session, handle, _cache) = session_with_mock();
        session.connect().await.unwrap();

        handle.close_notifications();
        yield_briefly().await;

        assert_eq!(session.connection(), ConnectionState::Disconnected);
        assert!(!handle.is_connected());
    }

    #[tokio::test]
    async fn test_device_info_read_on_connect_and_reset() {
        let (session, handle, _cache) = session_with_mock();
        handle.set_read_value(uuids::MODEL_NUMBER, b"LC-71-1234");

        session.connect().await.unwrap();
        assert_eq!(session.device_info().model.as_deref(), Some("LC-71-1234"));

        session.disconnect().await.unwrap();
        assert!(session.device_info().is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let (session, handle, _cache) = session_with_mock();
        session.connect().await.unwrap();

        session.disconnect().await.unwrap();
        session.disconnect().await.unwrap();

        assert_eq!(session.connection(), ConnectionState::Disconnected);
        assert_eq!(handle.disconnect_calls(), 1);
    }
}
