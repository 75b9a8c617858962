//! Scriptable in-memory transport for tests.
//!
//! [`MockTransport`] implements [`Transport`] without any radio. A
//! [`MockHandle`] cloned off before the transport is handed to the client
//! scripts failures, records writes, and injects notifications.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::sync::Notify;
use uuid::Uuid;

use crate::error::TransportError;
use crate::transport::{Transport, TransportResult};

#[derive(Debug, Default)]
struct MockState {
    connected: bool,
    connect_calls: u32,
    disconnect_calls: u32,
    connect_failures: VecDeque<TransportError>,
    write_failures: VecDeque<TransportError>,
    writes: Vec<(Uuid, Vec<u8>)>,
    reads: HashMap<Uuid, Vec<u8>>,
    notify_tx: Option<mpsc::Sender<Bytes>>,
    subscribed: Option<Uuid>,
    gate: Option<Arc<Notify>>,
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory transport with scriptable behavior.
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Creates a new mock transport that connects on the first attempt.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Returns a handle for scripting and inspecting this transport.
    #[must_use]
    pub fn handle(&self) -> MockHandle {
        MockHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Controller for a [`MockTransport`] that has been handed off.
#[derive(Clone)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockHandle {
    /// Scripts the next `count` connect attempts to fail.
    pub fn fail_connects(&self, count: u32) {
        let mut state = lock(&self.state);
        for _ in 0..count {
            state
                .connect_failures
                .push_back(TransportError::DeviceNotFound {
                    address: "mock".to_owned(),
                });
        }
    }

    /// Scripts the next write to fail.
    pub fn fail_next_write(&self) {
        lock(&self.state)
            .write_failures
            .push_back(TransportError::Ble(btleplug::Error::TimedOut(
                Duration::ZERO,
            )));
    }

    /// Holds connect attempts until the returned gate is notified.
    ///
    /// Each gated attempt waits for one `notify_one` before proceeding.
    pub fn hold_connects(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        lock(&self.state).gate = Some(Arc::clone(&gate));
        gate
    }

    /// Sets the value returned by reads of `characteristic`.
    ///
    /// Characteristics without a value fail the read.
    pub fn set_read_value(&self, characteristic: Uuid, value: &[u8]) {
        lock(&self.state).reads.insert(characteristic, value.to_vec());
    }

    /// Number of connect attempts made so far.
    #[must_use]
    pub fn connect_calls(&self) -> u32 {
        lock(&self.state).connect_calls
    }

    /// Number of disconnect calls made so far.
    #[must_use]
    pub fn disconnect_calls(&self) -> u32 {
        lock(&self.state).disconnect_calls
    }

    /// All writes recorded so far, in order.
    #[must_use]
    pub fn writes(&self) -> Vec<(Uuid, Vec<u8>)> {
        lock(&self.state).writes.clone()
    }

    /// Characteristic currently subscribed to, if any.
    #[must_use]
    pub fn subscribed(&self) -> Option<Uuid> {
        lock(&self.state).subscribed
    }

    /// Whether the transport currently holds a link.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        lock(&self.state).connected
    }

    /// Injects a raw notification frame into the subscribed pipeline.
    ///
    /// Returns false if nothing is subscribed or the pipeline is gone.
    pub async fn notify(&self, frame: &[u8]) -> bool {
        let tx = lock(&self.state).notify_tx.clone();
        match tx {
            Some(tx) => tx.send(Bytes::copy_from_slice(frame)).await.is_ok(),
            None => false,
        }
    }

    /// Drops the notification sender, simulating link loss.
    pub fn close_notifications(&self) {
        lock(&self.state).notify_tx = None;
    }
}

impl Transport for MockTransport {
    fn connect(&mut self) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        let shared = Arc::clone(&self.state);
        Box::pin(async move {
            let gate = {
                let mut state = lock(&shared);
                state.connect_calls += 1;
                state.gate.clone()
            };
            if let Some(gate) = gate {
                gate.notified().await;
            }
            let mut state = lock(&shared);
            if let Some(error) = state.connect_failures.pop_front() {
                return Err(error);
            }
            state.connected = true;
            Ok(())
        })
    }

    fn disconnect(&mut self) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        let shared = Arc::clone(&self.state);
        Box::pin(async move {
            let mut state = lock(&shared);
            state.disconnect_calls += 1;
            state.connected = false;
            state.subscribed = None;
            state.notify_tx = None;
            Ok(())
        })
    }

    fn write(
        &mut self,
        characteristic: Uuid,
        data: Bytes,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        let shared = Arc::clone(&self.state);
        Box::pin(async move {
            let mut state = lock(&shared);
            if !state.connected {
                return Err(TransportError::NotConnected);
            }
            if let Some(error) = state.write_failures.pop_front() {
                return Err(error);
            }
            state.writes.push((characteristic, data.to_vec()));
            Ok(())
        })
    }

    fn subscribe(
        &mut self,
        characteristic: Uuid,
        frames: mpsc::Sender<Bytes>,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        let shared = Arc::clone(&self.state);
        Box::pin(async move {
            let mut state = lock(&shared);
            if !state.connected {
                return Err(TransportError::NotConnected);
            }
            state.subscribed = Some(characteristic);
            state.notify_tx = Some(frames);
            Ok(())
        })
    }

    fn read(
        &mut self,
        characteristic: Uuid,
    ) -> Pin<Box<dyn Future<Output = TransportResult<Vec<u8>>> + Send + '_>> {
        let shared = Arc::clone(&self.state);
        Box::pin(async move {
            let state = lock(&shared);
            if !state.connected {
                return Err(TransportError::NotConnected);
            }
            state
                .reads
                .get(&characteristic)
                .cloned()
                .ok_or(TransportError::CharacteristicNotFound {
                    uuid: characteristic,
                })
        })
    }

    fn is_connected(&self) -> bool {
        lock(&self.state).connected
    }
}
