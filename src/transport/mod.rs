//! Transport layer for locomotive communication.
//!
//! This module provides the abstraction for different transport methods.
//! [`BleTransport`] is the production implementation; [`MockTransport`]
//! is a scriptable stand-in for tests and BLE-less development.

pub mod ble;
pub mod mock;

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::TransportError;

/// Result type for transport operations.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Trait for transport implementations.
///
/// The session serializes every call through one lock; implementations
/// do not need their own write serialization.
pub trait Transport: Send + Sync {
    /// Resolves the peripheral and establishes the link.
    fn connect(&mut self) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>>;

    /// Tears the link down, dropping all subscriptions.
    fn disconnect(&mut self) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>>;

    /// Writes raw bytes to a characteristic.
    fn write(
        &mut self,
        characteristic: Uuid,
        data: Bytes,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>>;

    /// Subscribes to a notify characteristic.
    ///
    /// Each raw notification is forwarded to `frames`. The sender is
    /// dropped when the link ends, which closes the channel and signals
    /// link loss to the consumer.
    fn subscribe(
        &mut self,
        characteristic: Uuid,
        frames: mpsc::Sender<Bytes>,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>>;

    /// Reads the current value of a characteristic.
    fn read(
        &mut self,
        characteristic: Uuid,
    ) -> Pin<Box<dyn Future<Output = TransportResult<Vec<u8>>> + Send + '_>>;

    /// Returns true if the link is up from this transport's view.
    fn is_connected(&self) -> bool;
}

pub use ble::{BleConfig, BleTransport};
pub use mock::{MockHandle, MockTransport};
