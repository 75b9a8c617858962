//! Error types for the lionchief library.

use thiserror::Error;
use uuid::Uuid;

/// The main error type for lionchief operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Bluetooth transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Connection establishment failed.
    #[error("connect error: {0}")]
    Connect(#[from] ConnectError),

    /// Command could not be delivered.
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// Transport release failed while disconnecting.
    #[error("disconnect error: {0}")]
    Disconnect(#[from] DisconnectError),

    /// Locomotive address failed validation.
    #[error(transparent)]
    InvalidAddress(#[from] InvalidAddress),

    /// A command parameter was outside its protocol domain.
    #[error(transparent)]
    OutOfRange(#[from] ParameterOutOfRange),
}

/// A locomotive address that does not match the canonical
/// colon-separated hexadecimal form (`AA:BB:CC:DD:EE:FF`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid locomotive address: {0:?}")]
pub struct InvalidAddress(pub String);

/// A command parameter outside its documented protocol domain.
///
/// Fatal to the call, never to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{parameter} out of range: {value} exceeds maximum {max}")]
pub struct ParameterOutOfRange {
    /// Name of the offending parameter.
    pub parameter: &'static str,
    /// The rejected value.
    pub value: u8,
    /// Largest accepted value (minimum is always 0).
    pub max: u8,
}

/// Errors from a connection attempt episode.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// Every permitted attempt failed; the session is now `Failed`.
    ///
    /// The caller may retry later at its own cadence with a fresh
    /// `connect()` call.
    #[error("connect failed after {attempts} attempts: {last}")]
    Exhausted {
        /// Number of transport-level attempts made.
        attempts: u32,
        /// The failure from the final attempt.
        #[source]
        last: TransportError,
    },

    /// A concurrent `disconnect()` cancelled the attempt.
    #[error("connect aborted by disconnect")]
    Aborted,
}

/// Errors from the command write path.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The session is not `Connected`; no write was attempted.
    #[error("not connected")]
    NotConnected,

    /// The transport write failed.
    ///
    /// Transient: the session state is left unchanged and the write is
    /// not retried. Link loss is signalled separately by the transport's
    /// notification stream ending.
    #[error("transport write failed: {0}")]
    TransportFailure(#[from] TransportError),

    /// A parameter failed encoding validation; nothing was written.
    #[error(transparent)]
    OutOfRange(#[from] ParameterOutOfRange),
}

/// Transport release failure reported by `disconnect()`.
///
/// The session still ends in `Disconnected` when this is returned.
#[derive(Debug, Error)]
#[error("transport release failed: {0}")]
pub struct DisconnectError(#[from] pub TransportError);

/// Errors at the transport boundary.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Error from the underlying BLE stack.
    #[error("bluetooth error: {0}")]
    Ble(#[from] btleplug::Error),

    /// No Bluetooth adapter is available on this host.
    #[error("no bluetooth adapter available")]
    NoAdapter,

    /// The locomotive was not discovered within the scan window.
    #[error("device {address} not found")]
    DeviceNotFound {
        /// The address that was scanned for.
        address: String,
    },

    /// A required GATT characteristic is missing from the peripheral.
    #[error("characteristic {uuid} not found")]
    CharacteristicNotFound {
        /// The characteristic that was looked up.
        uuid: Uuid,
    },

    /// The transport has no live peripheral handle.
    #[error("transport not connected")]
    NotConnected,
}

/// Result type alias for lionchief operations.
pub type Result<T> = std::result::Result<T, Error>;
