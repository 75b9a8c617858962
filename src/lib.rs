//! # lionchief
//!
//! A Rust client library for Lionel LionChief BLE locomotives.
//!
//! This library provides async control of LionChief locomotives over
//! Bluetooth Low Energy: throttle, direction, lights, sounds, and the
//! state reported back by the locomotive.
//!
//! ## Features
//!
//! - Async/await based API using Tokio
//! - Connect retry with exponential backoff and clean cancellation
//! - Bit-exact vendor protocol codec with total notification decoding
//! - Event-driven state cache with observer fan-out
//! - Pluggable transport (BLE via `btleplug`, in-memory mock for tests)
//!
//! ## Quick Start
//!
//! ```no_run
//! use lionchief::{Direction, LionChief};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), lionchief::Error> {
//!     // Connect to the locomotive
//!     let client = LionChief::ble("FC:1F:C3:9F:A5:4A".parse()?);
//!     client.connect().await?;
//!
//!     // Ring the bell and pull away
//!     client.set_bell(true).await?;
//!     client.set_direction(Direction::Forward).await?;
//!     client.set_throttle(35).await?;
//!
//!     // State reported by the locomotive
//!     let state = client.current_state();
//!     println!("throttle: {}", state.throttle);
//!
//!     // Disconnect (stops the locomotive politely)
//!     client.disconnect().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`protocol`] - Low-level protocol types (frames, commands, notifications)
//! - [`types`] - Data structures (address, locomotive state, device info)
//! - [`transport`] - Transport implementations (BLE, mock)
//! - [`event`] - Async event system and state observers
//! - [`session`] - Connection lifecycle and retry handling
//! - [`cache`] - Notification-fed state cache
//! - [`client`] - High-level [`LionChief`] client

pub mod cache;
pub mod client;
pub mod device_info;
pub mod error;
pub mod event;
pub mod protocol;
pub mod retry;
pub mod session;
pub mod transport;
pub mod types;

// Re-exports for convenience
pub use client::LionChief;
pub use error::{
    CommandError, ConnectError, DisconnectError, Error, InvalidAddress, ParameterOutOfRange,
    Result, TransportError,
};
pub use event::{Event, EventDispatcher, StateObserver, Subscription};
pub use protocol::{Command, CommandFrame, NotificationEvent, Opcode, announcements};
pub use retry::RetryPolicy;
pub use session::ConnectionSession;
pub use transport::{BleConfig, BleTransport, MockHandle, MockTransport, Transport};
pub use types::{
    ConnectionState, DeviceInfo, Direction, LocomotiveAddress, LocomotiveState, THROTTLE_MAX,
    VOLUME_MAX, VolumeChannel, VolumeLevels,
};
