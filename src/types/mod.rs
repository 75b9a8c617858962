//! Data types for locomotive control.
//!
//! This module contains the core data structures used throughout the library:
//! - Locomotive addresses
//! - Connection and locomotive state
//! - Device information

pub mod address;
pub mod device;
pub mod state;

pub use address::{ADDRESS_LEN, LocomotiveAddress};
pub use device::DeviceInfo;
pub use state::{
    ConnectionState, Direction, LocomotiveState, THROTTLE_MAX, VOLUME_MAX, VolumeChannel,
    VolumeLevels,
};
