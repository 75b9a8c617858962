//! Service and characteristic UUIDs of the LionChief BLE interface.
//!
//! These values come from the vendor protocol reverse-engineering and
//! are the contract the codec assumes. Only the primary service UUID is
//! overridable (per locomotive, see
//! [`LocomotiveAddress::with_service_uuid`](crate::types::LocomotiveAddress::with_service_uuid));
//! the characteristic layout is fixed.

use uuid::Uuid;

/// Primary control service advertised by LionChief locomotives.
pub const LIONCHIEF_SERVICE: Uuid = Uuid::from_u128(0xe20a_39f4_73f5_4bc4_a12f_17d1_ad07_a961);

/// Write characteristic accepting command frames ("LionelCommand").
pub const COMMAND_CHARACTERISTIC: Uuid =
    Uuid::from_u128(0x0859_0f7e_db05_467e_8757_72f6_faeb_13d4);

/// Notify characteristic emitting status frames ("LionelData").
pub const NOTIFY_CHARACTERISTIC: Uuid = Uuid::from_u128(0x0859_0f7e_db05_467e_8757_72f6_faeb_14d3);

/// Standard GATT Device Information service.
pub const DEVICE_INFORMATION_SERVICE: Uuid =
    Uuid::from_u128(0x0000_180a_0000_1000_8000_0080_5f9b_34fb);

/// Model number string characteristic.
pub const MODEL_NUMBER: Uuid = Uuid::from_u128(0x0000_2a24_0000_1000_8000_0080_5f9b_34fb);

/// Serial number string characteristic.
pub const SERIAL_NUMBER: Uuid = Uuid::from_u128(0x0000_2a25_0000_1000_8000_0080_5f9b_34fb);

/// Firmware revision string characteristic.
pub const FIRMWARE_REVISION: Uuid = Uuid::from_u128(0x0000_2a26_0000_1000_8000_0080_5f9b_34fb);

/// Hardware revision string characteristic.
pub const HARDWARE_REVISION: Uuid = Uuid::from_u128(0x0000_2a27_0000_1000_8000_0080_5f9b_34fb);

/// Software revision string characteristic.
pub const SOFTWARE_REVISION: Uuid = Uuid::from_u128(0x0000_2a28_0000_1000_8000_0080_5f9b_34fb);

/// Manufacturer name string characteristic.
pub const MANUFACTURER_NAME: Uuid = Uuid::from_u128(0x0000_2a29_0000_1000_8000_0080_5f9b_34fb);
