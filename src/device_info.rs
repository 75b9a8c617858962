//! GATT Device Information reader.
//!
//! Reads the six descriptor characteristics exposed by the standard
//! Device Information service (0x180A). Locomotives differ in which
//! characteristics they populate, so every read is best-effort.

use uuid::Uuid;

use crate::protocol::uuids;
use crate::transport::Transport;
use crate::types::DeviceInfo;

/// Reads all device information characteristics over `transport`.
///
/// A failed or empty read leaves the corresponding field `None`; the
/// call itself never fails.
pub async fn read_device_info<T: Transport>(transport: &mut T) -> DeviceInfo {
    DeviceInfo {
        model: read_string(transport, uuids::MODEL_NUMBER, "model number").await,
        serial: read_string(transport, uuids::SERIAL_NUMBER, "serial number").await,
        firmware_rev: read_string(transport, uuids::FIRMWARE_REVISION, "firmware revision").await,
        hardware_rev: read_string(transport, uuids::HARDWARE_REVISION, "hardware revision").await,
        software_rev: read_string(transport, uuids::SOFTWARE_REVISION, "software revision").await,
        manufacturer: read_string(transport, uuids::MANUFACTURER_NAME, "manufacturer name").await,
    }
}

/// Reads one characteristic as a trimmed UTF-8 string.
async fn read_string<T: Transport>(
    transport: &mut T,
    characteristic: Uuid,
    field: &'static str,
) -> Option<String> {
    match transport.read(characteristic).await {
        Ok(raw) => {
            let text = String::from_utf8_lossy(&raw);
            let text = text.trim_end_matches('\0').trim();
            if text.is_empty() {
                None
            } else {
                Some(text.to_owned())
            }
        }
        Err(e) => {
            tracing::debug!("device info read failed for {field}: {e}");
            None
        }
    }
}
