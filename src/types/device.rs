//! Device information types.

/// Static descriptor data from the GATT Device Information service.
///
/// Each field is read once per successful connection; an individual
/// read failure leaves that field `None` and is never fatal. The whole
/// record resets to unknown on disconnect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Model number string.
    pub model: Option<String>,
    /// Serial number string.
    pub serial: Option<String>,
    /// Firmware revision string.
    pub firmware_rev: Option<String>,
    /// Hardware revision string.
    pub hardware_rev: Option<String>,
    /// Software revision string.
    pub software_rev: Option<String>,
    /// Manufacturer name string.
    pub manufacturer: Option<String>,
}

impl DeviceInfo {
    /// Returns `true` when no field has been populated.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.model.is_none()
            && self.serial.is_none()
            && self.firmware_rev.is_none()
            && self.hardware_rev.is_none()
            && self.software_rev.is_none()
            && self.manufacturer.is_none()
    }
}
