//! Locomotive address handling.

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::error::InvalidAddress;
use crate::protocol::uuids;

/// Number of octets in a Bluetooth device address.
pub const ADDRESS_LEN: usize = 6;

/// The identity of one locomotive: a 6-octet Bluetooth address plus an
/// optional override for the primary service UUID.
///
/// The canonical textual form is colon-separated hexadecimal
/// (`FC:1F:C3:9F:A5:4A`); parsing accepts either case, display renders
/// uppercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocomotiveAddress {
    octets: [u8; ADDRESS_LEN],
    service_uuid: Option<Uuid>,
}

impl LocomotiveAddress {
    /// Parses an address from its canonical colon-separated form.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidAddress`] unless the input is exactly six
    /// two-digit hexadecimal groups separated by colons.
    pub fn parse(s: &str) -> Result<Self, InvalidAddress> {
        let groups: Vec<&str> = s.split(':').collect();
        if groups.len() != ADDRESS_LEN {
            return Err(InvalidAddress(s.to_string()));
        }

        let mut octets = [0u8; ADDRESS_LEN];
        for (octet, group) in octets.iter_mut().zip(&groups) {
            if group.len() != 2 {
                return Err(InvalidAddress(s.to_string()));
            }
            let decoded = hex::decode(group).map_err(|_| InvalidAddress(s.to_string()))?;
            *octet = decoded[0];
        }

        Ok(Self {
            octets,
            service_uuid: None,
        })
    }

    /// Creates an address directly from its six octets.
    #[must_use]
    pub const fn from_octets(octets: [u8; ADDRESS_LEN]) -> Self {
        Self {
            octets,
            service_uuid: None,
        }
    }

    /// Overrides the primary service UUID advertised by this locomotive.
    ///
    /// Unusual hardware revisions advertise a non-default service; the
    /// characteristic layout underneath is unchanged.
    #[must_use]
    pub const fn with_service_uuid(mut self, service_uuid: Uuid) -> Self {
        self.service_uuid = Some(service_uuid);
        self
    }

    /// Returns the raw address octets in display order.
    #[must_use]
    pub const fn octets(&self) -> [u8; ADDRESS_LEN] {
        self.octets
    }

    /// Returns the effective primary service UUID: the override if one
    /// was supplied, otherwise the vendor default.
    #[must_use]
    pub fn service_uuid(&self) -> Uuid {
        self.service_uuid.unwrap_or(uuids::LIONCHIEF_SERVICE)
    }
}

impl FromStr for LocomotiveAddress {
    type Err = InvalidAddress;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for LocomotiveAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = &self.octets;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            o[0], o[1], o[2], o[3], o[4], o[5]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical() {
        let addr = LocomotiveAddress::parse("FC:1F:C3:9F:A5:4A").unwrap();
        assert_eq!(addr.octets(), [0xFC, 0x1F, 0xC3, 0x9F, 0xA5, 0x4A]);
    }

    #[test]
    fn test_parse_lowercase() {
        let addr = LocomotiveAddress::parse("fc:1f:c3:9f:a5:4a").unwrap();
        assert_eq!(addr.octets(), [0xFC, 0x1F, 0xC3, 0x9F, 0xA5, 0x4A]);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        for input in [
            "",
            "FC:1F:C3:9F:A5",
            "FC:1F:C3:9F:A5:4A:00",
            "FC:1F:C3:9F:A5:GG",
            "FC1F:C3:9F:A5:4A",
            "FC:1F:C3:9F:A5:4",
            "FC-1F-C3-9F-A5-4A",
            "FC:1F:C3:9F:A5:4AB",
        ] {
            let result = LocomotiveAddress::parse(input);
            assert!(result.is_err(), "accepted {input:?}");
            assert_eq!(result.unwrap_err(), InvalidAddress(input.to_string()));
        }
    }

    #[test]
    fn test_display_round_trip() {
        let addr = LocomotiveAddress::parse("fc:1f:c3:9f:a5:4a").unwrap();
        assert_eq!(addr.to_string(), "FC:1F:C3:9F:A5:4A");
        assert_eq!(LocomotiveAddress::parse(&addr.to_string()).unwrap(), addr);
    }

    #[test]
    fn test_from_str() {
        let addr: LocomotiveAddress = "FC:1F:C3:9F:A5:4A".parse().unwrap();
        assert_eq!(addr.to_string(), "FC:1F:C3:9F:A5:4A");
    }

    #[test]
    fn test_default_service_uuid() {
        let addr = LocomotiveAddress::from_octets([0; 6]);
        assert_eq!(addr.service_uuid(), uuids::LIONCHIEF_SERVICE);
    }

    #[test]
    fn test_service_uuid_override() {
        let custom = Uuid::from_u128(0x0102_0304_0506_0708_090a_0b0c_0d0e_0f10);
        let addr = LocomotiveAddress::from_octets([0; 6]).with_service_uuid(custom);
        assert_eq!(addr.service_uuid(), custom);
    }
}
