//! Notification decoding for the LionChief protocol.
//!
//! Decoding is total: any byte sequence produces an event. Malformed
//! lengths, unrecognized opcodes and out-of-domain values all degrade
//! to [`NotificationEvent::Unknown`] so a single noisy frame can never
//! tear the session down. The raw bytes of unknown frames are kept for
//! diagnostics.

use crate::protocol::command::Opcode;
use crate::protocol::frame::{FRAME_PREFIX, MIN_FRAME_SIZE};
use crate::types::{Direction, THROTTLE_MAX, VOLUME_MAX, VolumeChannel};

/// Opcode of the composite status frame the locomotive pushes.
pub const STATUS_OPCODE: u8 = 0x81;

/// Sub-type byte carried by status frames.
const STATUS_SUBTYPE: u8 = 0x02;

/// Raw speed ceiling inside status frames; scaled to 0-100 on decode.
const STATUS_SPEED_RAW_MAX: u8 = 31;

/// Minimum length of a status frame.
const STATUS_FRAME_LEN: usize = 8;

/// Headlights bit in the status flags byte.
const STATUS_FLAG_LIGHTS: u8 = 0x04;

/// Bell bit in the status flags byte.
const STATUS_FLAG_BELL: u8 = 0x02;

/// A decoded notification from the locomotive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    /// Throttle position changed (0-100).
    SpeedChanged(u8),
    /// Travel direction changed.
    DirectionChanged(Direction),
    /// Headlights switched.
    LightsChanged(bool),
    /// Horn switched.
    HornChanged(bool),
    /// Bell switched.
    BellChanged(bool),
    /// Smoke unit switched.
    SmokeChanged(bool),
    /// One volume channel changed.
    VolumeChanged {
        /// The channel that changed.
        channel: VolumeChannel,
        /// The new level (0-10).
        level: u8,
    },
    /// Composite status report pushed by the locomotive.
    Status {
        /// Throttle position, already scaled to 0-100.
        throttle: u8,
        /// Travel direction.
        direction: Direction,
        /// Headlights state.
        lights_on: bool,
        /// Bell state.
        bell_on: bool,
    },
    /// Anything the decoder does not recognize, kept verbatim.
    Unknown(Vec<u8>),
}

/// Decodes one raw notification frame.
///
/// Total function: never fails, never panics. Anything that is not a
/// well-formed frame with an in-domain payload comes back as
/// [`NotificationEvent::Unknown`] carrying the raw bytes.
#[must_use]
pub fn decode(raw: &[u8]) -> NotificationEvent {
    try_decode(raw).unwrap_or_else(|| NotificationEvent::Unknown(raw.to_vec()))
}

fn try_decode(raw: &[u8]) -> Option<NotificationEvent> {
    if raw.len() < MIN_FRAME_SIZE || raw[0] != FRAME_PREFIX {
        return None;
    }
    if raw[1] == STATUS_OPCODE {
        return decode_status(raw);
    }

    let params = &raw[2..];
    match Opcode::from_byte(raw[1])? {
        Opcode::Speed => {
            let value = *params.first()?;
            (value <= THROTTLE_MAX).then_some(NotificationEvent::SpeedChanged(value))
        }
        Opcode::Direction => {
            Direction::from_byte(*params.first()?).map(NotificationEvent::DirectionChanged)
        }
        Opcode::Lights => decode_switch(params).map(NotificationEvent::LightsChanged),
        Opcode::Horn => decode_switch(params).map(NotificationEvent::HornChanged),
        Opcode::Bell => decode_switch(params).map(NotificationEvent::BellChanged),
        Opcode::Smoke => decode_switch(params).map(NotificationEvent::SmokeChanged),
        Opcode::SoundVolume => {
            let channel = VolumeChannel::from_source_byte(*params.first()?)?;
            let level = *params.get(1)?;
            (level <= VOLUME_MAX).then_some(NotificationEvent::VolumeChanged { channel, level })
        }
        Opcode::MasterVolume => {
            let level = *params.first()?;
            (level <= VOLUME_MAX).then_some(NotificationEvent::VolumeChanged {
                channel: VolumeChannel::Master,
                level,
            })
        }
        // Command-only opcodes; the locomotive never echoes these.
        Opcode::Shutdown | Opcode::Announcement => None,
    }
}

fn decode_switch(params: &[u8]) -> Option<bool> {
    match *params.first()? {
        0x00 => Some(false),
        0x01 => Some(true),
        _ => None,
    }
}

/// Status frame layout: `[0x00, 0x81, 0x02, speed, direction, _, _, flags]`.
fn decode_status(raw: &[u8]) -> Option<NotificationEvent> {
    if raw.len() < STATUS_FRAME_LEN || raw[2] != STATUS_SUBTYPE {
        return None;
    }

    let raw_speed = raw[3];
    if raw_speed > STATUS_SPEED_RAW_MAX {
        return None;
    }
    let throttle =
        (u16::from(raw_speed) * u16::from(THROTTLE_MAX) / u16::from(STATUS_SPEED_RAW_MAX)) as u8;

    let direction = if raw[4] == 0x01 {
        Direction::Forward
    } else {
        Direction::Reverse
    };

    let flags = raw[7];
    Some(NotificationEvent::Status {
        throttle,
        direction,
        lights_on: flags & STATUS_FLAG_LIGHTS != 0,
        bell_on: flags & STATUS_FLAG_BELL != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::command::Command;

    #[test]
    fn test_decode_speed() {
        assert_eq!(
            decode(&[0x00, 0x45, 50, 0x00]),
            NotificationEvent::SpeedChanged(50)
        );
    }

    #[test]
    fn test_encode_decode_round_trip_all_throttle_values() {
        for value in 0..=100 {
            let frame = Command::SetSpeed(value).encode().unwrap();
            assert_eq!(
                decode(frame.as_bytes()),
                NotificationEvent::SpeedChanged(value),
                "round trip failed for {value}"
            );
        }
    }

    #[test]
    fn test_decode_speed_out_of_domain() {
        let raw = [0x00, 0x45, 101, 0x00];
        assert_eq!(decode(&raw), NotificationEvent::Unknown(raw.to_vec()));
    }

    #[test]
    fn test_decode_direction() {
        assert_eq!(
            decode(&[0x00, 0x46, 0x01, 0x00]),
            NotificationEvent::DirectionChanged(Direction::Forward)
        );
        assert_eq!(
            decode(&[0x00, 0x46, 0x02, 0x00]),
            NotificationEvent::DirectionChanged(Direction::Reverse)
        );

        let bad = [0x00, 0x46, 0x07, 0x00];
        assert_eq!(decode(&bad), NotificationEvent::Unknown(bad.to_vec()));
    }

    #[test]
    fn test_decode_switches() {
        assert_eq!(
            decode(&[0x00, 0x51, 0x01, 0x00]),
            NotificationEvent::LightsChanged(true)
        );
        assert_eq!(
            decode(&[0x00, 0x48, 0x00, 0x00]),
            NotificationEvent::HornChanged(false)
        );
        assert_eq!(
            decode(&[0x00, 0x47, 0x01, 0x00]),
            NotificationEvent::BellChanged(true)
        );
        assert_eq!(
            decode(&[0x00, 0x52, 0x00, 0x00]),
            NotificationEvent::SmokeChanged(false)
        );

        let bad = [0x00, 0x51, 0x02, 0x00];
        assert_eq!(decode(&bad), NotificationEvent::Unknown(bad.to_vec()));
    }

    #[test]
    fn test_decode_volume() {
        assert_eq!(
            decode(&[0x00, 0x44, 0x01, 7, 0x00]),
            NotificationEvent::VolumeChanged {
                channel: VolumeChannel::Horn,
                level: 7,
            }
        );
        assert_eq!(
            decode(&[0x00, 0x4C, 4, 0x00]),
            NotificationEvent::VolumeChanged {
                channel: VolumeChannel::Master,
                level: 4,
            }
        );

        // Unknown source byte.
        let bad_source = [0x00, 0x44, 0x09, 5, 0x00];
        assert_eq!(
            decode(&bad_source),
            NotificationEvent::Unknown(bad_source.to_vec())
        );

        // Level above the protocol domain.
        let bad_level = [0x00, 0x44, 0x01, 11, 0x00];
        assert_eq!(
            decode(&bad_level),
            NotificationEvent::Unknown(bad_level.to_vec())
        );
    }

    #[test]
    fn test_decode_status() {
        assert_eq!(
            decode(&[0x00, 0x81, 0x02, 31, 0x01, 0x03, 0x0C, 0x06]),
            NotificationEvent::Status {
                throttle: 100,
                direction: Direction::Forward,
                lights_on: true,
                bell_on: true,
            }
        );
        assert_eq!(
            decode(&[0x00, 0x81, 0x02, 0, 0x02, 0x03, 0x0C, 0x00]),
            NotificationEvent::Status {
                throttle: 0,
                direction: Direction::Reverse,
                lights_on: false,
                bell_on: false,
            }
        );
        // Truncating division, matching the device's own scaling.
        assert_eq!(
            decode(&[0x00, 0x81, 0x02, 15, 0x01, 0x03, 0x0C, 0x04]),
            NotificationEvent::Status {
                throttle: 48,
                direction: Direction::Forward,
                lights_on: true,
                bell_on: false,
            }
        );
    }

    #[test]
    fn test_decode_status_malformed() {
        // Too short.
        let short = [0x00, 0x81, 0x02, 10, 0x01, 0x03, 0x0C];
        assert_eq!(decode(&short), NotificationEvent::Unknown(short.to_vec()));

        // Wrong sub-type.
        let subtype = [0x00, 0x81, 0x03, 10, 0x01, 0x03, 0x0C, 0x00];
        assert_eq!(
            decode(&subtype),
            NotificationEvent::Unknown(subtype.to_vec())
        );

        // Raw speed beyond the 5-bit domain.
        let speed = [0x00, 0x81, 0x02, 32, 0x01, 0x03, 0x0C, 0x00];
        assert_eq!(decode(&speed), NotificationEvent::Unknown(speed.to_vec()));
    }

    #[test]
    fn test_decode_command_only_opcodes() {
        let announcement = [0x00, 0x4D, 0x02, 0x00, 0x00];
        assert_eq!(
            decode(&announcement),
            NotificationEvent::Unknown(announcement.to_vec())
        );

        let shutdown = [0x00, 0x4B, 0x00, 0x00, 0x00];
        assert_eq!(
            decode(&shutdown),
            NotificationEvent::Unknown(shutdown.to_vec())
        );
    }

    #[test]
    fn test_decode_is_total() {
        // Empty, truncated and prefix-less input.
        assert_eq!(decode(&[]), NotificationEvent::Unknown(Vec::new()));
        assert_eq!(decode(&[0x00]), NotificationEvent::Unknown(vec![0x00]));
        assert_eq!(
            decode(&[0x00, 0x45]),
            NotificationEvent::Unknown(vec![0x00, 0x45])
        );
        assert_eq!(
            decode(&[0x45, 0x45, 50, 0x00]),
            NotificationEvent::Unknown(vec![0x45, 0x45, 50, 0x00])
        );

        // Pseudo-random sweep: decode must return for every input.
        let mut seed = 0x2545_f491_4f6c_dd1d_u64;
        for _ in 0..2000 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let len = (seed % 16) as usize;
            let buf: Vec<u8> = (0..len)
                .map(|i| (seed.rotate_left(u32::try_from(i).unwrap() * 8) & 0xFF) as u8)
                .collect();
            let _ = decode(&buf);
        }
    }
}
