//! Command opcodes and encoding for the LionChief protocol.
//!
//! Commands are fire-and-forget: the locomotive never acknowledges a
//! write. Each opcode value is a protocol constant from the vendor
//! reverse-engineering and must not be altered.

use crate::error::ParameterOutOfRange;
use crate::protocol::frame::CommandFrame;
use crate::types::{Direction, THROTTLE_MAX, VOLUME_MAX, VolumeChannel};

/// Command opcodes sent to the locomotive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// Per-channel sound volume (params: source, level).
    SoundVolume = 0x44,
    /// Throttle position (param: 0-100).
    Speed = 0x45,
    /// Travel direction (param: 0x01 forward / 0x02 reverse).
    Direction = 0x46,
    /// Bell on/off (param: 0x01/0x00).
    Bell = 0x47,
    /// Horn on/off (param: 0x01/0x00).
    Horn = 0x48,
    /// Polite link shutdown (params: 0x00, 0x00).
    Shutdown = 0x4B,
    /// Master output volume (param: level).
    MasterVolume = 0x4C,
    /// Play a recorded announcement (params: code, 0x00).
    Announcement = 0x4D,
    /// Headlights on/off (param: 0x01/0x00).
    Lights = 0x51,
    /// Smoke unit on/off (param: 0x01/0x00).
    Smoke = 0x52,
}

impl Opcode {
    /// Parses an opcode byte.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x44 => Some(Self::SoundVolume),
            0x45 => Some(Self::Speed),
            0x46 => Some(Self::Direction),
            0x47 => Some(Self::Bell),
            0x48 => Some(Self::Horn),
            0x4B => Some(Self::Shutdown),
            0x4C => Some(Self::MasterVolume),
            0x4D => Some(Self::Announcement),
            0x51 => Some(Self::Lights),
            0x52 => Some(Self::Smoke),
            _ => None,
        }
    }
}

impl From<Opcode> for u8 {
    fn from(opcode: Opcode) -> Self {
        opcode as Self
    }
}

/// Announcement codes recognized by stock firmware.
pub mod announcements {
    /// A randomly chosen announcement.
    pub const RANDOM: u8 = 0x00;
    /// "All aboard!"
    pub const ALL_ABOARD: u8 = 0x02;
    /// "Full steam ahead!"
    pub const FULL_STEAM_AHEAD: u8 = 0x04;
    /// "Winter Wonderland Express"
    pub const WINTER_WONDERLAND_EXPRESS: u8 = 0x05;
}

/// A high-level command, encodable to one wire frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Set the throttle position (0..=[`THROTTLE_MAX`]).
    SetSpeed(u8),
    /// Set the travel direction.
    SetDirection(Direction),
    /// Switch the bell.
    SetBell(bool),
    /// Switch the horn.
    SetHorn(bool),
    /// Switch the headlights.
    SetLights(bool),
    /// Switch the smoke unit.
    SetSmoke(bool),
    /// Set one volume channel (0..=[`VOLUME_MAX`]).
    SetVolume {
        /// The channel to adjust.
        channel: VolumeChannel,
        /// The new level.
        level: u8,
    },
    /// Play a recorded announcement by code (see [`announcements`]).
    PlayAnnouncement(u8),
    /// Ask the locomotive to shut the link down politely.
    Shutdown,
}

impl Command {
    /// Encodes the command into its wire frame.
    ///
    /// Pure and total for all in-range parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterOutOfRange`] when a value is outside its
    /// protocol domain (throttle above 100, volume above 10).
    pub fn encode(&self) -> Result<CommandFrame, ParameterOutOfRange> {
        match *self {
            Self::SetSpeed(value) => {
                check_range("throttle", value, THROTTLE_MAX)?;
                Ok(CommandFrame::new(Opcode::Speed, &[value]))
            }
            Self::SetDirection(direction) => {
                Ok(CommandFrame::new(Opcode::Direction, &[direction.to_byte()]))
            }
            Self::SetBell(on) => Ok(CommandFrame::new(Opcode::Bell, &[u8::from(on)])),
            Self::SetHorn(on) => Ok(CommandFrame::new(Opcode::Horn, &[u8::from(on)])),
            Self::SetLights(on) => Ok(CommandFrame::new(Opcode::Lights, &[u8::from(on)])),
            Self::SetSmoke(on) => Ok(CommandFrame::new(Opcode::Smoke, &[u8::from(on)])),
            Self::SetVolume { channel, level } => {
                check_range("volume", level, VOLUME_MAX)?;
                match channel.source_byte() {
                    Some(source) => Ok(CommandFrame::new(Opcode::SoundVolume, &[source, level])),
                    None => Ok(CommandFrame::new(Opcode::MasterVolume, &[level])),
                }
            }
            Self::PlayAnnouncement(code) => {
                Ok(CommandFrame::new(Opcode::Announcement, &[code, 0x00]))
            }
            Self::Shutdown => Ok(CommandFrame::new(Opcode::Shutdown, &[0x00, 0x00])),
        }
    }
}

fn check_range(
    parameter: &'static str,
    value: u8,
    max: u8,
) -> Result<(), ParameterOutOfRange> {
    if value > max {
        return Err(ParameterOutOfRange {
            parameter,
            value,
            max,
        });
    }
    Ok(())
}
