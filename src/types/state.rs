//! Locomotive state types.

use std::fmt;

/// Largest accepted throttle value.
pub const THROTTLE_MAX: u8 = 100;

/// Largest accepted volume level, for the master channel and each sound
/// channel alike.
pub const VOLUME_MAX: u8 = 10;

/// Travel direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    /// Forward travel (wire value 0x01).
    #[default]
    Forward,
    /// Reverse travel (wire value 0x02).
    Reverse,
}

impl Direction {
    /// Parses a direction from its wire byte.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::Forward),
            0x02 => Some(Self::Reverse),
            _ => None,
        }
    }

    /// Encodes the direction to its wire byte.
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        match self {
            Self::Forward => 0x01,
            Self::Reverse => 0x02,
        }
    }
}

/// The sound channel a volume command addresses.
///
/// `Master` scales everything and travels on its own opcode; the four
/// named sources share the per-channel volume opcode, selected by a
/// source byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VolumeChannel {
    /// Overall output volume.
    Master,
    /// Horn sound volume.
    Horn,
    /// Bell sound volume.
    Bell,
    /// Speech/announcement volume.
    Speech,
    /// Engine sound volume.
    Engine,
}

impl VolumeChannel {
    /// Returns the wire source byte for per-channel volume frames, or
    /// `None` for the master channel (which has a dedicated opcode).
    #[must_use]
    pub const fn source_byte(self) -> Option<u8> {
        match self {
            Self::Master => None,
            Self::Horn => Some(0x01),
            Self::Bell => Some(0x02),
            Self::Speech => Some(0x03),
            Self::Engine => Some(0x04),
        }
    }

    /// Parses a per-channel source byte.
    #[must_use]
    pub const fn from_source_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::Horn),
            0x02 => Some(Self::Bell),
            0x03 => Some(Self::Speech),
            0x04 => Some(Self::Engine),
            _ => None,
        }
    }
}

/// Per-channel volume levels, each 0..=[`VOLUME_MAX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeLevels {
    /// Master output volume.
    pub master: u8,
    /// Horn volume.
    pub horn: u8,
    /// Bell volume.
    pub bell: u8,
    /// Speech volume.
    pub speech: u8,
    /// Engine sound volume.
    pub engine: u8,
}

impl VolumeLevels {
    /// Returns the level of one channel.
    #[must_use]
    pub const fn level(&self, channel: VolumeChannel) -> u8 {
        match channel {
            VolumeChannel::Master => self.master,
            VolumeChannel::Horn => self.horn,
            VolumeChannel::Bell => self.bell,
            VolumeChannel::Speech => self.speech,
            VolumeChannel::Engine => self.engine,
        }
    }

    /// Sets the level of one channel, leaving the others untouched.
    pub const fn set_level(&mut self, channel: VolumeChannel, level: u8) {
        match channel {
            VolumeChannel::Master => self.master = level,
            VolumeChannel::Horn => self.horn = level,
            VolumeChannel::Bell => self.bell = level,
            VolumeChannel::Speech => self.speech = level,
            VolumeChannel::Engine => self.engine = level,
        }
    }
}

impl Default for VolumeLevels {
    /// Mid-range levels, matching the locomotive's power-on defaults.
    fn default() -> Self {
        Self {
            master: 5,
            horn: 5,
            bell: 5,
            speech: 5,
            engine: 5,
        }
    }
}

/// Connection lifecycle state of a session.
///
/// Exactly one value at any instant, owned by the session and mutated
/// only through its internal transition function.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport link, and none being established.
    #[default]
    Disconnected,
    /// A connect episode (including retries) is in progress.
    Connecting,
    /// The transport link is up and notifications are subscribed.
    Connected,
    /// A disconnect is releasing the transport link.
    Disconnecting,
    /// The last connect episode exhausted its attempts.
    ///
    /// Not terminal: a fresh `connect()` re-enters `Connecting`.
    Failed {
        /// Human-readable description of the final failure.
        reason: String,
    },
}

impl ConnectionState {
    /// Returns `true` only for [`ConnectionState::Connected`].
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Disconnecting => write!(f, "disconnecting"),
            Self::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

/// Last-known snapshot of everything the locomotive reports.
///
/// One instance per session, updated in place field-group by
/// field-group as notifications arrive; a notification never clobbers
/// fields it does not concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocomotiveState {
    /// Throttle position, 0..=[`THROTTLE_MAX`].
    pub throttle: u8,
    /// Travel direction.
    pub direction: Direction,
    /// Headlight state.
    pub lights_on: bool,
    /// Horn sounding.
    pub horn_on: bool,
    /// Bell ringing.
    pub bell_on: bool,
    /// Smoke unit running.
    pub smoke_on: bool,
    /// Per-channel volume levels.
    pub volumes: VolumeLevels,
    /// Connection lifecycle state.
    pub connection: ConnectionState,
}

impl Default for LocomotiveState {
    /// Power-on defaults: stopped, forward, lights on, sounds off,
    /// mid-range volumes, disconnected.
    fn default() -> Self {
        Self {
            throttle: 0,
            direction: Direction::Forward,
            lights_on: true,
            horn_on: false,
            bell_on: false,
            smoke_on: false,
            volumes: VolumeLevels::default(),
            connection: ConnectionState::Disconnected,
        }
    }
}
