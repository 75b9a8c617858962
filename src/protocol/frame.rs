//! Command frame construction for the LionChief protocol.
//!
//! Every frame written to the command characteristic has the same shape:
//! ```text
//! ┌──────────┬──────────┬──────────────┬────────────┐
//! │   0x00   │  opcode  │  parameters  │  checksum  │
//! │  1 byte  │  1 byte  │  0..N bytes  │   1 byte   │
//! └──────────┴──────────┴──────────────┴────────────┘
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::protocol::command::Opcode;

/// Prefix byte opening every frame.
pub const FRAME_PREFIX: u8 = 0x00;

/// The fixed checksum byte closing every frame.
///
/// Stock firmware accepts zero here; the real vendor algorithm has not
/// been recovered. Preserved bit-for-bit for interoperability.
pub const CHECKSUM_FIXED: u8 = 0x00;

/// Smallest possible frame (prefix + opcode + checksum).
pub const MIN_FRAME_SIZE: usize = 3;

/// Returns the checksum byte for a frame.
///
/// If the vendor checksum algorithm is ever recovered, this is the
/// single place to implement it.
const fn checksum_for(_opcode: u8, _params: &[u8]) -> u8 {
    CHECKSUM_FIXED
}

/// An immutable command frame ready for the write characteristic.
///
/// Constructed only by the codec; a value type that is never mutated
/// after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrame {
    bytes: Bytes,
}

impl CommandFrame {
    /// Builds a frame from an opcode and its parameter bytes.
    #[must_use]
    pub fn new(opcode: Opcode, params: &[u8]) -> Self {
        let opcode = u8::from(opcode);
        let mut buf = BytesMut::with_capacity(MIN_FRAME_SIZE + params.len());
        buf.put_u8(FRAME_PREFIX);
        buf.put_u8(opcode);
        buf.put_slice(params);
        buf.put_u8(checksum_for(opcode, params));
        Self {
            bytes: buf.freeze(),
        }
    }

    /// Returns the opcode byte.
    #[must_use]
    pub fn opcode(&self) -> u8 {
        self.bytes[1]
    }

    /// Returns the parameter bytes (without prefix, opcode or checksum).
    #[must_use]
    pub fn params(&self) -> &[u8] {
        &self.bytes[2..self.bytes.len() - 1]
    }

    /// Returns the complete frame as a byte slice.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the frame, returning the underlying buffer.
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}
