//! Protocol definitions for LionChief communication.
//!
//! This module contains the low-level protocol types including:
//! - Command frame construction
//! - Command opcodes and encoding
//! - Notification decoding
//! - Vendor service/characteristic UUIDs

pub mod command;
pub mod frame;
pub mod notify;
pub mod uuids;

pub use command::{Command, Opcode, announcements};
pub use frame::{CHECKSUM_FIXED, CommandFrame, FRAME_PREFIX};
pub use notify::{NotificationEvent, STATUS_OPCODE, decode};
