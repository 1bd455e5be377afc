//! Meridian Wire Protocol
//!
//! Binary message format for all actor-to-actor traffic.
//!
//! # Protocol Design
//!
//! - **Header**: 32-bit operation tag + 64-bit message-embedded timestamp
//!   (unix seconds; actors have no other clock)
//! - **Fields**: fixed order, fixed-width integers big-endian, addresses as
//!   32 raw bytes, amounts var-length (1-byte length + magnitude)
//! - **Flags**: sub-byte fields (vote direction, settings target) are packed
//!   into single bytes
//!
//! # Wire Format
//!
//! ```text
//! +----------+-----------------+------------------------+
//! | tag (4B) | timestamp (8B)  |  op-specific fields    |
//! +----------+-----------------+------------------------+
//! ```

pub mod codec;
pub mod message;

pub use codec::WireError;
pub use message::{
    BurnPurpose, Message, OpTag, Payload, SettingTarget, StepDirection, VoteDirection,
};
