//! Canonical Primitive Types for Meridian Actors
//!
//! Rule: No String identifiers in actor state. Ever.
//!
//! These types are the foundational building blocks for all persistent
//! actor state. They are designed to be:
//! - Fixed-size (no dynamic allocation)
//! - Deterministically serializable
//! - Efficient to copy and compare

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// TYPE ALIASES
// ============================================================================

/// Token and reserve amounts (supports up to ~340 undecillion units)
pub type Amount = u128;

/// Basis points for percentage calculations (10000 = 100%)
pub type Bps = u16;

/// Message-embedded time, unix seconds. There is no shared clock; every
/// actor takes time exclusively from the envelope it is processing.
pub type Timestamp = u64;

/// Basis-point denominator (100%)
pub const BPS_DENOM: u32 = 10_000;

/// Nano-units per whole reserve unit. Reserve amounts travel on the wire
/// and in ledgers in nano-units so fee arithmetic stays exact-integer.
pub const NANOS_PER_UNIT: Amount = 1_000_000_000;

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// 32-byte actor address
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize, Default)]
pub struct Address(pub [u8; 32]);

impl Address {
    /// Create a new Address from raw bytes
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create a zeroed Address
    pub const fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Get the underlying bytes
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check if this is the zero address
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", hex::encode(&self.0[..8]))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl From<[u8; 32]> for Address {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// ============================================================================
// TESTS
// ============================================================================
