//! Setting-Name Keys
//!
//! Every governable parameter is addressed on the wire by a 32-bit CRC of
//! its ASCII name. The hash is stable across releases but deliberately not
//! collision-proof; operators choose setting names, and the namespace is
//! small enough that collisions are an accepted (documented) risk.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 32-bit key identifying a single named setting
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize, Default)]
pub struct SettingKey(pub u32);

impl SettingKey {
    /// Derive the key for a setting name
    pub fn from_name(name: &str) -> Self {
        Self(crc32fast::hash(name.as_bytes()))
    }

    /// Raw key value as carried on the wire
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Debug for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SettingKey({:#010x})", self.0)
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

impl From<u32> for SettingKey {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}
