//! Meridian Canonical Types
//!
//! Foundational primitive and parameter types shared by every actor in the
//! Meridian token economy.
//!
//! # Key Principles
//!
//! 1. **No String identifiers in actor state**: addresses and setting keys
//!    are fixed-size, content-derived values
//! 2. **Behavior-free**: these types carry data and invariants; the logic
//!    that moves them lives in `lib-exchange` and `lib-governance`
//! 3. **Serialization-stable**: every persistent type derives serde and
//!    round-trips through bincode unchanged

pub mod keys;
pub mod primitives;
pub mod settings;

pub use keys::SettingKey;
pub use primitives::{Address, Amount, Bps, Timestamp, BPS_DENOM, NANOS_PER_UNIT};
pub use settings::{BoundsViolation, FeeSetting, SettingDef};
