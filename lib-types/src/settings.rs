//! Governable Parameter Types
//!
//! Pure data types for the two kinds of steerable settings in the economy.
//! Behavior (fee application, step moves, vote-driven mutation) lives in
//! `lib-exchange` and `lib-governance`.
//!
//! Rule: These types must remain behavior-free and serialization-stable.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::keys::SettingKey;
use crate::primitives::Bps;

/// A fee rate owned by the exchange, one per trade operation.
///
/// Invariant: `min <= value <= max` and `min_step <= step <= max_step` at
/// all times. Constructed at genesis and mutated only through the
/// settings-change protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSetting {
    /// Key this fee is addressed by on the wire
    pub key: SettingKey,
    /// Current rate in basis points
    pub value: Bps,
    /// Lower bound for `value`
    pub min: Bps,
    /// Upper bound for `value`
    pub max: Bps,
    /// Move size, as a basis-point fraction of the allowed range
    pub step: Bps,
    /// Lower bound for `step`
    pub min_step: Bps,
    /// Upper bound for `step`
    pub max_step: Bps,
}

impl FeeSetting {
    /// Check the bound invariants
    pub fn validate(&self) -> Result<(), BoundsViolation> {
        if self.min > self.value || self.value > self.max {
            return Err(BoundsViolation {
                key: self.key,
                field: "value",
                value: self.value as u64,
                min: self.min as u64,
                max: self.max as u64,
            });
        }
        if self.min_step > self.step || self.step > self.max_step {
            return Err(BoundsViolation {
                key: self.key,
                field: "step",
                value: self.step as u64,
                min: self.min_step as u64,
                max: self.max_step as u64,
            });
        }
        Ok(())
    }
}

/// A governance-owned parameter.
///
/// `step_key` references the settings-table entry whose current value is
/// this entry's move delta. The indirection is single-hop: a step entry may
/// reference itself, and nothing deeper is permitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingDef {
    /// Key this setting is addressed by on the wire
    pub key: SettingKey,
    /// Current value (unit depends on the setting: percent, seconds, ...)
    pub value: u64,
    /// Lower bound for `value`
    pub min: u64,
    /// Upper bound for `value`
    pub max: u64,
    /// Entry whose current value is this entry's move delta
    pub step_key: SettingKey,
}

impl SettingDef {
    /// Check the bound invariant
    pub fn validate(&self) -> Result<(), BoundsViolation> {
        if self.min > self.value || self.value > self.max {
            return Err(BoundsViolation {
                key: self.key,
                field: "value",
                value: self.value,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Error returned when a setting leaves its configured bounds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundsViolation {
    /// Offending setting
    pub key: SettingKey,
    /// Which field broke the invariant
    pub field: &'static str,
    /// Observed value
    pub value: u64,
    /// Permitted lower bound
    pub min: u64,
    /// Permitted upper bound
    pub max: u64,
}

impl fmt::Display for BoundsViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "setting {} {} = {} outside [{}, {}]",
            self.key, self.field, self.value, self.min, self.max
        )
    }
}

impl std::error::Error for BoundsViolation {}
