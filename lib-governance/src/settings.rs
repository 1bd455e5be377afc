//! Governance Settings Table
//!
//! The governance actor's own steerable parameters. Each entry's move size
//! is the **current value** of the entry named by its `step_key`, so the
//! step sizes are themselves governable. The indirection is a single table
//! lookup by construction: a step entry must be its own step, and nothing
//! may reference a step entry that is not.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use lib_types::{BoundsViolation, SettingDef, SettingKey};
use lib_wire::StepDirection;

/// Leading-bucket percentage that finalizes a lot instantly
pub const INSTANT_APPROVE: &str = "instant_approve";
/// Move size for `instant_approve`
pub const INSTANT_APPROVE_STEP: &str = "instant_approve_step";
/// Seconds after the last vote at which a lot may finalize on half support
pub const HALF_APPROVE_WAIT: &str = "half_approve_wait";
/// Move size for `half_approve_wait`
pub const HALF_APPROVE_WAIT_STEP: &str = "half_approve_wait_step";

/// Error building a settings table
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error(transparent)]
    Bounds(#[from] BoundsViolation),

    #[error("setting {key} references unknown step entry {step_key}")]
    UnknownStepKey { key: SettingKey, step_key: SettingKey },

    #[error("setting {key} reaches its step through more than one hop via {step_key}")]
    DeepIndirection { key: SettingKey, step_key: SettingKey },

    #[error("required setting {0} missing from table")]
    MissingRequired(&'static str),
}

/// The governance actor's parameter registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsTable {
    entries: BTreeMap<SettingKey, SettingDef>,
}

impl SettingsTable {
    /// Build a table from explicit definitions, validating bounds and the
    /// single-hop step rule
    pub fn new(defs: Vec<SettingDef>) -> Result<Self, SettingsError> {
        let mut entries = BTreeMap::new();
        for def in defs {
            def.validate()?;
            entries.insert(def.key, def);
        }
        let table = Self { entries };
        for def in table.entries.values() {
            let referent = table
                .entries
                .get(&def.step_key)
                .ok_or(SettingsError::UnknownStepKey { key: def.key, step_key: def.step_key })?;
            // one hop only: every step entry must be its own step
            if referent.step_key != referent.key {
                return Err(SettingsError::DeepIndirection {
                    key: def.key,
                    step_key: def.step_key,
                });
            }
        }
        Ok(table)
    }

    /// The genesis settings: 50% instant approval moving by 1 point, a
    /// five-day half-approve window moving by 10 seconds.
    pub fn genesis() -> Self {
        let def = |name: &str, value: u64, min: u64, max: u64, step: &str| SettingDef {
            key: SettingKey::from_name(name),
            value,
            min,
            max,
            step_key: SettingKey::from_name(step),
        };
        Self::new(vec![
            def(INSTANT_APPROVE, 50, 25, 75, INSTANT_APPROVE_STEP),
            def(INSTANT_APPROVE_STEP, 1, 1, 30, INSTANT_APPROVE_STEP),
            def(HALF_APPROVE_WAIT, 432_000, 72_000, 1_800_000, HALF_APPROVE_WAIT_STEP),
            def(HALF_APPROVE_WAIT_STEP, 10, 1, 30, HALF_APPROVE_WAIT_STEP),
        ])
        .unwrap_or_else(|error| unreachable!("genesis settings invalid: {error}"))
    }

    /// Look up a definition
    pub fn get(&self, key: SettingKey) -> Option<&SettingDef> {
        self.entries.get(&key)
    }

    /// Whether a key exists
    pub fn contains(&self, key: SettingKey) -> bool {
        self.entries.contains_key(&key)
    }

    /// Current value of a setting
    pub fn value(&self, key: SettingKey) -> Option<u64> {
        self.entries.get(&key).map(|d| d.value)
    }

    /// Move a setting one step in the given direction, clamped to its
    /// bounds. Returns the definition after the move, `None` on unknown key.
    pub fn apply_move(&mut self, key: SettingKey, direction: StepDirection) -> Option<SettingDef> {
        let step = self.entries.get(&self.entries.get(&key)?.step_key)?.value;
        let def = self.entries.get_mut(&key)?;
        def.value = match direction {
            StepDirection::Up => def.value.saturating_add(step).min(def.max),
            StepDirection::Down => def.value.saturating_sub(step).max(def.min),
        };
        Some(*def)
    }

    /// All entries, for accessors and serialization
    pub fn iter(&self) -> impl Iterator<Item = &SettingDef> {
        self.entries.values()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> SettingKey {
        SettingKey::from_name(name)
    }

    #[test]
    fn test_genesis_values() {
        let table = SettingsTable::genesis();
        assert_eq!(table.value(key(INSTANT_APPROVE)), Some(50));
        assert_eq!(table.value(key(INSTANT_APPROVE_STEP)), Some(1));
        assert_eq!(table.value(key(HALF_APPROVE_WAIT)), Some(432_000));
        assert_eq!(table.value(key(HALF_APPROVE_WAIT_STEP)), Some(10));
    }

    #[test]
    fn test_move_uses_step_entry_value() {
        let mut table = SettingsTable::genesis();
        let after = table.apply_move(key(INSTANT_APPROVE), StepDirection::Up).unwrap();
        assert_eq!(after.value, 51);

        let after = table.apply_move(key(HALF_APPROVE_WAIT), StepDirection::Down).unwrap();
        assert_eq!(after.value, 431_990);
    }

    #[test]
    fn test_step_entry_moves_by_itself() {
        let mut table = SettingsTable::genesis();
        // instant_approve_step is its own step: 1 + 1 = 2
        let after = table.apply_move(key(INSTANT_APPROVE_STEP), StepDirection::Up).unwrap();
        assert_eq!(after.value, 2);
        // and instant_approve now moves by the new step
        let after = table.apply_move(key(INSTANT_APPROVE), StepDirection::Up).unwrap();
        assert_eq!(after.value, 52);
    }

    #[test]
    fn test_move_clamps_to_bounds() {
        let mut table = SettingsTable::genesis();
        for _ in 0..40 {
            table.apply_move(key(INSTANT_APPROVE), StepDirection::Up);
        }
        assert_eq!(table.value(key(INSTANT_APPROVE)), Some(75));

        for _ in 0..60 {
            table.apply_move(key(INSTANT_APPROVE), StepDirection::Down);
        }
        assert_eq!(table.value(key(INSTANT_APPROVE)), Some(25));
    }

    #[test]
    fn test_unknown_step_key_rejected() {
        let def = SettingDef {
            key: key("orphan"),
            value: 1,
            min: 0,
            max: 10,
            step_key: key("missing_step"),
        };
        assert!(matches!(
            SettingsTable::new(vec![def]),
            Err(SettingsError::UnknownStepKey { .. })
        ));
    }

    #[test]
    fn test_two_hop_indirection_rejected() {
        // a -> b -> c is one hop too many
        let c = SettingDef { key: key("c"), value: 1, min: 0, max: 10, step_key: key("c") };
        let b = SettingDef { key: key("b"), value: 1, min: 0, max: 10, step_key: key("c") };
        let a = SettingDef { key: key("a"), value: 1, min: 0, max: 10, step_key: key("b") };
        assert!(matches!(
            SettingsTable::new(vec![a, b, c]),
            Err(SettingsError::DeepIndirection { .. })
        ));
    }

    #[test]
    fn test_out_of_bounds_genesis_rejected() {
        let def = SettingDef { key: key("x"), value: 11, min: 0, max: 10, step_key: key("x") };
        assert!(matches!(SettingsTable::new(vec![def]), Err(SettingsError::Bounds(_))));
    }
}
