//! Fee Table
//!
//! One `FeeSetting` per trade operation, addressed by the CRC-32 key of its
//! name. Moves are clamped, integer-only, and sized as a basis-point
//! fraction of the allowed range: a setting with `step = 1000` moves by 10%
//! of `max - min` per change. The step itself moves the same way over
//! `max_step - min_step`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use lib_types::{BoundsViolation, Bps, FeeSetting, SettingKey, BPS_DENOM};
use lib_wire::{SettingTarget, StepDirection};

/// Fee on reserve deposits buying trade tokens
pub const TRADE_BUY_FEE: &str = "trade_buy_fee";
/// Fee on trade-token burns withdrawing reserve
pub const TRADE_SELL_FEE: &str = "trade_sell_fee";
/// Fee on trade-token burns buying governance tokens
pub const GOV_BUY_FEE: &str = "gov_buy_fee";
/// Fee on governance-token burns selling back into trade tokens
pub const GOV_SELL_FEE: &str = "gov_sell_fee";

/// The exchange's fee registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeTable {
    entries: BTreeMap<SettingKey, FeeSetting>,
}

impl FeeTable {
    /// Build a table from explicit settings, validating every invariant
    pub fn new(settings: Vec<FeeSetting>) -> Result<Self, BoundsViolation> {
        let mut entries = BTreeMap::new();
        for setting in settings {
            setting.validate()?;
            entries.insert(setting.key, setting);
        }
        Ok(Self { entries })
    }

    /// The genesis fee table: 10% buy / 5% sell on the trade pair, 2% buy /
    /// 1% sell on the governance pair, shared bounds.
    pub fn genesis() -> Self {
        let fee = |name: &str, value: Bps| FeeSetting {
            key: SettingKey::from_name(name),
            value,
            min: 0,
            max: 2000,
            step: 1000,
            min_step: 100,
            max_step: 2000,
        };
        Self::new(vec![
            fee(TRADE_BUY_FEE, 1000),
            fee(TRADE_SELL_FEE, 500),
            fee(GOV_BUY_FEE, 200),
            fee(GOV_SELL_FEE, 100),
        ])
        .unwrap_or_else(|violation| unreachable!("genesis fees invalid: {violation}"))
    }

    /// Look up a fee setting
    pub fn get(&self, key: SettingKey) -> Option<&FeeSetting> {
        self.entries.get(&key)
    }

    /// Current rate in basis points
    pub fn rate(&self, key: SettingKey) -> Option<Bps> {
        self.entries.get(&key).map(|f| f.value)
    }

    /// Move a setting's value or step one unit in the given direction,
    /// clamped to its bounds. Returns the setting after the move, or `None`
    /// for an unknown key.
    pub fn apply_change(
        &mut self,
        key: SettingKey,
        target: SettingTarget,
        direction: StepDirection,
    ) -> Option<FeeSetting> {
        let setting = self.entries.get_mut(&key)?;
        match target {
            SettingTarget::Value => {
                let span = (setting.max - setting.min) as u32;
                let delta = span * setting.step as u32 / BPS_DENOM;
                setting.value = moved(setting.value, setting.min, setting.max, delta, direction);
            }
            SettingTarget::Step => {
                let span = (setting.max_step - setting.min_step) as u32;
                let delta = span * setting.step as u32 / BPS_DENOM;
                setting.step =
                    moved(setting.step, setting.min_step, setting.max_step, delta, direction);
            }
        }
        Some(*setting)
    }

    /// All entries, for accessors and serialization
    pub fn iter(&self) -> impl Iterator<Item = &FeeSetting> {
        self.entries.values()
    }
}

fn moved(current: Bps, min: Bps, max: Bps, delta: u32, direction: StepDirection) -> Bps {
    let moved = match direction {
        StepDirection::Up => (current as u32).saturating_add(delta).min(max as u32),
        StepDirection::Down => (current as u32).saturating_sub(delta).max(min as u32),
    };
    moved as Bps
}

// ============================================================================
// TESTS
// ============================================================================
