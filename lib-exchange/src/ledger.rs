//! Reserve Ledger
//!
//! The exchange's three supply counters. Non-negative by type; every
//! mutation site in the exchange computes all candidate values with checked
//! arithmetic before committing any of them, so the counters move together
//! or not at all, always paired with exactly one outbound mint/withdraw
//! instruction in the same processing step.

use serde::{Deserialize, Serialize};

use lib_types::Amount;

/// Supply counters owned by the exchange
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveLedger {
    /// Custodied base asset, in nano-units
    pub reserve_nanos: Amount,
    /// Outstanding trade-token supply
    pub trade_supply: Amount,
    /// Outstanding governance-token supply
    pub gov_supply: Amount,
}

impl ReserveLedger {
    /// A ledger with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// All three counters, in (reserve, trade, gov) order
    pub fn supplies(&self) -> (Amount, Amount, Amount) {
        (self.reserve_nanos, self.trade_supply, self.gov_supply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_empty() {
        assert_eq!(ReserveLedger::new().supplies(), (0, 0, 0));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let ledger = ReserveLedger {
            reserve_nanos: 10_000_000_000,
            trade_supply: 9_000,
            gov_supply: 4,
        };
        let bytes = bincode::serialize(&ledger).unwrap();
        assert_eq!(bincode::deserialize::<ReserveLedger>(&bytes).unwrap(), ledger);
    }
}
