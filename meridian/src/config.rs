//! Genesis Configuration
//!
//! Injected configuration for a fresh economy: the fixed address registry
//! plus the handful of numeric parameters that are not vote-governed.
//! Everything vote-governed starts from the genesis tables in
//! `lib-exchange` and `lib-governance`.

use serde::{Deserialize, Serialize};

use lib_types::{Address, Amount, NANOS_PER_UNIT};

/// The fixed address registry shared by all actors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressBook {
    /// Reserve relay (base-asset custodian)
    pub relay: Address,
    /// The exchange
    pub exchange: Address,
    /// Trade-token ledger
    pub trade_ledger: Address,
    /// Governance-token ledger
    pub gov_ledger: Address,
    /// Governance actor
    pub governance: Address,
    /// Wallet contract authorized to submit votes
    pub vote_wallet: Address,
    /// Operator owning the custody actors
    pub operator: Address,
}

/// Genesis parameters for a fresh economy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisConfig {
    /// Fixed peer addresses
    pub addresses: AddressBook,
    /// Initial consensus denominator cached by governance
    pub gov_weight_total: Amount,
    /// Smallest deposit the relay accepts, nano-units
    pub min_deposit: Amount,
    /// Governance tokens minted to the most recent voter on finalization
    pub vote_reward: Amount,
}

impl GenesisConfig {
    /// Parse a genesis config from JSON
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).map_err(Into::into)
    }

    /// Serialize to pretty JSON (for operators writing genesis files)
    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).map_err(Into::into)
    }

    /// A self-consistent example configuration
    pub fn example() -> Self {
        Self {
            addresses: AddressBook {
                relay: Address::new([1u8; 32]),
                exchange: Address::new([2u8; 32]),
                trade_ledger: Address::new([3u8; 32]),
                gov_ledger: Address::new([4u8; 32]),
                governance: Address::new([5u8; 32]),
                vote_wallet: Address::new([6u8; 32]),
                operator: Address::new([7u8; 32]),
            },
            gov_weight_total: 0,
            min_deposit: NANOS_PER_UNIT / 10,
            vote_reward: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_roundtrip() {
        let config = GenesisConfig::example();
        let json = config.to_json().unwrap();
        let parsed = GenesisConfig::from_json(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(GenesisConfig::from_json("{\"addresses\": 3}").is_err());
    }
}
