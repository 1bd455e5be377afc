//! Voting Lots
//!
//! A lot is the in-progress aggregate of one proposal for a
//! `(target, setting)` pair: three weight buckets, the voter trail, and the
//! finalize deadline. Lots are ephemeral, created by the first vote and
//! destroyed on finalization, and addressed by a deterministic
//! content-derived id.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use lib_types::{Address, Amount, SettingKey, Timestamp};
use lib_wire::VoteDirection;

/// Deterministic lot identifier for a (target, setting) pair
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct LotId(pub [u8; 32]);

impl LotId {
    /// Derive the id for a pair.
    ///
    /// Uses Blake3 with a domain separator so lot ids can never collide
    /// with other derived identifiers.
    pub fn derive(target: &Address, key: SettingKey) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"MERIDIAN_GOVERNANCE_LOT_V1");
        hasher.update(target.as_bytes());
        let key_bytes =
            bincode::serialize(&key).unwrap_or_else(|_| unreachable!("SettingKey serializes"));
        hasher.update(&key_bytes);
        Self(*hasher.finalize().as_bytes())
    }
}

impl std::fmt::Debug for LotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LotId({})", hex::encode(&self.0[..8]))
    }
}

/// Where a lot stands in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LotPhase {
    /// Accepting votes; below the instant-approve threshold
    Open,
    /// Threshold met for an external target; awaiting the target's Confirm
    PendingConfirmation,
}

/// One in-flight proposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lot {
    /// Actor whose setting is being voted on
    pub target: Address,
    /// Setting under vote
    pub key: SettingKey,
    /// Weight voting to keep the current value
    pub preserve_weight: Amount,
    /// Weight voting to move the value up
    pub increase_weight: Amount,
    /// Weight voting to move the value down
    pub decrease_weight: Amount,
    /// Most recent voter; receives the finalization reward
    pub last_voter: Address,
    /// Timestamp of the most recent vote
    pub last_vote_time: Timestamp,
    /// After this instant the lot may finalize on half support
    pub finalize_deadline: Timestamp,
    /// Lifecycle phase
    pub phase: LotPhase,
}

impl Lot {
    /// Open a lot with its first vote
    pub fn open(
        target: Address,
        key: SettingKey,
        voter: Address,
        now: Timestamp,
        wait: u64,
    ) -> Self {
        Self {
            target,
            key,
            preserve_weight: 0,
            increase_weight: 0,
            decrease_weight: 0,
            last_voter: voter,
            last_vote_time: now,
            finalize_deadline: now.saturating_add(wait),
            phase: LotPhase::Open,
        }
    }

    /// Bank a vote: add weight to the direction's bucket and refresh the
    /// voter trail and timers. Buckets only ever grow.
    pub fn bank(
        &mut self,
        direction: VoteDirection,
        weight: Amount,
        voter: Address,
        now: Timestamp,
        wait: u64,
    ) {
        let bucket = match direction {
            VoteDirection::Preserve => &mut self.preserve_weight,
            VoteDirection::Increase => &mut self.increase_weight,
            VoteDirection::Decrease => &mut self.decrease_weight,
        };
        *bucket = bucket.saturating_add(weight);
        self.last_voter = voter;
        self.last_vote_time = now;
        self.finalize_deadline = now.saturating_add(wait);
    }

    /// The leading bucket and its weight. Preserve wins ties: when support
    /// is split evenly, the status quo stands.
    pub fn leading(&self) -> (VoteDirection, Amount) {
        if self.preserve_weight >= self.increase_weight
            && self.preserve_weight >= self.decrease_weight
        {
            (VoteDirection::Preserve, self.preserve_weight)
        } else if self.increase_weight >= self.decrease_weight {
            (VoteDirection::Increase, self.increase_weight)
        } else {
            (VoteDirection::Decrease, self.decrease_weight)
        }
    }
}

/// The governance actor's table of in-flight lots
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotTable {
    lots: BTreeMap<LotId, Lot>,
}

impl LotTable {
    /// An empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a lot by pair
    pub fn get(&self, target: &Address, key: SettingKey) -> Option<&Lot> {
        self.lots.get(&LotId::derive(target, key))
    }

    /// Mutable lookup by pair
    pub fn get_mut(&mut self, target: &Address, key: SettingKey) -> Option<&mut Lot> {
        self.lots.get_mut(&LotId::derive(target, key))
    }

    /// Insert a freshly opened lot
    pub fn insert(&mut self, lot: Lot) {
        self.lots.insert(LotId::derive(&lot.target, lot.key), lot);
    }

    /// Remove a lot on finalization, returning it
    pub fn remove(&mut self, target: &Address, key: SettingKey) -> Option<Lot> {
        self.lots.remove(&LotId::derive(target, key))
    }

    /// Number of in-flight lots
    pub fn len(&self) -> usize {
        self.lots.len()
    }

    /// Whether no lots are in flight
    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================
