//! Message Types
//!
//! The typed form of every operation that crosses an actor boundary. The
//! binary layout lives in [`crate::codec`]; actors only ever see these
//! types.

use serde::{Deserialize, Serialize};

use lib_types::{Address, Amount, SettingKey, Timestamp};

// ============================================================================
// OPERATION TAGS
// ============================================================================

/// 32-bit operation tag, first field of every message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum OpTag {
    /// Base-asset deposit (user -> relay, relay -> exchange)
    Deposit = 0x10,
    /// Ledger notifies the exchange that tokens were burned
    BurnNotice = 0x11,
    /// Instruct a ledger to mint tokens to a recipient
    Mint = 0x12,
    /// Instruct the relay to pay out base asset to a recipient
    Withdraw = 0x13,
    /// Plain base-asset payout/refund to the envelope destination
    Transfer = 0x14,
    /// Burn tokens held by an owner (wallet -> ledger)
    Burn = 0x15,
    /// Move a fee setting's value or step one unit up or down
    ChangeSettings = 0x20,
    /// Ask a settings owner whether a key exists; confirmed on success
    CheckSettingsFormat = 0x21,
    /// Settings owner's positive reply to a format check
    Confirm = 0x22,
    /// Weighted vote on a (target, setting) pair
    Voting = 0x30,
    /// Replace the cached governance-token supply total
    UpdateGovWeight = 0x31,
    /// Trigger deadline finalization of a lot
    FinalizeLot = 0x32,
    /// Rotate a custody actor's owner address
    ChangeOwner = 0x40,
}

impl OpTag {
    /// Decode a raw 32-bit tag
    pub fn from_u32(raw: u32) -> Option<Self> {
        match raw {
            0x10 => Some(Self::Deposit),
            0x11 => Some(Self::BurnNotice),
            0x12 => Some(Self::Mint),
            0x13 => Some(Self::Withdraw),
            0x14 => Some(Self::Transfer),
            0x15 => Some(Self::Burn),
            0x20 => Some(Self::ChangeSettings),
            0x21 => Some(Self::CheckSettingsFormat),
            0x22 => Some(Self::Confirm),
            0x30 => Some(Self::Voting),
            0x31 => Some(Self::UpdateGovWeight),
            0x32 => Some(Self::FinalizeLot),
            0x40 => Some(Self::ChangeOwner),
            _ => None,
        }
    }
}

/// Sub-tag on trade-token burn notices: both sell-for-reserve and
/// buy-governance ride the same `BurnNotice` tag, so the purpose travels as
/// an explicit 32-bit discriminator. Gov-ledger notices carry none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum BurnPurpose {
    /// Trade tokens burned to withdraw reserve (sell)
    ForReserve = 0xb1,
    /// Trade tokens burned to mint governance tokens (buy gov)
    ForGov = 0xb2,
}

impl BurnPurpose {
    /// Decode a raw sub-tag
    pub fn from_u32(raw: u32) -> Option<Self> {
        match raw {
            0xb1 => Some(Self::ForReserve),
            0xb2 => Some(Self::ForGov),
            _ => None,
        }
    }
}

// ============================================================================
// FLAG FIELDS
// ============================================================================

/// Which half of a fee setting a change addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SettingTarget {
    /// The fee rate itself
    Value = 0,
    /// The move size used by future changes
    Step = 1,
}

/// Direction of a settings move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum StepDirection {
    Up = 0,
    Down = 1,
}

/// Direction a vote pushes a setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum VoteDirection {
    /// Keep the current value
    Preserve = 0,
    Increase = 1,
    Decrease = 2,
}

impl VoteDirection {
    /// The settings move this vote direction finalizes into, if any
    pub fn step_direction(self) -> Option<StepDirection> {
        match self {
            Self::Preserve => None,
            Self::Increase => Some(StepDirection::Up),
            Self::Decrease => Some(StepDirection::Down),
        }
    }
}

// ============================================================================
// PAYLOADS
// ============================================================================

/// Operation-specific message body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payload {
    /// Base-asset deposit. `balance_hint` is present only on the
    /// relay-to-exchange variant and carries the relay's post-deposit
    /// balance; the exchange does not price from it.
    Deposit {
        depositor: Address,
        amount: Amount,
        balance_hint: Option<Amount>,
    },
    /// Burn notification forwarded by a ledger to the exchange
    BurnNotice {
        origin: Address,
        amount: Amount,
        purpose: Option<BurnPurpose>,
    },
    /// Mint instruction to a ledger
    Mint { recipient: Address, amount: Amount },
    /// Withdrawal instruction to the relay
    Withdraw { recipient: Address, amount: Amount },
    /// Base-asset payout to the envelope destination
    Transfer { amount: Amount },
    /// Burn request from a token owner to a ledger
    Burn {
        owner: Address,
        amount: Amount,
        purpose: Option<BurnPurpose>,
    },
    /// Settings move on the receiving actor
    ChangeSettings {
        key: SettingKey,
        target: SettingTarget,
        direction: StepDirection,
    },
    /// Key-existence probe; `weight` and `direction` are echoed in the reply
    CheckSettingsFormat {
        key: SettingKey,
        weight: Amount,
        direction: VoteDirection,
    },
    /// Positive format-check reply
    Confirm {
        key: SettingKey,
        weight: Amount,
        direction: VoteDirection,
    },
    /// Weighted vote
    Voting {
        query: Address,
        weight: Amount,
        target: Address,
        key: SettingKey,
        new_vote: bool,
        direction: VoteDirection,
    },
    /// Supply-source update of the consensus denominator
    UpdateGovWeight { total: Amount },
    /// Deadline-finalization trigger for a lot
    FinalizeLot { target: Address, key: SettingKey },
    /// Custody owner rotation
    ChangeOwner { new_owner: Address },
}

impl Payload {
    /// Operation tag this payload rides under
    pub fn tag(&self) -> OpTag {
        match self {
            Payload::Deposit { .. } => OpTag::Deposit,
            Payload::BurnNotice { .. } => OpTag::BurnNotice,
            Payload::Mint { .. } => OpTag::Mint,
            Payload::Withdraw { .. } => OpTag::Withdraw,
            Payload::Transfer { .. } => OpTag::Transfer,
            Payload::Burn { .. } => OpTag::Burn,
            Payload::ChangeSettings { .. } => OpTag::ChangeSettings,
            Payload::CheckSettingsFormat { .. } => OpTag::CheckSettingsFormat,
            Payload::Confirm { .. } => OpTag::Confirm,
            Payload::Voting { .. } => OpTag::Voting,
            Payload::UpdateGovWeight { .. } => OpTag::UpdateGovWeight,
            Payload::FinalizeLot { .. } => OpTag::FinalizeLot,
            Payload::ChangeOwner { .. } => OpTag::ChangeOwner,
        }
    }
}

/// A complete message: header timestamp plus payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unix seconds, embedded by the sender
    pub timestamp: Timestamp,
    /// Operation body
    pub payload: Payload,
}

impl Message {
    /// Construct a message
    pub fn new(timestamp: Timestamp, payload: Payload) -> Self {
        Self { timestamp, payload }
    }
}
