//! Token Ledgers
//!
//! One ledger per token kind, owning the minted supply and per-address
//! balances. Mints are believed only from registered authorities; burns
//! must come from the token owner and are forwarded to the exchange as
//! burn notices. A bounced notice re-credits the burned tokens: the
//! exchange refused the conversion, so the burn never economically
//! happened.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use lib_actor::{Actor, Envelope, HandleResult, Reject};
use lib_types::{Address, Amount};
use lib_wire::{BurnPurpose, Payload};

/// Which token this ledger owns; decides the burn-notice sub-tag rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerKind {
    /// Trade tokens: two burn purposes share the notice tag, so the
    /// purpose sub-tag is mandatory
    Trade,
    /// Governance tokens: a single burn purpose, no sub-tag on notices
    Gov,
}

/// A token ledger actor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenLedger {
    address: Address,
    owner: Address,
    exchange: Address,
    kind: LedgerKind,
    /// Addresses whose mint instructions are honored
    mint_authorities: BTreeSet<Address>,
    total_supply: Amount,
    balances: BTreeMap<Address, Amount>,
}

impl TokenLedger {
    /// Create an empty ledger
    pub fn new(
        address: Address,
        owner: Address,
        exchange: Address,
        kind: LedgerKind,
        mint_authorities: BTreeSet<Address>,
    ) -> Self {
        Self {
            address,
            owner,
            exchange,
            kind,
            mint_authorities,
            total_supply: 0,
            balances: BTreeMap::new(),
        }
    }

    /// Outstanding supply
    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Balance held by an address
    pub fn balance_of(&self, address: &Address) -> Amount {
        self.balances.get(address).copied().unwrap_or(0)
    }

    /// Current owner
    pub fn owner(&self) -> Address {
        self.owner
    }

    fn on_mint(&mut self, envelope: &Envelope, recipient: Address, amount: Amount) -> HandleResult {
        if !self.mint_authorities.contains(&envelope.from) {
            return Err(Reject::AccessDenied(format!(
                "mint from unauthorized sender {}",
                envelope.from
            )));
        }
        let supply = self.total_supply.checked_add(amount).ok_or(Reject::Overflow(amount))?;
        let balance = self
            .balance_of(&recipient)
            .checked_add(amount)
            .ok_or(Reject::Overflow(amount))?;
        self.total_supply = supply;
        self.balances.insert(recipient, balance);

        tracing::info!(%recipient, amount, supply, kind = ?self.kind, "tokens minted");
        Ok(Vec::new())
    }

    fn on_burn(
        &mut self,
        envelope: &Envelope,
        owner: Address,
        amount: Amount,
        purpose: Option<BurnPurpose>,
    ) -> HandleResult {
        // only the holder burns their own tokens
        if envelope.from != owner {
            return Err(Reject::AccessDenied(format!(
                "burn of {owner}'s tokens requested by {}",
                envelope.from
            )));
        }
        let forwarded_purpose = match self.kind {
            LedgerKind::Trade => match purpose {
                Some(p) => Some(p),
                None => {
                    return Err(Reject::MalformedSettings(
                        "trade-token burn requires a purpose sub-tag".to_string(),
                    ))
                }
            },
            LedgerKind::Gov => None,
        };

        let balance = self.balance_of(&owner).checked_sub(amount).ok_or_else(|| {
            Reject::InsufficientInput(format!(
                "burn of {amount} exceeds balance of {}",
                self.balance_of(&owner)
            ))
        })?;
        let supply = self.total_supply.checked_sub(amount).ok_or_else(|| {
            Reject::InsufficientInput(format!(
                "burn of {amount} exceeds supply of {}",
                self.total_supply
            ))
        })?;
        self.balances.insert(owner, balance);
        self.total_supply = supply;

        tracing::info!(%owner, amount, supply, kind = ?self.kind, "tokens burned; notifying exchange");
        Ok(vec![Envelope::new(
            self.address,
            self.exchange,
            envelope.timestamp(),
            Payload::BurnNotice { origin: owner, amount, purpose: forwarded_purpose },
        )])
    }

    fn on_change_owner(&mut self, envelope: &Envelope, new_owner: Address) -> HandleResult {
        if envelope.from != self.owner {
            return Err(Reject::AccessDenied(format!(
                "owner change from non-owner {}",
                envelope.from
            )));
        }
        tracing::info!(old = %self.owner, new = %new_owner, "ledger owner rotated");
        self.owner = new_owner;
        Ok(Vec::new())
    }
}

impl Actor for TokenLedger {
    fn address(&self) -> Address {
        self.address
    }

    fn handle(&mut self, envelope: &Envelope) -> HandleResult {
        match *envelope.payload() {
            Payload::Mint { recipient, amount } => self.on_mint(envelope, recipient, amount),
            Payload::Burn { owner, amount, purpose } => {
                self.on_burn(envelope, owner, amount, purpose)
            }
            Payload::ChangeOwner { new_owner } => self.on_change_owner(envelope, new_owner),
            ref other => Err(Reject::Unsupported(other.tag())),
        }
    }

    fn on_bounce(&mut self, envelope: &Envelope) -> Vec<Envelope> {
        // a burn notice the exchange refused: the conversion never happened,
        // so the burned tokens come back
        if let Payload::BurnNotice { origin, amount, .. } = *envelope.payload() {
            self.total_supply = self.total_supply.saturating_add(amount);
            let balance = self.balance_of(&origin).saturating_add(amount);
            self.balances.insert(origin, balance);
            tracing::warn!(%origin, amount, "burn notice bounced; tokens re-credited");
        } else {
            tracing::warn!(to = %envelope.from, "unhandled bounce at ledger");
        }
        Vec::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
