//! Reserve Relay
//!
//! Custodian of the base asset. Deposits from any sender are banked and
//! forwarded to the exchange for pricing; withdrawals are honored only when
//! the exchange instructs them. If a forwarded deposit bounces, the relay
//! refunds the depositor; the exchange has already refused to price it, so
//! holding the value would strand it.

use serde::{Deserialize, Serialize};

use lib_actor::{Actor, Envelope, HandleResult, Reject};
use lib_types::{Address, Amount};
use lib_wire::Payload;

/// The reserve relay actor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReserveRelay {
    address: Address,
    owner: Address,
    exchange: Address,
    /// Custodied base asset, nano-units
    balance: Amount,
    /// Deposits below this are refused outright
    min_deposit: Amount,
}

impl ReserveRelay {
    /// Create a relay custodying nothing
    pub fn new(address: Address, owner: Address, exchange: Address, min_deposit: Amount) -> Self {
        Self { address, owner, exchange, balance: 0, min_deposit }
    }

    /// Custodied balance in nano-units
    pub fn balance(&self) -> Amount {
        self.balance
    }

    /// Current owner
    pub fn owner(&self) -> Address {
        self.owner
    }

    fn on_deposit(&mut self, envelope: &Envelope, amount: Amount) -> HandleResult {
        if amount < self.min_deposit {
            return Err(Reject::InsufficientInput(format!(
                "deposit of {amount} nano below relay minimum of {}",
                self.min_deposit
            )));
        }
        let balance = self.balance.checked_add(amount).ok_or(Reject::Overflow(amount))?;
        self.balance = balance;

        // the sender is the authoritative depositor; the payload address of
        // an inbound user deposit is not trusted
        let depositor = envelope.from;
        tracing::info!(%depositor, amount, balance, "deposit banked and forwarded for pricing");
        Ok(vec![Envelope::new(
            self.address,
            self.exchange,
            envelope.timestamp(),
            Payload::Deposit { depositor, amount, balance_hint: Some(balance) },
        )])
    }

    fn on_withdraw(
        &mut self,
        envelope: &Envelope,
        recipient: Address,
        amount: Amount,
    ) -> HandleResult {
        if envelope.from != self.exchange {
            return Err(Reject::AccessDenied(format!(
                "withdrawal from unauthorized sender {}",
                envelope.from
            )));
        }
        let balance = self.balance.checked_sub(amount).ok_or_else(|| {
            Reject::InsufficientInput(format!(
                "withdrawal of {amount} nano exceeds custody of {}",
                self.balance
            ))
        })?;
        self.balance = balance;

        tracing::info!(%recipient, amount, balance, "withdrawal paid out");
        Ok(vec![Envelope::new(
            self.address,
            recipient,
            envelope.timestamp(),
            Payload::Transfer { amount },
        )])
    }

    fn on_change_owner(&mut self, envelope: &Envelope, new_owner: Address) -> HandleResult {
        if envelope.from != self.owner {
            return Err(Reject::AccessDenied(format!(
                "owner change from non-owner {}",
                envelope.from
            )));
        }
        tracing::info!(old = %self.owner, new = %new_owner, "relay owner rotated");
        self.owner = new_owner;
        Ok(Vec::new())
    }
}

impl Actor for ReserveRelay {
    fn address(&self) -> Address {
        self.address
    }

    fn handle(&mut self, envelope: &Envelope) -> HandleResult {
        match *envelope.payload() {
            Payload::Deposit { amount, .. } => self.on_deposit(envelope, amount),
            Payload::Withdraw { recipient, amount } => {
                self.on_withdraw(envelope, recipient, amount)
            }
            Payload::ChangeOwner { new_owner } => self.on_change_owner(envelope, new_owner),
            ref other => Err(Reject::Unsupported(other.tag())),
        }
    }

    fn on_bounce(&mut self, envelope: &Envelope) -> Vec<Envelope> {
        // a forwarded deposit the exchange refused: release the custody and
        // make the depositor whole
        if let Payload::Deposit { depositor, amount, .. } = *envelope.payload() {
            self.balance = self.balance.saturating_sub(amount);
            tracing::warn!(%depositor, amount, "deposit bounced by exchange; refunding");
            return vec![Envelope::new(
                self.address,
                depositor,
                envelope.timestamp(),
                Payload::Transfer { amount },
            )];
        }
        tracing::warn!(to = %envelope.from, "unhandled bounce at relay");
        Vec::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use lib_types::NANOS_PER_UNIT;

    fn addr(byte: u8) -> Address {
        Address::new([byte; 32])
    }

    fn relay() -> ReserveRelay {
        ReserveRelay::new(addr(1), addr(5), addr(10), NANOS_PER_UNIT / 10)
    }

    fn deposit(from: Address, amount: Amount) -> Envelope {
        Envelope::new(
            from,
            addr(1),
            500,
            Payload::Deposit { depositor: from, amount, balance_hint: None },
        )
    }

    #[test]
    fn test_deposit_banks_and_forwards() {
        let mut relay = relay();
        let out = relay.handle(&deposit(addr(9), 10 * NANOS_PER_UNIT)).unwrap();

        assert_eq!(relay.balance(), 10 * NANOS_PER_UNIT);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].to, addr(10));
        assert_eq!(
            *out[0].payload(),
            Payload::Deposit {
                depositor: addr(9),
                amount: 10 * NANOS_PER_UNIT,
                balance_hint: Some(10 * NANOS_PER_UNIT),
            }
        );
    }

    #[test]
    fn test_small_deposit_refused() {
        let mut relay = relay();
        let result = relay.handle(&deposit(addr(9), NANOS_PER_UNIT / 50));
        assert!(matches!(result, Err(Reject::InsufficientInput(_))));
        assert_eq!(relay.balance(), 0);
    }

    #[test]
    fn test_withdraw_only_from_exchange() {
        let mut relay = relay();
        relay.handle(&deposit(addr(9), 10 * NANOS_PER_UNIT)).unwrap();

        let forged = Envelope::new(
            addr(66),
            addr(1),
            501,
            Payload::Withdraw { recipient: addr(66), amount: NANOS_PER_UNIT },
        );
        assert!(matches!(relay.handle(&forged), Err(Reject::AccessDenied(_))));
        assert_eq!(relay.balance(), 10 * NANOS_PER_UNIT);

        let real = Envelope::new(
            addr(10),
            addr(1),
            502,
            Payload::Withdraw { recipient: addr(9), amount: 5 * NANOS_PER_UNIT },
        );
        let out = relay.handle(&real).unwrap();
        assert_eq!(relay.balance(), 5 * NANOS_PER_UNIT);
        assert_eq!(out[0].to, addr(9));
        assert_eq!(*out[0].payload(), Payload::Transfer { amount: 5 * NANOS_PER_UNIT });
    }

    #[test]
    fn test_overdraw_refused() {
        let mut relay = relay();
        relay.handle(&deposit(addr(9), NANOS_PER_UNIT)).unwrap();
        let env = Envelope::new(
            addr(10),
            addr(1),
            503,
            Payload::Withdraw { recipient: addr(9), amount: 2 * NANOS_PER_UNIT },
        );
        assert!(matches!(relay.handle(&env), Err(Reject::InsufficientInput(_))));
        assert_eq!(relay.balance(), NANOS_PER_UNIT);
    }

    #[test]
    fn test_bounced_forward_refunds_depositor() {
        let mut relay = relay();
        let out = relay.handle(&deposit(addr(9), NANOS_PER_UNIT)).unwrap();
        let refunds = relay.on_bounce(&out[0].bounce());

        assert_eq!(relay.balance(), 0);
        assert_eq!(refunds.len(), 1);
        assert_eq!(refunds[0].to, addr(9));
        assert_eq!(*refunds[0].payload(), Payload::Transfer { amount: NANOS_PER_UNIT });
    }

    #[test]
    fn test_owner_rotation() {
        let mut relay = relay();
        let forged = Envelope::new(addr(66), addr(1), 504, Payload::ChangeOwner { new_owner: addr(66) });
        assert!(matches!(relay.handle(&forged), Err(Reject::AccessDenied(_))));

        let real = Envelope::new(addr(5), addr(1), 505, Payload::ChangeOwner { new_owner: addr(6) });
        relay.handle(&real).unwrap();
        assert_eq!(relay.owner(), addr(6));
    }
}
