//! The Exchange Actor
//!
//! Message handling for the four trade operations and the settings-change
//! protocol. See the crate docs for the trust model and conservation rules.

use serde::{Deserialize, Serialize};

use lib_actor::{Actor, Envelope, HandleResult, Reject};
use lib_types::{Address, Amount, Bps, SettingKey, BPS_DENOM};
use lib_wire::{BurnPurpose, Payload, SettingTarget, StepDirection, VoteDirection};

use crate::fees::{FeeTable, GOV_BUY_FEE, GOV_SELL_FEE, TRADE_BUY_FEE, TRADE_SELL_FEE};
use crate::ledger::ReserveLedger;

/// Peer addresses, fixed at actor creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangePeers {
    /// Custodian of the base asset; sole authorized depositor
    pub reserve_relay: Address,
    /// Trade-token ledger; sole source of trade-burn notifications
    pub trade_ledger: Address,
    /// Governance-token ledger; sole source of gov-burn notifications
    pub gov_ledger: Address,
    /// Governance actor; sole authority over the fee table
    pub governance: Address,
}

/// Integer conversion constants linking the three asset units.
///
/// The governance pair is deliberately asymmetric between buy and sell;
/// the two directions are independent constants and nothing here assumes
/// they agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairScales {
    /// Nano-units of reserve per trade token (both directions)
    pub nanos_per_trade: Amount,
    /// Trade tokens burned per governance token minted
    pub trade_per_gov_buy: Amount,
    /// Trade tokens minted per governance token burned
    pub trade_per_gov_sell: Amount,
}

impl Default for PairScales {
    fn default() -> Self {
        Self { nanos_per_trade: 1_000_000, trade_per_gov_buy: 1_000, trade_per_gov_sell: 1_500 }
    }
}

/// Pre-derived keys of the four fee settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct FeeKeys {
    trade_buy: SettingKey,
    trade_sell: SettingKey,
    gov_buy: SettingKey,
    gov_sell: SettingKey,
}

impl FeeKeys {
    fn derive() -> Self {
        Self {
            trade_buy: SettingKey::from_name(TRADE_BUY_FEE),
            trade_sell: SettingKey::from_name(TRADE_SELL_FEE),
            gov_buy: SettingKey::from_name(GOV_BUY_FEE),
            gov_sell: SettingKey::from_name(GOV_SELL_FEE),
        }
    }
}

/// The exchange actor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exchange {
    address: Address,
    peers: ExchangePeers,
    ledger: ReserveLedger,
    fees: FeeTable,
    scales: PairScales,
    keys: FeeKeys,
}

impl Exchange {
    /// Create an exchange with an explicit fee table and scales
    pub fn new(address: Address, peers: ExchangePeers, fees: FeeTable, scales: PairScales) -> Self {
        Self { address, peers, ledger: ReserveLedger::new(), fees, scales, keys: FeeKeys::derive() }
    }

    /// Create an exchange with genesis fees and default scales
    pub fn genesis(address: Address, peers: ExchangePeers) -> Self {
        Self::new(address, peers, FeeTable::genesis(), PairScales::default())
    }

    // ========================================================================
    // READ ACCESSORS (no side effects)
    // ========================================================================

    /// Supply counters in (reserve_nanos, trade, gov) order
    pub fn supplies(&self) -> (Amount, Amount, Amount) {
        self.ledger.supplies()
    }

    /// Peer registry
    pub fn peers(&self) -> &ExchangePeers {
        &self.peers
    }

    /// Fee lookup by key: (value, step)
    pub fn fee(&self, key: SettingKey) -> Option<(Bps, Bps)> {
        self.fees.get(key).map(|f| (f.value, f.step))
    }

    /// The full fee table
    pub fn fees(&self) -> impl Iterator<Item = &lib_types::FeeSetting> {
        self.fees.iter()
    }

    // ========================================================================
    // TRADE OPERATIONS
    // ========================================================================

    fn buy_trade(
        &mut self,
        envelope: &Envelope,
        depositor: Address,
        amount: Amount,
    ) -> HandleResult {
        self.authorize(envelope.from, self.peers.reserve_relay, "deposit")?;

        let keep = (BPS_DENOM - self.rate(self.keys.trade_buy) as u32) as Amount;
        let scaled = amount / self.scales.nanos_per_trade;
        let trade_out = scaled
            .checked_mul(keep)
            .ok_or(Reject::Overflow(amount))?
            / BPS_DENOM as Amount;
        if trade_out == 0 {
            return Err(Reject::InsufficientInput(format!(
                "deposit of {amount} nano yields no trade tokens after fees"
            )));
        }

        let reserve = self
            .ledger
            .reserve_nanos
            .checked_add(amount)
            .ok_or(Reject::Overflow(amount))?;
        let trade = self
            .ledger
            .trade_supply
            .checked_add(trade_out)
            .ok_or(Reject::Overflow(trade_out))?;
        self.ledger.reserve_nanos = reserve;
        self.ledger.trade_supply = trade;

        tracing::info!(%depositor, amount, trade_out, "reserve deposit priced into trade tokens");
        Ok(vec![Envelope::new(
            self.address,
            self.peers.trade_ledger,
            envelope.timestamp(),
            Payload::Mint { recipient: depositor, amount: trade_out },
        )])
    }

    fn sell_trade(&mut self, envelope: &Envelope, seller: Address, amount: Amount) -> HandleResult {
        let keep = (BPS_DENOM - self.rate(self.keys.trade_sell) as u32) as Amount;
        let reserve_out = amount
            .checked_mul(self.scales.nanos_per_trade)
            .and_then(|v| v.checked_mul(keep))
            .ok_or(Reject::Overflow(amount))?
            / BPS_DENOM as Amount;
        if reserve_out == 0 {
            return Err(Reject::InsufficientInput(format!(
                "burn of {amount} trade tokens yields no reserve after fees"
            )));
        }

        let reserve = self.ledger.reserve_nanos.checked_sub(reserve_out).ok_or_else(|| {
            Reject::InsufficientInput(format!(
                "withdrawal of {reserve_out} nano exceeds reserve of {}",
                self.ledger.reserve_nanos
            ))
        })?;
        // the full burned amount leaves the supply, independent of fee
        let trade = self.ledger.trade_supply.checked_sub(amount).ok_or_else(|| {
            Reject::InsufficientInput(format!(
                "burn of {amount} exceeds trade supply of {}",
                self.ledger.trade_supply
            ))
        })?;
        self.ledger.reserve_nanos = reserve;
        self.ledger.trade_supply = trade;

        tracing::info!(%seller, amount, reserve_out, "trade tokens sold back into reserve");
        Ok(vec![Envelope::new(
            self.address,
            self.peers.reserve_relay,
            envelope.timestamp(),
            Payload::Withdraw { recipient: seller, amount: reserve_out },
        )])
    }

    fn buy_gov(&mut self, envelope: &Envelope, buyer: Address, amount: Amount) -> HandleResult {
        let keep = (BPS_DENOM - self.rate(self.keys.gov_buy) as u32) as Amount;
        let gov_out = amount
            .checked_mul(keep)
            .ok_or(Reject::Overflow(amount))?
            / BPS_DENOM as Amount
            / self.scales.trade_per_gov_buy;
        if gov_out == 0 {
            return Err(Reject::InsufficientInput(format!(
                "burn of {amount} trade tokens yields no governance tokens after fees"
            )));
        }

        let trade = self.ledger.trade_supply.checked_sub(amount).ok_or_else(|| {
            Reject::InsufficientInput(format!(
                "burn of {amount} exceeds trade supply of {}",
                self.ledger.trade_supply
            ))
        })?;
        let gov = self
            .ledger
            .gov_supply
            .checked_add(gov_out)
            .ok_or(Reject::Overflow(gov_out))?;
        self.ledger.trade_supply = trade;
        self.ledger.gov_supply = gov;

        tracing::info!(%buyer, amount, gov_out, "trade tokens converted to governance tokens");
        Ok(vec![
            Envelope::new(
                self.address,
                self.peers.gov_ledger,
                envelope.timestamp(),
                Payload::Mint { recipient: buyer, amount: gov_out },
            ),
            self.gov_weight_update(envelope),
        ])
    }

    fn sell_gov(&mut self, envelope: &Envelope, seller: Address, amount: Amount) -> HandleResult {
        let keep = (BPS_DENOM - self.rate(self.keys.gov_sell) as u32) as Amount;
        let trade_out = amount
            .checked_mul(self.scales.trade_per_gov_sell)
            .and_then(|v| v.checked_mul(keep))
            .ok_or(Reject::Overflow(amount))?
            / BPS_DENOM as Amount;
        if trade_out == 0 {
            return Err(Reject::InsufficientInput(format!(
                "burn of {amount} governance tokens yields no trade tokens after fees"
            )));
        }

        let gov = self.ledger.gov_supply.checked_sub(amount).ok_or_else(|| {
            Reject::InsufficientInput(format!(
                "burn of {amount} exceeds governance supply of {}",
                self.ledger.gov_supply
            ))
        })?;
        let trade = self
            .ledger
            .trade_supply
            .checked_add(trade_out)
            .ok_or(Reject::Overflow(trade_out))?;
        self.ledger.gov_supply = gov;
        self.ledger.trade_supply = trade;

        tracing::info!(%seller, amount, trade_out, "governance tokens sold back into trade tokens");
        Ok(vec![
            Envelope::new(
                self.address,
                self.peers.trade_ledger,
                envelope.timestamp(),
                Payload::Mint { recipient: seller, amount: trade_out },
            ),
            self.gov_weight_update(envelope),
        ])
    }

    // ========================================================================
    // SETTINGS PROTOCOL
    // ========================================================================

    fn change_settings(
        &mut self,
        envelope: &Envelope,
        key: SettingKey,
        target: SettingTarget,
        direction: StepDirection,
    ) -> HandleResult {
        self.authorize(envelope.from, self.peers.governance, "settings change")?;

        let after = self
            .fees
            .apply_change(key, target, direction)
            .ok_or_else(|| Reject::MalformedSettings(format!("no fee setting under key {key}")))?;
        tracing::info!(
            %key,
            ?target,
            ?direction,
            value = after.value,
            step = after.step,
            "fee setting moved"
        );
        Ok(Vec::new())
    }

    fn check_settings_format(
        &self,
        envelope: &Envelope,
        key: SettingKey,
        weight: Amount,
        direction: VoteDirection,
    ) -> HandleResult {
        self.authorize(envelope.from, self.peers.governance, "settings format check")?;

        if self.fees.get(key).is_none() {
            // no reply on failure; the transport bounce is the only signal
            return Err(Reject::MalformedSettings(format!("no fee setting under key {key}")));
        }
        Ok(vec![Envelope::new(
            self.address,
            self.peers.governance,
            envelope.timestamp(),
            Payload::Confirm { key, weight, direction },
        )])
    }

    // ========================================================================
    // HELPERS
    // ========================================================================

    fn authorize(&self, actual: Address, expected: Address, op: &str) -> Result<(), Reject> {
        if actual != expected {
            return Err(Reject::AccessDenied(format!("{op} from unauthorized sender {actual}")));
        }
        Ok(())
    }

    fn rate(&self, key: SettingKey) -> Bps {
        // the four keys are installed at construction; a miss is impossible
        self.fees.rate(key).unwrap_or(0)
    }

    fn gov_weight_update(&self, envelope: &Envelope) -> Envelope {
        Envelope::new(
            self.address,
            self.peers.governance,
            envelope.timestamp(),
            Payload::UpdateGovWeight { total: self.ledger.gov_supply },
        )
    }
}

impl Actor for Exchange {
    fn address(&self) -> Address {
        self.address
    }

    fn handle(&mut self, envelope: &Envelope) -> HandleResult {
        match *envelope.payload() {
            Payload::Deposit { depositor, amount, .. } => {
                self.buy_trade(envelope, depositor, amount)
            }
            Payload::BurnNotice { origin, amount, purpose } => {
                if envelope.from == self.peers.trade_ledger {
                    match purpose {
                        Some(BurnPurpose::ForReserve) => self.sell_trade(envelope, origin, amount),
                        Some(BurnPurpose::ForGov) => self.buy_gov(envelope, origin, amount),
                        None => Err(Reject::MalformedSettings(
                            "trade-ledger burn notice missing purpose sub-tag".to_string(),
                        )),
                    }
                } else if envelope.from == self.peers.gov_ledger {
                    self.sell_gov(envelope, origin, amount)
                } else {
                    Err(Reject::AccessDenied(format!(
                        "burn notice from unauthorized sender {}",
                        envelope.from
                    )))
                }
            }
            Payload::ChangeSettings { key, target, direction } => {
                self.change_settings(envelope, key, target, direction)
            }
            Payload::CheckSettingsFormat { key, weight, direction } => {
                self.check_settings_format(envelope, key, weight, direction)
            }
            ref other => Err(Reject::Unsupported(other.tag())),
        }
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

    fn peers() -> ExchangePeers {
        ExchangePeers {
            reserve_relay: addr(1),
            trade_ledger: addr(2),
            gov_ledger: addr(3),
            governance: addr(4),
        }
    }

    fn exchange() -> Exchange {
        Exchange::genesis(addr(10), peers())
    }

    fn deposit(amount_units: Amount) -> Envelope {
        Envelope::new(
            addr(1),
            addr(10),
            1_000,
            Payload::Deposit {
                depositor: addr(9),
                amount: amount_units * NANOS_PER_UNIT,
                balance_hint: Some(amount_units * NANOS_PER_UNIT),
            },
        )
    }

    fn burn(from: Address, amount: Amount, purpose: Option<BurnPurpose>) -> Envelope {
        Envelope::new(
            from,
            addr(10),
            1_001,
            Payload::BurnNotice { origin: addr(9), amount, purpose },
        )
    }

    #[test]
    fn test_buy_trade_prices_with_fee() {
        let mut ex = exchange();
        let out = ex.handle(&deposit(10)).unwrap();

        assert_eq!(ex.supplies(), (10 * NANOS_PER_UNIT, 9_000, 0));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].to, addr(2));
        assert_eq!(
            *out[0].payload(),
            Payload::Mint { recipient: addr(9), amount: 9_000 }
        );
    }

    #[test]
    fn test_buy_trade_rejects_unauthorized() {
        let mut ex = exchange();
        let mut env = deposit(10);
        env.from = addr(66);
        let before = ex.supplies();
        assert!(matches!(ex.handle(&env), Err(Reject::AccessDenied(_))));
        assert_eq!(ex.supplies(), before);
    }

    #[test]
    fn test_sell_trade_withdraws_reserve() {
        let mut ex = exchange();
        ex.handle(&deposit(10)).unwrap();

        let out = ex
            .handle(&burn(addr(2), 8_000, Some(BurnPurpose::ForReserve)))
            .unwrap();

        // 8000 tokens at 5% fee: 7.6 reserve units out, full burn off supply
        assert_eq!(ex.supplies(), (2_400_000_000, 1_000, 0));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].to, addr(1));
        assert_eq!(
            *out[0].payload(),
            Payload::Withdraw { recipient: addr(9), amount: 7_600_000_000 }
        );
    }

    #[test]
    fn test_sell_trade_rejects_unauthorized() {
        let mut ex = exchange();
        ex.handle(&deposit(10)).unwrap();
        let before = ex.supplies();
        let result = ex.handle(&burn(addr(66), 8_000, Some(BurnPurpose::ForReserve)));
        assert!(matches!(result, Err(Reject::AccessDenied(_))));
        assert_eq!(ex.supplies(), before);
    }

    #[test]
    fn test_buy_gov_floors_twice() {
        let mut ex = exchange();
        ex.handle(&deposit(10)).unwrap();

        let out = ex.handle(&burn(addr(2), 5_000, Some(BurnPurpose::ForGov))).unwrap();
        assert_eq!(ex.supplies(), (10 * NANOS_PER_UNIT, 4_000, 4));
        assert_eq!(out.len(), 2);
        assert_eq!(*out[0].payload(), Payload::Mint { recipient: addr(9), amount: 4 });
        assert_eq!(out[0].to, addr(3));
        assert_eq!(*out[1].payload(), Payload::UpdateGovWeight { total: 4 });
        assert_eq!(out[1].to, addr(4));

        // 1530 at 2% fee leaves 1499 after the fee floor, then 1 gov token
        ex.handle(&burn(addr(2), 1_530, Some(BurnPurpose::ForGov))).unwrap();
        assert_eq!(ex.supplies(), (10 * NANOS_PER_UNIT, 2_470, 5));
    }

    #[test]
    fn test_sell_gov_uses_sell_scale() {
        let mut ex = exchange();
        ex.handle(&deposit(10)).unwrap();
        ex.handle(&burn(addr(2), 5_000, Some(BurnPurpose::ForGov))).unwrap();

        let out = ex.handle(&burn(addr(3), 3, None)).unwrap();

        // 3 gov at the 1500 sell scale and 1% fee: 4455 trade tokens back
        assert_eq!(ex.supplies(), (10 * NANOS_PER_UNIT, 8_455, 1));
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].to, addr(2));
        assert_eq!(*out[0].payload(), Payload::Mint { recipient: addr(9), amount: 4_455 });
        assert_eq!(*out[1].payload(), Payload::UpdateGovWeight { total: 1 });
    }

    #[test]
    fn test_trade_burn_without_purpose_rejected() {
        let mut ex = exchange();
        ex.handle(&deposit(10)).unwrap();
        let before = ex.supplies();
        let result = ex.handle(&burn(addr(2), 1_000, None));
        assert!(matches!(result, Err(Reject::MalformedSettings(_))));
        assert_eq!(ex.supplies(), before);
    }

    #[test]
    fn test_dust_deposit_rejected_not_clamped() {
        let mut ex = exchange();
        let env = Envelope::new(
            addr(1),
            addr(10),
            1_000,
            Payload::Deposit { depositor: addr(9), amount: 999, balance_hint: None },
        );
        assert!(matches!(ex.handle(&env), Err(Reject::InsufficientInput(_))));
        assert_eq!(ex.supplies(), (0, 0, 0));
    }

    #[test]
    fn test_dust_gov_buy_rejected_not_clamped() {
        let mut ex = exchange();
        ex.handle(&deposit(10)).unwrap();
        let before = ex.supplies();
        // 1000 trade at 2% fee leaves 980, which floors to zero gov tokens
        let result = ex.handle(&burn(addr(2), 1_000, Some(BurnPurpose::ForGov)));
        assert!(matches!(result, Err(Reject::InsufficientInput(_))));
        assert_eq!(ex.supplies(), before);
    }

    #[test]
    fn test_sell_exceeding_reserve_rejected() {
        let mut ex = exchange();
        ex.handle(&deposit(1)).unwrap();
        let before = ex.supplies();
        // supply holds 900 tokens; a forged 20k burn must not drain reserve
        let result = ex.handle(&burn(addr(2), 20_000, Some(BurnPurpose::ForReserve)));
        assert!(matches!(result, Err(Reject::InsufficientInput(_))));
        assert_eq!(ex.supplies(), before);
    }

    #[test]
    fn test_change_settings_authorized_only() {
        let mut ex = exchange();
        let key = SettingKey::from_name(TRADE_BUY_FEE);
        let change = |from: Address| {
            Envelope::new(
                from,
                addr(10),
                1_002,
                Payload::ChangeSettings {
                    key,
                    target: SettingTarget::Value,
                    direction: StepDirection::Up,
                },
            )
        };

        assert!(matches!(ex.handle(&change(addr(66))), Err(Reject::AccessDenied(_))));
        assert_eq!(ex.fee(key), Some((1000, 1000)));

        let out = ex.handle(&change(addr(4))).unwrap();
        assert!(out.is_empty());
        assert_eq!(ex.fee(key), Some((1200, 1000)));
    }

    #[test]
    fn test_change_settings_unknown_key() {
        let mut ex = exchange();
        let env = Envelope::new(
            addr(4),
            addr(10),
            1_002,
            Payload::ChangeSettings {
                key: SettingKey::from_name("no_such_fee"),
                target: SettingTarget::Step,
                direction: StepDirection::Down,
            },
        );
        assert!(matches!(ex.handle(&env), Err(Reject::MalformedSettings(_))));
    }

    #[test]
    fn test_check_settings_format_confirms() {
        let mut ex = exchange();
        let key = SettingKey::from_name(TRADE_BUY_FEE);
        let env = Envelope::new(
            addr(4),
            addr(10),
            1_003,
            Payload::CheckSettingsFormat { key, weight: 5, direction: VoteDirection::Increase },
        );
        let out = ex.handle(&env).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].to, addr(4));
        assert_eq!(
            *out[0].payload(),
            Payload::Confirm { key, weight: 5, direction: VoteDirection::Increase }
        );
    }

    #[test]
    fn test_check_settings_format_failures() {
        let mut ex = exchange();
        let good_key = SettingKey::from_name(TRADE_BUY_FEE);
        let from_stranger = Envelope::new(
            addr(66),
            addr(10),
            1_003,
            Payload::CheckSettingsFormat {
                key: good_key,
                weight: 1,
                direction: VoteDirection::Increase,
            },
        );
        assert!(matches!(ex.handle(&from_stranger), Err(Reject::AccessDenied(_))));

        let bad_key = Envelope::new(
            addr(4),
            addr(10),
            1_003,
            Payload::CheckSettingsFormat {
                key: SettingKey::from_name("bad_setting"),
                weight: 1,
                direction: VoteDirection::Increase,
            },
        );
        assert!(matches!(ex.handle(&bad_key), Err(Reject::MalformedSettings(_))));
    }

    #[test]
    fn test_unrelated_op_unsupported() {
        let mut ex = exchange();
        let env = Envelope::new(addr(1), addr(10), 0, Payload::Transfer { amount: 1 });
        assert!(matches!(ex.handle(&env), Err(Reject::Unsupported(_))));
    }
}
