//! End-to-end governance flows: the three-message settings handshake
//! against a live exchange, self-targeted votes, and deadline finalization.

use lib_actor::{Envelope, Outcome, Reject, Router};
use lib_governance::{LotPhase, HALF_APPROVE_WAIT};
use lib_types::{Address, Amount, SettingKey, Timestamp};
use lib_wire::{Payload, VoteDirection};
use meridian::{GenesisConfig, Network};

fn voter() -> Address {
    Address::new([9u8; 32])
}

fn config() -> GenesisConfig {
    let mut config = GenesisConfig::example();
    config.gov_weight_total = 10;
    config
}

fn run(network: &mut Network, seed: Vec<Envelope>) -> Vec<lib_actor::Delivery> {
    let mut router = Router::new(network.actors());
    router.run(seed);
    router.log().to_vec()
}

fn vote(
    config: &GenesisConfig,
    weight: Amount,
    target: Address,
    key: SettingKey,
    direction: VoteDirection,
    at: Timestamp,
) -> Envelope {
    Envelope::new(
        config.addresses.vote_wallet,
        config.addresses.governance,
        at,
        Payload::Voting { query: voter(), weight, target, key, new_vote: true, direction },
    )
}

fn fee_key() -> SettingKey {
    SettingKey::from_name("trade_buy_fee")
}

#[test]
fn majority_vote_walks_the_full_handshake() {
    let config = config();
    let mut network = Network::build(&config).unwrap();
    let exchange = config.addresses.exchange;

    let log = run(
        &mut network,
        vec![vote(&config, 5, exchange, fee_key(), VoteDirection::Increase, 1_000)],
    );

    // check -> confirm -> change, then the fee has actually moved
    assert_eq!(network.exchange.fee(fee_key()), Some((1200, 1000)));
    assert!(network.governance.lot(&exchange, fee_key()).is_none());
    // the most recent voter collected the reward
    assert_eq!(network.gov_ledger.balance_of(&voter()), 1);

    let sequence: Vec<_> = log
        .iter()
        .filter_map(|d| match *d.envelope.payload() {
            Payload::CheckSettingsFormat { .. } => Some("check"),
            Payload::Confirm { .. } => Some("confirm"),
            Payload::ChangeSettings { .. } => Some("change"),
            _ => None,
        })
        .collect();
    assert_eq!(sequence, vec!["check", "confirm", "change"]);
}

#[test]
fn minority_vote_probes_but_cannot_finalize() {
    let config = config();
    let mut network = Network::build(&config).unwrap();
    let exchange = config.addresses.exchange;

    let log = run(
        &mut network,
        vec![vote(&config, 1, exchange, fee_key(), VoteDirection::Increase, 1_000)],
    );

    // the fee is untouched and the lot is still open
    assert_eq!(network.exchange.fee(fee_key()), Some((1000, 1000)));
    let lot = network.governance.lot(&exchange, fee_key()).unwrap();
    assert_eq!(lot.phase, LotPhase::Open);
    assert_eq!(lot.increase_weight, 1);
    assert_eq!(network.gov_ledger.balance_of(&voter()), 0);

    // the exchange answered the probe, but a confirm without a pending lot
    // is refused; only the instant-approve path may finalize
    assert!(log.iter().any(|d| {
        matches!(*d.envelope.payload(), Payload::Confirm { .. })
            && matches!(d.outcome, Outcome::Rejected(Reject::AccessDenied(_)))
    }));
    assert!(!log
        .iter()
        .any(|d| matches!(*d.envelope.payload(), Payload::ChangeSettings { .. })));
}

#[test]
fn self_vote_settles_in_one_processing_step() {
    let config = config();
    let mut network = Network::build(&config).unwrap();
    let governance = config.addresses.governance;
    let key = SettingKey::from_name(HALF_APPROVE_WAIT);

    let log = run(
        &mut network,
        vec![vote(&config, 5, governance, key, VoteDirection::Increase, 1_000)],
    );

    // applied immediately: 432000 moved up by its 10-second step
    assert_eq!(network.governance.setting(key).unwrap().value, 432_010);
    assert!(network.governance.lot(&governance, key).is_none());
    assert_eq!(network.gov_ledger.balance_of(&voter()), 1);

    // the handshake trio is emitted self-addressed and settled, never
    // re-delivered
    let self_settled: Vec<_> = log
        .iter()
        .filter(|d| matches!(d.outcome, Outcome::SelfSettled))
        .map(|d| d.envelope.payload().tag())
        .collect();
    assert_eq!(self_settled.len(), 3);
}

#[test]
fn premature_finalize_is_refused() {
    let config = config();
    let mut network = Network::build(&config).unwrap();
    let exchange = config.addresses.exchange;
    run(
        &mut network,
        vec![vote(&config, 3, exchange, fee_key(), VoteDirection::Increase, 1_000)],
    );

    let keeper = Address::new([77u8; 32]);
    let early = Envelope::new(
        keeper,
        config.addresses.governance,
        1_000 + 431_999,
        Payload::FinalizeLot { target: exchange, key: fee_key() },
    );
    let log = run(&mut network, vec![early]);

    assert!(log
        .iter()
        .any(|d| matches!(d.outcome, Outcome::Rejected(Reject::NotExpired { .. }))));
    assert!(network.governance.lot(&exchange, fee_key()).is_some());
    assert_eq!(network.exchange.fee(fee_key()), Some((1000, 1000)));
}

#[test]
fn deadline_finalize_with_half_support_moves_the_fee() {
    let config = config();
    let mut network = Network::build(&config).unwrap();
    let exchange = config.addresses.exchange;
    // 3/10 = 30%: short of instant approval, above the 25% half threshold
    run(
        &mut network,
        vec![vote(&config, 3, exchange, fee_key(), VoteDirection::Decrease, 1_000)],
    );
    assert_eq!(network.exchange.fee(fee_key()), Some((1000, 1000)));

    let keeper = Address::new([77u8; 32]);
    let trigger = Envelope::new(
        keeper,
        config.addresses.governance,
        1_000 + 432_000,
        Payload::FinalizeLot { target: exchange, key: fee_key() },
    );
    run(&mut network, vec![trigger]);

    // the deferred handshake completed against the live exchange
    assert_eq!(network.exchange.fee(fee_key()), Some((800, 1000)));
    assert!(network.governance.lot(&exchange, fee_key()).is_none());
    assert_eq!(network.gov_ledger.balance_of(&voter()), 1);
}

#[test]
fn deadline_finalize_without_support_expires_quietly() {
    let config = config();
    let mut network = Network::build(&config).unwrap();
    let exchange = config.addresses.exchange;
    run(
        &mut network,
        vec![vote(&config, 1, exchange, fee_key(), VoteDirection::Increase, 1_000)],
    );

    let keeper = Address::new([77u8; 32]);
    let trigger = Envelope::new(
        keeper,
        config.addresses.governance,
        1_000 + 432_000,
        Payload::FinalizeLot { target: exchange, key: fee_key() },
    );
    run(&mut network, vec![trigger]);

    assert!(network.governance.lot(&exchange, fee_key()).is_none());
    assert_eq!(network.exchange.fee(fee_key()), Some((1000, 1000)));
    assert_eq!(network.gov_ledger.balance_of(&voter()), 0);
}

#[test]
fn vote_on_unknown_exchange_setting_is_abandoned_on_bounce() {
    let config = config();
    let mut network = Network::build(&config).unwrap();
    let exchange = config.addresses.exchange;
    let bad_key = SettingKey::from_name("bad_setting");

    let log = run(
        &mut network,
        vec![vote(&config, 5, exchange, bad_key, VoteDirection::Increase, 1_000)],
    );

    // the exchange refused the probe; the bounce told governance the key
    // can never apply, so the lot is gone and nothing changed anywhere
    assert!(log.iter().any(|d| {
        matches!(*d.envelope.payload(), Payload::CheckSettingsFormat { .. })
            && matches!(d.outcome, Outcome::Rejected(Reject::MalformedSettings(_)))
    }));
    assert!(network.governance.lot(&exchange, bad_key).is_none());
    assert_eq!(network.gov_ledger.balance_of(&voter()), 0);
    assert_eq!(network.exchange.fee(fee_key()), Some((1000, 1000)));
}
