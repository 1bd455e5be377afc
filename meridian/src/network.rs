//! Network Assembly
//!
//! Builds the five actors from a genesis configuration and hands them to
//! the router. Each actor gets exactly the peer addresses it is allowed to
//! believe; nothing here can be re-wired after construction.

use lib_actor::Actor;
use lib_custody::{LedgerKind, ReserveRelay, TokenLedger};
use lib_exchange::{Exchange, ExchangePeers};
use lib_governance::{Governance, GovernanceConfig, GovernancePeers, SettingsTable};

use crate::config::GenesisConfig;

/// The assembled economy
pub struct Network {
    pub relay: ReserveRelay,
    pub exchange: Exchange,
    pub trade_ledger: TokenLedger,
    pub gov_ledger: TokenLedger,
    pub governance: Governance,
}

impl Network {
    /// Build all actors from genesis
    pub fn build(config: &GenesisConfig) -> anyhow::Result<Self> {
        let book = &config.addresses;

        let relay =
            ReserveRelay::new(book.relay, book.operator, book.exchange, config.min_deposit);

        let exchange = Exchange::genesis(
            book.exchange,
            ExchangePeers {
                reserve_relay: book.relay,
                trade_ledger: book.trade_ledger,
                gov_ledger: book.gov_ledger,
                governance: book.governance,
            },
        );

        let trade_ledger = TokenLedger::new(
            book.trade_ledger,
            book.operator,
            book.exchange,
            LedgerKind::Trade,
            [book.exchange].into(),
        );

        // governance mints voter rewards, so it is a second authority here
        let gov_ledger = TokenLedger::new(
            book.gov_ledger,
            book.operator,
            book.exchange,
            LedgerKind::Gov,
            [book.exchange, book.governance].into(),
        );

        let governance = Governance::new(
            book.governance,
            GovernancePeers {
                exchange: book.exchange,
                vote_wallet: book.vote_wallet,
                gov_ledger: book.gov_ledger,
            },
            SettingsTable::genesis(),
            config.gov_weight_total,
            GovernanceConfig { vote_reward: config.vote_reward },
        )?;

        Ok(Self { relay, exchange, trade_ledger, gov_ledger, governance })
    }

    /// All actors as router participants
    pub fn actors(&mut self) -> Vec<&mut dyn Actor> {
        vec![
            &mut self.relay,
            &mut self.exchange,
            &mut self.trade_ledger,
            &mut self.gov_ledger,
            &mut self.governance,
        ]
    }
}
