//! Meridian Exchange
//!
//! The pricing core of the economy: converts inbound reserve deposits and
//! token-burn notifications into outbound mints and withdrawals of the
//! counter asset, applying the currently configured fee rate. The fee table
//! itself is mutable only through the authenticated settings protocol
//! driven by the governance actor.
//!
//! # Trust Model
//!
//! Authorization is per operation and asymmetric: deposits are believed
//! only from the reserve relay, burn notifications only from the ledger
//! that owns the burned supply, settings traffic only from governance.
//! Everything else is rejected before any state is read or written.
//!
//! # Conservation
//!
//! Every ledger mutation is paired, within the same processing step, with
//! exactly one outbound mint/withdraw instruction. All candidate counter
//! values are computed with checked arithmetic before anything is
//! committed, so a rejection can never leave a partial update behind.

pub mod exchange;
pub mod fees;
pub mod ledger;

pub use exchange::{Exchange, ExchangePeers, PairScales};
pub use fees::{FeeTable, GOV_BUY_FEE, GOV_SELL_FEE, TRADE_BUY_FEE, TRADE_SELL_FEE};
pub use ledger::ReserveLedger;
