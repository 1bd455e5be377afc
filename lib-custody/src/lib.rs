//! Meridian Custody Actors
//!
//! The exchange's external collaborators: the reserve relay that custodies
//! the base asset, and the two token ledgers that own the minted supplies.
//! Their behavior is mechanical next to the core actors, with one required
//! exception: value must never strand. A deposit whose forward bounces is
//! refunded by the relay; a burn whose notice bounces is re-credited by the
//! ledger. Compensation is the sender's job; the core never retries.

pub mod ledger;
pub mod relay;

pub use ledger::{LedgerKind, TokenLedger};
pub use relay::ReserveRelay;
