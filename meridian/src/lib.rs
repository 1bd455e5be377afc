//! Meridian Assembly
//!
//! Wires the five actors of the token economy (reserve relay, exchange,
//! two token ledgers, governance) from a genesis configuration, ready to
//! drive through the in-memory router. Deployment and CLI tooling live
//! elsewhere; this crate only assembles and exercises the economy.

pub mod config;
pub mod network;

pub use config::{AddressBook, GenesisConfig};
pub use network::Network;
