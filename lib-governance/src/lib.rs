//! Meridian Governance
//!
//! Lets governance-token holders move numeric parameters on the exchange
//! (or on this actor itself) through weighted voting. Consensus is weighted
//! by a cached total of outstanding governance tokens; finalization is
//! either instant (the leading bucket reaches the `instant_approve`
//! percentage) or deadline-bounded (half the percentage suffices once
//! `half_approve_wait` has elapsed since the last vote).
//!
//! # The Settings Handshake
//!
//! A change to a peer's setting is a fixed three-message exchange:
//!
//! ```text
//! Governance ── CheckSettingsFormat ──▶ target
//! Governance ◀──────── Confirm ──────── target
//! Governance ── ChangeSettings ───────▶ target
//! ```
//!
//! Each in-flight proposal is an explicit state object (a [`Lot`]), not a
//! callback chain. When the target is governance itself the handshake
//! settles within a single processing step; the three messages are still
//! emitted, self-addressed, so the trace matches the external flow.

pub mod governance;
pub mod lot;
pub mod settings;

pub use governance::{Governance, GovernanceConfig, GovernancePeers};
pub use lot::{Lot, LotId, LotPhase, LotTable};
pub use settings::{
    SettingsError, SettingsTable, HALF_APPROVE_WAIT, HALF_APPROVE_WAIT_STEP, INSTANT_APPROVE,
    INSTANT_APPROVE_STEP,
};
