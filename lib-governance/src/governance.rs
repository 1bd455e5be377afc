//! The Governance Actor
//!
//! Voting state machine and the three-message settings handshake. See the
//! crate docs for the protocol shape; see `lot.rs` for the per-proposal
//! state object.

use serde::{Deserialize, Serialize};

use lib_actor::{Actor, Envelope, HandleResult, Reject};
use lib_types::{Address, Amount, SettingDef, SettingKey, Timestamp};
use lib_wire::{Payload, SettingTarget, VoteDirection};

use crate::lot::{Lot, LotPhase, LotTable};
use crate::settings::{SettingsError, SettingsTable, HALF_APPROVE_WAIT, INSTANT_APPROVE};

/// Peer addresses, fixed at actor creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernancePeers {
    /// The exchange: settings target and authorized supply source
    pub exchange: Address,
    /// Sole authorized source of Voting messages
    pub vote_wallet: Address,
    /// Governance-token ledger; receives reward mint instructions
    pub gov_ledger: Address,
}

/// Tunables that are not themselves vote-governed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// Governance tokens minted to the most recent voter on finalization
    pub vote_reward: Amount,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self { vote_reward: 1 }
    }
}

/// Pre-derived keys of the settings the state machine itself consults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct ConsensusKeys {
    instant_approve: SettingKey,
    half_approve_wait: SettingKey,
}

/// The governance actor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Governance {
    address: Address,
    peers: GovernancePeers,
    settings: SettingsTable,
    lots: LotTable,
    gov_weight_total: Amount,
    config: GovernanceConfig,
    keys: ConsensusKeys,
}

impl Governance {
    /// Create a governance actor over an explicit settings table.
    ///
    /// The table must carry the two settings the state machine consults
    /// (`instant_approve`, `half_approve_wait`).
    pub fn new(
        address: Address,
        peers: GovernancePeers,
        settings: SettingsTable,
        gov_weight_total: Amount,
        config: GovernanceConfig,
    ) -> Result<Self, SettingsError> {
        let keys = ConsensusKeys {
            instant_approve: SettingKey::from_name(INSTANT_APPROVE),
            half_approve_wait: SettingKey::from_name(HALF_APPROVE_WAIT),
        };
        if !settings.contains(keys.instant_approve) {
            return Err(SettingsError::MissingRequired(INSTANT_APPROVE));
        }
        if !settings.contains(keys.half_approve_wait) {
            return Err(SettingsError::MissingRequired(HALF_APPROVE_WAIT));
        }
        Ok(Self {
            address,
            peers,
            settings,
            lots: LotTable::new(),
            gov_weight_total,
            config,
            keys,
        })
    }

    /// Create a governance actor with genesis settings
    pub fn genesis(address: Address, peers: GovernancePeers, gov_weight_total: Amount) -> Self {
        Self::new(
            address,
            peers,
            SettingsTable::genesis(),
            gov_weight_total,
            GovernanceConfig::default(),
        )
        .unwrap_or_else(|error| unreachable!("genesis settings incomplete: {error}"))
    }

    // ========================================================================
    // READ ACCESSORS (no side effects)
    // ========================================================================

    /// Lot lookup by pair; `None` when absent or already finalized
    pub fn lot(&self, target: &Address, key: SettingKey) -> Option<&Lot> {
        self.lots.get(target, key)
    }

    /// The cached consensus denominator
    pub fn gov_weight_total(&self) -> Amount {
        self.gov_weight_total
    }

    /// Setting lookup
    pub fn setting(&self, key: SettingKey) -> Option<&SettingDef> {
        self.settings.get(key)
    }

    /// The full settings table
    pub fn settings(&self) -> impl Iterator<Item = &SettingDef> {
        self.settings.iter()
    }

    /// Peer registry
    pub fn peers(&self) -> &GovernancePeers {
        &self.peers
    }

    // ========================================================================
    // VOTING
    // ========================================================================

    #[allow(clippy::too_many_arguments)]
    fn on_voting(
        &mut self,
        envelope: &Envelope,
        query: Address,
        weight: Amount,
        target: Address,
        key: SettingKey,
        new_vote: bool,
        direction: VoteDirection,
    ) -> HandleResult {
        self.authorize(envelope.from, self.peers.vote_wallet, "voting")?;
        if weight == 0 {
            return Err(Reject::InsufficientInput("zero-weight vote".to_string()));
        }

        let exists = self.lots.get(&target, key).is_some();
        if exists && new_vote {
            return Err(Reject::DuplicateVote);
        }
        if !exists && !new_vote {
            return Err(Reject::MalformedSettings(format!("no open lot for key {key}")));
        }
        // a self-targeted proposal must name a known local setting up front;
        // an external key can only be probed
        if !exists && target == self.address && !self.settings.contains(key) {
            return Err(Reject::MalformedSettings(format!(
                "no governance setting under key {key}"
            )));
        }

        let now = envelope.timestamp();
        let wait = self.half_wait();
        let created = !exists;
        if created {
            self.lots.insert(Lot::open(target, key, query, now, wait));
        }
        let (lead_dir, lead_weight, phase) = {
            let lot = self
                .lots
                .get_mut(&target, key)
                .unwrap_or_else(|| unreachable!("lot inserted or verified above"));
            lot.bank(direction, weight, query, now, wait);
            let (d, w) = lot.leading();
            (d, w, lot.phase)
        };
        tracing::info!(
            %target,
            %key,
            weight,
            ?direction,
            lead_weight,
            total = self.gov_weight_total,
            "vote banked"
        );

        if phase == LotPhase::Open && self.threshold_met(lead_weight) {
            if target == self.address {
                let lot = self
                    .lots
                    .remove(&target, key)
                    .unwrap_or_else(|| unreachable!("lot present"));
                return Ok(self.finalize_own(now, lot));
            }
            let lot = self
                .lots
                .get_mut(&target, key)
                .unwrap_or_else(|| unreachable!("lot present"));
            lot.phase = LotPhase::PendingConfirmation;
            return Ok(vec![self.check_format(target, now, key, lead_weight, lead_dir)]);
        }

        // the opening vote on an external target probes the key; a bad key
        // is never confirmed and the lot dies at its deadline
        if created && target != self.address {
            return Ok(vec![self.check_format(target, now, key, weight, direction)]);
        }
        Ok(Vec::new())
    }

    fn on_confirm(
        &mut self,
        envelope: &Envelope,
        key: SettingKey,
        echo_weight: Amount,
        echo_direction: VoteDirection,
    ) -> HandleResult {
        let target = envelope.from;
        match self.lots.get(&target, key) {
            Some(lot) if lot.phase == LotPhase::PendingConfirmation => {}
            _ => {
                return Err(Reject::AccessDenied(format!(
                    "confirm from {target} without a matching pending lot"
                )))
            }
        }
        let lot = self
            .lots
            .remove(&target, key)
            .unwrap_or_else(|| unreachable!("lot presence verified above"));

        // the lot's buckets are authoritative; the echo is only advisory
        let (direction, weight) = lot.leading();
        tracing::debug!(echo_weight, ?echo_direction, weight, ?direction, "confirm echo received");

        let now = envelope.timestamp();
        let mut out = Vec::new();
        if let Some(step_direction) = direction.step_direction() {
            out.push(Envelope::new(
                self.address,
                target,
                now,
                Payload::ChangeSettings { key, target: SettingTarget::Value, direction: step_direction },
            ));
        }
        out.push(self.reward(lot.last_voter, now));
        tracing::info!(%target, %key, weight, ?direction, "lot finalized via target confirm");
        Ok(out)
    }

    fn on_update_gov_weight(&mut self, envelope: &Envelope, total: Amount) -> HandleResult {
        self.authorize(envelope.from, self.peers.exchange, "gov weight update")?;
        tracing::debug!(old = self.gov_weight_total, new = total, "consensus denominator updated");
        self.gov_weight_total = total;
        Ok(Vec::new())
    }

    fn on_finalize_lot(
        &mut self,
        envelope: &Envelope,
        target: Address,
        key: SettingKey,
    ) -> HandleResult {
        let Some(lot) = self.lots.get(&target, key) else {
            return Err(Reject::MalformedSettings(format!("no lot for key {key}")));
        };
        let now = envelope.timestamp();
        if now < lot.finalize_deadline {
            return Err(Reject::NotExpired { now, deadline: lot.finalize_deadline });
        }

        let (lead_dir, lead_weight) = lot.leading();
        if !self.half_threshold_met(lead_weight) {
            self.lots.remove(&target, key);
            tracing::info!(%target, %key, lead_weight, "lot expired without support");
            return Ok(Vec::new());
        }

        if target == self.address {
            let lot = self
                .lots
                .remove(&target, key)
                .unwrap_or_else(|| unreachable!("lot present"));
            return Ok(self.finalize_own(now, lot));
        }
        let lot = self
            .lots
            .get_mut(&target, key)
            .unwrap_or_else(|| unreachable!("lot present"));
        lot.phase = LotPhase::PendingConfirmation;
        Ok(vec![self.check_format(target, now, key, lead_weight, lead_dir)])
    }

    // ========================================================================
    // FINALIZATION
    // ========================================================================

    /// Finalize a self-targeted lot within the current processing step.
    ///
    /// The handshake trio is emitted self-addressed as a trace of the same
    /// protocol an external target would see; the transport settles
    /// self-addressed envelopes without re-delivery.
    fn finalize_own(&mut self, now: Timestamp, lot: Lot) -> Vec<Envelope> {
        let (direction, weight) = lot.leading();
        let key = lot.key;

        let mut out = vec![
            Envelope::new(
                self.address,
                self.address,
                now,
                Payload::CheckSettingsFormat { key, weight, direction },
            ),
            Envelope::new(
                self.address,
                self.address,
                now,
                Payload::Confirm { key, weight, direction },
            ),
        ];
        if let Some(step_direction) = direction.step_direction() {
            if let Some(after) = self.settings.apply_move(key, step_direction) {
                tracing::info!(%key, value = after.value, ?direction, "own setting moved");
            }
            out.push(Envelope::new(
                self.address,
                self.address,
                now,
                Payload::ChangeSettings { key, target: SettingTarget::Value, direction: step_direction },
            ));
        }
        out.push(self.reward(lot.last_voter, now));
        tracing::info!(%key, weight, "self-targeted lot finalized in place");
        out
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

    fn check_format(
        &self,
        target: Address,
        now: Timestamp,
        key: SettingKey,
        weight: Amount,
        direction: VoteDirection,
    ) -> Envelope {
        Envelope::new(
            self.address,
            target,
            now,
            Payload::CheckSettingsFormat { key, weight, direction },
        )
    }

    fn reward(&self, voter: Address, now: Timestamp) -> Envelope {
        Envelope::new(
            self.address,
            self.peers.gov_ledger,
            now,
            Payload::Mint { recipient: voter, amount: self.config.vote_reward },
        )
    }

    fn half_wait(&self) -> u64 {
        self.settings
            .value(self.keys.half_approve_wait)
            .unwrap_or_else(|| unreachable!("required setting verified at construction"))
    }

    fn approve_percent(&self) -> u64 {
        self.settings
            .value(self.keys.instant_approve)
            .unwrap_or_else(|| unreachable!("required setting verified at construction"))
    }

    /// `leading / total >= instant_approve%`, in exact integers. A zero
    /// denominator never approves: with no outstanding tokens there is no
    /// consensus to measure.
    fn threshold_met(&self, leading: Amount) -> bool {
        self.gov_weight_total > 0
            && leading.saturating_mul(100)
                >= (self.approve_percent() as Amount).saturating_mul(self.gov_weight_total)
    }

    /// Half the instant-approve percentage, for post-deadline finalization
    fn half_threshold_met(&self, leading: Amount) -> bool {
        self.gov_weight_total > 0
            && leading.saturating_mul(200)
                >= (self.approve_percent() as Amount).saturating_mul(self.gov_weight_total)
    }
}

impl Actor for Governance {
    fn address(&self) -> Address {
        self.address
    }

    fn handle(&mut self, envelope: &Envelope) -> HandleResult {
        match *envelope.payload() {
            Payload::Voting { query, weight, target, key, new_vote, direction } => {
                self.on_voting(envelope, query, weight, target, key, new_vote, direction)
            }
            Payload::Confirm { key, weight, direction } => {
                self.on_confirm(envelope, key, weight, direction)
            }
            Payload::UpdateGovWeight { total } => self.on_update_gov_weight(envelope, total),
            Payload::FinalizeLot { target, key } => self.on_finalize_lot(envelope, target, key),
            ref other => Err(Reject::Unsupported(other.tag())),
        }
    }

    fn on_bounce(&mut self, envelope: &Envelope) -> Vec<Envelope> {
        // a bounced format check means the target refused the key; the
        // proposal can never apply, so the lot is abandoned
        if let Payload::CheckSettingsFormat { key, .. } = *envelope.payload() {
            let target = envelope.from;
            if self.lots.remove(&target, key).is_some() {
                tracing::warn!(%target, %key, "format check bounced; lot abandoned");
            }
        }
        Vec::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
