//! Meridian Actor Model
//!
//! Every logical unit in the economy is an independently addressed actor
//! holding persistent state, reachable only through asynchronous one-way
//! messages. An actor processes one inbound envelope to completion, with
//! no internal parallelism or preemption, which gives per-actor
//! serializability; the system as a whole is only eventually consistent.
//!
//! # Rules
//!
//! 1. All mutation is local to the receiving actor; cross-actor effects
//!    exist only as emitted envelopes
//! 2. Time comes exclusively from message-embedded timestamps
//! 3. A rejection leaves the actor's persistent state untouched and emits
//!    nothing; the transport turns it into a bounce the sender may handle
//! 4. An envelope an actor addresses to itself is settled within the
//!    emitting processing step; the transport must never re-deliver it

pub mod router;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use lib_types::{Address, Amount, Timestamp};
use lib_wire::{Message, OpTag, Payload};

pub use router::{Delivery, Outcome, Router};

// ============================================================================
// ENVELOPE
// ============================================================================

/// A message in flight between two actors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Transport-authenticated sender
    pub from: Address,
    /// Destination actor
    pub to: Address,
    /// Set when this envelope is a transport-level rejection returning to
    /// its sender; the message is the original, unmodified
    pub bounced: bool,
    /// The message itself
    pub message: Message,
}

impl Envelope {
    /// Construct an ordinary (non-bounced) envelope
    pub fn new(from: Address, to: Address, timestamp: Timestamp, payload: Payload) -> Self {
        Self { from, to, bounced: false, message: Message::new(timestamp, payload) }
    }

    /// The bounce of this envelope: same message, reversed route
    pub fn bounce(&self) -> Self {
        Self {
            from: self.to,
            to: self.from,
            bounced: true,
            message: self.message.clone(),
        }
    }

    /// Message-embedded timestamp
    pub fn timestamp(&self) -> Timestamp {
        self.message.timestamp
    }

    /// Operation payload
    pub fn payload(&self) -> &Payload {
        &self.message.payload
    }
}

// ============================================================================
// REJECTION TAXONOMY
// ============================================================================

/// Reasons an actor refuses an inbound envelope.
///
/// Every variant is a local, synchronous rejection: persistent state is
/// untouched and no messages are emitted on that path. The transport alone
/// produces the bounce.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Reject {
    /// Sender is outside the authorized set for the operation
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// Unknown setting key, or a value/step outside configured bounds
    #[error("malformed settings reference: {0}")]
    MalformedSettings(String),

    /// Amount underflows the fee/scale arithmetic; rejected, never clamped
    #[error("insufficient input: {0}")]
    InsufficientInput(String),

    /// New-vote requested while a lot is already open for the pair
    #[error("a lot is already in flight for this pair")]
    DuplicateVote,

    /// Timeout finalization triggered before the lot's deadline
    #[error("finalize deadline not reached: now {now}, deadline {deadline}")]
    NotExpired { now: Timestamp, deadline: Timestamp },

    /// Counter arithmetic left the representable range
    #[error("amount arithmetic overflow near {0}")]
    Overflow(Amount),

    /// The receiving actor has no handler for this operation
    #[error("operation {0:?} not supported by this actor")]
    Unsupported(OpTag),
}

/// Result type for actor message handling
pub type HandleResult = Result<Vec<Envelope>, Reject>;

// ============================================================================
// ACTOR SEAM
// ============================================================================

/// One independently addressed unit of persistent state.
///
/// `handle` processes a single envelope to completion and returns every
/// outbound envelope produced by that processing step, in emission order.
/// `on_bounce` is invoked by the transport when an envelope this actor sent
/// comes back rejected; compensating messages (e.g. a deposit refund) are
/// returned the same way.
pub trait Actor {
    /// This actor's address
    fn address(&self) -> Address;

    /// Process one inbound envelope
    fn handle(&mut self, envelope: &Envelope) -> HandleResult;

    /// React to a bounce of an envelope this actor previously sent
    fn on_bounce(&mut self, _envelope: &Envelope) -> Vec<Envelope> {
        Vec::new()
    }
}
