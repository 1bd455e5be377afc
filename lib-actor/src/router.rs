//! In-Memory Transport
//!
//! FIFO envelope router used by tests and local assembly. Delivery order is
//! deterministic: each processing step's outbound envelopes are appended to
//! the queue in emission order. Latency between unrelated messages is not
//! modeled; causal order within a chain is preserved, which is all the
//! actors may assume.
//!
//! Rejections become bounces: the envelope returns to its sender flagged
//! `bounced`, and a registered sender gets its `on_bounce` hook. Envelopes
//! addressed to unregistered addresses (user wallets, for instance) are
//! parked in the log as `NoRoute`; tests assert payouts there.

use std::collections::VecDeque;

use lib_types::Address;

use crate::{Actor, Envelope, Reject};

/// Hard cap on processing steps per `run`; a cycle in actor wiring is a
/// configuration bug, not a runtime condition to tolerate.
const MAX_STEPS: usize = 10_000;

/// What the router did with one envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Handed to the destination actor, which accepted it
    Delivered,
    /// Self-addressed: settled in the emitting step, not re-delivered
    SelfSettled,
    /// No registered actor at the destination address
    NoRoute,
    /// Destination actor refused it; a bounce was produced
    Rejected(Reject),
}

/// One router decision, in processing order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub envelope: Envelope,
    pub outcome: Outcome,
}

/// FIFO router over a set of borrowed actors
pub struct Router<'a> {
    actors: Vec<&'a mut dyn Actor>,
    log: Vec<Delivery>,
}

impl<'a> Router<'a> {
    /// Build a router over the given actors
    pub fn new(actors: Vec<&'a mut dyn Actor>) -> Self {
        Self { actors, log: Vec::new() }
    }

    /// Inject seed envelopes and drain the network to quiescence
    pub fn run(&mut self, seed: Vec<Envelope>) {
        let mut queue: VecDeque<Envelope> = seed.into();
        let mut steps = 0usize;

        while let Some(envelope) = queue.pop_front() {
            steps += 1;
            if steps > MAX_STEPS {
                tracing::error!(steps, "router exceeded step cap; dropping remaining traffic");
                return;
            }

            // Self-addressed traffic was already settled by its emitter.
            if envelope.to == envelope.from {
                self.log.push(Delivery { envelope, outcome: Outcome::SelfSettled });
                continue;
            }

            if envelope.bounced {
                self.deliver_bounce(envelope, &mut queue);
                continue;
            }

            let outcome = match self.actor_at(envelope.to) {
                None => Outcome::NoRoute,
                Some(actor) => match actor.handle(&envelope) {
                    Ok(outbound) => {
                        queue.extend(outbound);
                        Outcome::Delivered
                    }
                    Err(reject) => {
                        tracing::warn!(
                            from = %envelope.from,
                            to = %envelope.to,
                            %reject,
                            "envelope rejected; bouncing to sender"
                        );
                        queue.push_back(envelope.bounce());
                        Outcome::Rejected(reject)
                    }
                },
            };
            self.log.push(Delivery { envelope, outcome });
        }
    }

    fn deliver_bounce(&mut self, envelope: Envelope, queue: &mut VecDeque<Envelope>) {
        let outcome = match self.actor_at(envelope.to) {
            None => Outcome::NoRoute,
            Some(actor) => {
                queue.extend(actor.on_bounce(&envelope));
                Outcome::Delivered
            }
        };
        self.log.push(Delivery { envelope, outcome });
    }

    fn actor_at(&mut self, address: Address) -> Option<&mut &'a mut dyn Actor> {
        self.actors.iter_mut().find(|a| a.address() == address)
    }

    /// Full processing log, in order
    pub fn log(&self) -> &[Delivery] {
        &self.log
    }

    /// Envelopes that were sent to `to`, whatever became of them
    pub fn sent_to(&self, to: Address) -> impl Iterator<Item = &Envelope> {
        self.log.iter().map(|d| &d.envelope).filter(move |e| e.to == to)
    }

    /// Deliveries the destination refused
    pub fn rejections(&self) -> impl Iterator<Item = &Delivery> {
        self.log.iter().filter(|d| matches!(d.outcome, Outcome::Rejected(_)))
    }
}

// ============================================================================
// TESTS
// ============================================================================
