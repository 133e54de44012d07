//! # Cross-domain sync gateway
//!
//! Replicates whitelist mutations between independent deployments of the
//! market ("domains").
//!
//! ## Outbound
//!
//! The local mutation is applied first and is never undone by replication.
//! The change is then encoded as an XDR [`SyncMessage`] and handed to the
//! transport contract once per supported domain. A failed hand-off (no
//! receiver, no transport, transport error such as an unfunded fee) parks the
//! message in a FIFO retry queue.
//!
//! ## Retry policy
//!
//! `retry_pending` resends queued messages oldest first. Every failed attempt
//! is counted; after [`MAX_SYNC_ATTEMPTS`] the message is dropped and a
//! `sync_drop` event is published for manual reconciliation.
//!
//! ## Inbound
//!
//! Only the configured transport may deliver. The source domain and the
//! remote sender must both be allow-listed. Application reuses the whitelist
//! store's skip-on-duplicate batch semantics, so a replayed message changes
//! nothing.

use soroban_sdk::{
    contractclient,
    xdr::{FromXdr, ToXdr},
    Address, Bytes, Env, Vec,
};

use crate::events::{self, SyncApplied, SyncDispatched};
use crate::storage;
use crate::types::{PendingSync, SyncMessage, SyncStats, WhitelistOp};
use crate::whitelist;
use crate::Error;

/// Attempts (including the first) before a queued message is dropped.
pub const MAX_SYNC_ATTEMPTS: u32 = 5;

/// Interface expected from the cross-domain transport contract.
#[allow(dead_code)]
#[contractclient(name = "TransportClient")]
pub trait Transport {
    /// Returns the transport's message id. Fails if the call is underfunded.
    fn send(env: Env, domain: u32, receiver: Address, payload: Bytes) -> u64;
}

// ─────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────

pub fn set_transport(env: &Env, transport: &Address) {
    storage::set_transport(env, transport);
}

pub fn set_receiver(env: &Env, domain: u32, receiver: &Address) {
    storage::set_receiver(env, domain, receiver);
}

pub fn add_domain(env: &Env, domain: u32) {
    let mut domains = storage::get_domains(env);
    if !domains.contains(domain) {
        domains.push_back(domain);
        storage::set_domains(env, &domains);
    }
}

pub fn remove_domain(env: &Env, domain: u32) {
    let mut domains = storage::get_domains(env);
    if let Some(pos) = domains.first_index_of(domain) {
        domains.remove(pos);
        storage::set_domains(env, &domains);
    }
}

pub fn set_source_allowed(env: &Env, domain: u32, allowed: bool) {
    storage::set_source_allowed(env, domain, allowed);
}

pub fn set_sender_allowed(env: &Env, sender: &Address, allowed: bool) {
    storage::set_sender_allowed(env, sender, allowed);
}

// ─────────────────────────────────────────────────────────
// Outbound
// ─────────────────────────────────────────────────────────

/// Hand `payload` to the transport for `domain`. Never traps.
fn send(env: &Env, domain: u32, payload: &Bytes) -> Result<u64, Error> {
    let receiver = storage::get_receiver(env, domain).ok_or(Error::UnknownDomain)?;
    let transport = storage::get_transport(env).ok_or(Error::DispatchFailed)?;
    match TransportClient::new(env, &transport).try_send(&domain, &receiver, payload) {
        Ok(Ok(message_id)) => Ok(message_id),
        _ => Err(Error::DispatchFailed),
    }
}

fn enqueue(env: &Env, domain: u32, message: &SyncMessage, payload: Bytes) {
    let pending = PendingSync {
        seq: storage::next_pending_seq(env),
        domain,
        agreement_id: message.agreement_id,
        op: message.op,
        payload,
        attempts: 1,
    };
    storage::set_pending(env, &pending);
    let mut queue = storage::get_pending_queue(env);
    queue.push_back(pending.seq);
    storage::set_pending_queue(env, &queue);
    events::emit_sync_queued(env, domain, pending.seq, pending.attempts);
}

/// Replicate a local whitelist change to every supported domain.
///
/// Returns how many domains accepted the message right away.
pub fn dispatch(env: &Env, agreement_id: u64, op: WhitelistOp, principals: Vec<Address>) -> u32 {
    let message = SyncMessage {
        agreement_id,
        op,
        principals,
    };
    let payload = message.clone().to_xdr(env);
    let mut stats = storage::get_sync_stats(env);
    let mut delivered = 0u32;

    for domain in storage::get_domains(env).iter() {
        match send(env, domain, &payload) {
            Ok(message_id) => {
                delivered += 1;
                stats.messages_sent += 1;
                events::emit_sync_dispatched(
                    env,
                    SyncDispatched {
                        domain,
                        message_id,
                        agreement_id,
                        op,
                    },
                );
            }
            Err(_) => {
                stats.messages_failed += 1;
                enqueue(env, domain, &message, payload.clone());
            }
        }
    }

    storage::set_sync_stats(env, &stats);
    delivered
}

/// Resend up to `max` queued messages, oldest first. Returns how many went out.
pub fn retry_pending(env: &Env, max: u32) -> u32 {
    let queue = storage::get_pending_queue(env);
    let mut remaining = Vec::new(env);
    let mut stats = storage::get_sync_stats(env);
    let mut processed = 0u32;
    let mut delivered = 0u32;

    for seq in queue.iter() {
        if processed >= max {
            remaining.push_back(seq);
            continue;
        }
        let Some(mut pending) = storage::get_pending(env, seq) else {
            continue;
        };
        processed += 1;

        match send(env, pending.domain, &pending.payload) {
            Ok(message_id) => {
                delivered += 1;
                stats.messages_sent += 1;
                storage::remove_pending(env, seq);
                events::emit_sync_dispatched(
                    env,
                    SyncDispatched {
                        domain: pending.domain,
                        message_id,
                        agreement_id: pending.agreement_id,
                        op: pending.op,
                    },
                );
            }
            Err(_) => {
                stats.messages_failed += 1;
                pending.attempts += 1;
                if pending.attempts >= MAX_SYNC_ATTEMPTS {
                    stats.messages_dropped += 1;
                    storage::remove_pending(env, seq);
                    events::emit_sync_dropped(env, pending.domain, seq, pending.attempts);
                } else {
                    storage::set_pending(env, &pending);
                    remaining.push_back(seq);
                    events::emit_sync_queued(env, pending.domain, seq, pending.attempts);
                }
            }
        }
    }

    storage::set_pending_queue(env, &remaining);
    storage::set_sync_stats(env, &stats);
    delivered
}

pub fn pending(env: &Env) -> Vec<PendingSync> {
    let mut out = Vec::new(env);
    for seq in storage::get_pending_queue(env).iter() {
        if let Some(pending) = storage::get_pending(env, seq) {
            out.push_back(pending);
        }
    }
    out
}

pub fn pending_count(env: &Env) -> u32 {
    storage::get_pending_queue(env).len()
}

// ─────────────────────────────────────────────────────────
// Inbound
// ─────────────────────────────────────────────────────────

/// Apply a message delivered by the transport. Returns how many entries changed.
pub fn receive(env: &Env, source_domain: u32, sender: &Address, payload: &Bytes) -> Result<u32, Error> {
    let transport = storage::get_transport(env).ok_or(Error::NotAuthorized)?;
    transport.require_auth();

    if !storage::is_source_allowed(env, source_domain) {
        return Err(Error::UnauthorizedSource);
    }
    if !storage::is_sender_allowed(env, sender) {
        return Err(Error::UnauthorizedSender);
    }

    let message = SyncMessage::from_xdr(env, payload).map_err(|_| Error::InvalidPayload)?;
    let applied = whitelist::apply(env, message.agreement_id, message.op, &message.principals)?;

    let mut stats = storage::get_sync_stats(env);
    stats.messages_received += 1;
    storage::set_sync_stats(env, &stats);

    events::emit_sync_applied(
        env,
        SyncApplied {
            source_domain,
            sender: sender.clone(),
            agreement_id: message.agreement_id,
            op: message.op,
            applied,
        },
    );
    Ok(applied)
}

pub fn stats(env: &Env) -> SyncStats {
    storage::get_sync_stats(env)
}

pub fn domains(env: &Env) -> Vec<u32> {
    storage::get_domains(env)
}
