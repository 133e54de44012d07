//! # Whitelist store
//!
//! Per-agreement access list consulted by `purchase` when the agreement has
//! `whitelist_enabled`. Every mutation is scoped to the agreement's seller,
//! except replication, which applies messages already authenticated by the
//! sync gateway.
//!
//! Batch operations skip duplicates (add) and absentees (remove) instead of
//! failing, so a large batch is never lost to a single repeated entry.

use soroban_sdk::{Address, Env, Vec};

use crate::events;
use crate::storage;
use crate::types::{WhitelistOp, WhitelistStats};
use crate::Error;

/// Upper bound on principals per batch call or replication message.
pub const MAX_BATCH: u32 = 50;

/// The contract's own address stands in for the null principal.
fn validate_principal(env: &Env, principal: &Address) -> Result<(), Error> {
    if *principal == env.current_contract_address() {
        return Err(Error::InvalidPrincipal);
    }
    Ok(())
}

fn validate_batch(env: &Env, principals: &Vec<Address>) -> Result<(), Error> {
    if principals.len() > MAX_BATCH {
        return Err(Error::BatchTooLarge);
    }
    for principal in principals.iter() {
        validate_principal(env, &principal)?;
    }
    Ok(())
}

/// Fail with `NotAuthorized` unless `caller` sold agreement `id`.
pub fn require_seller(env: &Env, id: u64, caller: &Address) -> Result<(), Error> {
    let terms = storage::load_agreement_terms(env, id)?;
    if terms.seller != *caller {
        return Err(Error::NotAuthorized);
    }
    Ok(())
}

fn insert(env: &Env, id: u64, principal: &Address) -> bool {
    if storage::is_listed(env, id, principal) {
        return false;
    }
    storage::set_listed(env, id, principal);
    storage::set_listed_count(env, id, storage::listed_count(env, id) + 1);
    events::emit_whitelist_added(env, id, principal.clone());
    true
}

fn delete(env: &Env, id: u64, principal: &Address) -> bool {
    if !storage::is_listed(env, id, principal) {
        return false;
    }
    storage::clear_listed(env, id, principal);
    storage::set_listed_count(env, id, storage::listed_count(env, id).saturating_sub(1));
    events::emit_whitelist_removed(env, id, principal.clone());
    true
}

pub fn add(env: &Env, seller: &Address, id: u64, principal: &Address) -> Result<(), Error> {
    require_seller(env, id, seller)?;
    validate_principal(env, principal)?;
    if !insert(env, id, principal) {
        return Err(Error::AlreadyWhitelisted);
    }
    Ok(())
}

/// Removing a principal that is not listed is a no-op.
pub fn remove(env: &Env, seller: &Address, id: u64, principal: &Address) -> Result<(), Error> {
    require_seller(env, id, seller)?;
    validate_principal(env, principal)?;
    delete(env, id, principal);
    Ok(())
}

/// Returns how many principals were newly listed.
pub fn batch_add(
    env: &Env,
    seller: &Address,
    id: u64,
    principals: &Vec<Address>,
) -> Result<u32, Error> {
    require_seller(env, id, seller)?;
    apply(env, id, WhitelistOp::Add, principals)
}

/// Returns how many principals were actually removed.
pub fn batch_remove(
    env: &Env,
    seller: &Address,
    id: u64,
    principals: &Vec<Address>,
) -> Result<u32, Error> {
    require_seller(env, id, seller)?;
    apply(env, id, WhitelistOp::Remove, principals)
}

/// Apply `op` to every principal with skip-on-duplicate semantics.
///
/// No seller check: callers must have authorized the mutation already.
/// Applying the same batch twice leaves the store unchanged the second time.
pub fn apply(
    env: &Env,
    id: u64,
    op: WhitelistOp,
    principals: &Vec<Address>,
) -> Result<u32, Error> {
    validate_batch(env, principals)?;
    let mut applied = 0u32;
    for principal in principals.iter() {
        let changed = match op {
            WhitelistOp::Add => insert(env, id, &principal),
            WhitelistOp::Remove => delete(env, id, &principal),
        };
        if changed {
            applied += 1;
        }
    }
    Ok(applied)
}

pub fn is_whitelisted(env: &Env, id: u64, principal: &Address) -> bool {
    storage::is_listed(env, id, principal)
}

pub fn stats(env: &Env, id: u64) -> Result<WhitelistStats, Error> {
    let terms = storage::load_agreement_terms(env, id)?;
    Ok(WhitelistStats {
        agreement_id: id,
        count: storage::listed_count(env, id),
        enabled: terms.whitelist_enabled,
    })
}
