//! # Contract registry
//!
//! Owns the append-only collection of agreements: sequential ids, the
//! per-principal index and the ordered active set the scheduler scans.
//! Agreements are never deleted.
//!
//! The active set is split into pages of `ACTIVE_PAGE_SIZE` consecutive ids,
//! so enrolling, retiring or scanning an agreement only reads the pages it
//! touches. A separate list records which pages are non-empty.

use soroban_sdk::{Address, Env, Vec};

use crate::storage;
use crate::types::{Agreement, AgreementParams, AgreementState, AgreementTerms};
use crate::Error;

/// Validate creation parameters before any state change.
pub fn validate(params: &AgreementParams) -> Result<(), Error> {
    if params.end_date <= params.start_date {
        return Err(Error::InvalidDateRange);
    }
    if params.trigger_price <= 0 {
        return Err(Error::InvalidTriggerPrice);
    }
    if params.reserve_amount <= 0 {
        return Err(Error::InsufficientReserve);
    }
    if params.insurance_fee < 0 {
        return Err(Error::InvalidAmount);
    }
    Ok(())
}

/// Store a new agreement for `seller` and return its terms.
pub fn create(env: &Env, seller: &Address, params: AgreementParams) -> Result<AgreementTerms, Error> {
    validate(&params)?;

    let id = storage::get_and_increment_agreement_id(env);
    let terms = AgreementTerms {
        id,
        seller: seller.clone(),
        trigger_token: params.trigger_token,
        trigger_price: params.trigger_price,
        start_date: params.start_date,
        end_date: params.end_date,
        reserve_asset: params.reserve_asset,
        reserve_amount: params.reserve_amount,
        insurance_fee: params.insurance_fee,
        auto_execute: params.auto_execute,
        whitelist_enabled: params.whitelist_enabled,
    };
    storage::save_agreement(env, &terms, &AgreementState::default());
    storage::push_participant_id(env, seller, id);
    Ok(terms)
}

pub fn get(env: &Env, id: u64) -> Result<Agreement, Error> {
    storage::load_agreement(env, id)
}

pub fn total(env: &Env) -> u64 {
    storage::agreement_count(env)
}

pub fn list_all(env: &Env) -> Result<Vec<Agreement>, Error> {
    list_page(env, 0, total(env) as u32)
}

/// Agreements with ids in `[start, start + limit)`, clipped to the total.
pub fn list_page(env: &Env, start: u64, limit: u32) -> Result<Vec<Agreement>, Error> {
    let end = total(env).min(start.saturating_add(limit as u64));
    let mut out = Vec::new(env);
    for id in start..end {
        out.push_back(storage::load_agreement(env, id)?);
    }
    Ok(out)
}

/// Agreements `principal` sold or bought, in the order they joined them.
pub fn list_by_participant(env: &Env, principal: &Address) -> Result<Vec<Agreement>, Error> {
    let mut out = Vec::new(env);
    for id in storage::get_participant_ids(env, principal).iter() {
        out.push_back(storage::load_agreement(env, id)?);
    }
    Ok(out)
}

pub const ACTIVE_PAGE_SIZE: u64 = 64;

fn page_of(id: u64) -> u32 {
    (id / ACTIVE_PAGE_SIZE) as u32
}

/// Index a buyer and enrol the agreement in the active set.
///
/// A seller buying their own agreement is already indexed from creation.
pub fn record_purchase(env: &Env, terms: &AgreementTerms, buyer: &Address) {
    if *buyer != terms.seller {
        storage::push_participant_id(env, buyer, terms.id);
    }

    let page = page_of(terms.id);
    let mut ids = storage::get_active_page(env, page);
    let mut pos = ids.len();
    for (i, existing) in ids.iter().enumerate() {
        if existing == terms.id {
            return;
        }
        if existing > terms.id {
            pos = i as u32;
            break;
        }
    }
    if ids.is_empty() {
        let mut pages = storage::get_active_pages(env);
        let at = pages.iter().position(|p| p > page).unwrap_or(pages.len() as usize);
        pages.insert(at as u32, page);
        storage::set_active_pages(env, &pages);
    }
    ids.insert(pos, terms.id);
    storage::set_active_page(env, page, &ids);
    storage::set_active_count(env, storage::get_active_count(env) + 1);
}

/// Drop `id` from the active set once it can no longer trigger.
pub fn retire(env: &Env, id: u64) {
    let page = page_of(id);
    let mut ids = storage::get_active_page(env, page);
    let Some(pos) = ids.first_index_of(id) else {
        return;
    };
    ids.remove(pos);
    storage::set_active_page(env, page, &ids);
    if ids.is_empty() {
        let mut pages = storage::get_active_pages(env);
        if let Some(at) = pages.first_index_of(page) {
            pages.remove(at);
            storage::set_active_pages(env, &pages);
        }
    }
    storage::set_active_count(env, storage::get_active_count(env).saturating_sub(1));
}

pub fn retire_many(env: &Env, ids: &Vec<u64>) {
    for id in ids.iter() {
        retire(env, id);
    }
}

/// Up to `limit` active ids in ascending order, starting after `after` and
/// wrapping round to the lowest id. Pages past the limit are never read.
pub fn active_window(env: &Env, after: Option<u64>, limit: u32) -> Vec<u64> {
    let pages = storage::get_active_pages(env);
    let mut out = Vec::new(env);
    match after {
        None => fill_window(env, &pages, &mut out, limit, |_| true, |_| true),
        Some(cursor) => {
            let home = page_of(cursor);
            fill_window(env, &pages, &mut out, limit, |p| p >= home, |id| id > cursor);
            fill_window(env, &pages, &mut out, limit, |p| p <= home, |id| id <= cursor);
        }
    }
    out
}

fn fill_window(
    env: &Env,
    pages: &Vec<u32>,
    out: &mut Vec<u64>,
    limit: u32,
    page_ok: impl Fn(u32) -> bool,
    id_ok: impl Fn(u64) -> bool,
) {
    for page in pages.iter() {
        if out.len() >= limit {
            return;
        }
        if !page_ok(page) {
            continue;
        }
        for id in storage::get_active_page(env, page).iter() {
            if out.len() >= limit {
                return;
            }
            if id_ok(id) {
                out.push_back(id);
            }
        }
    }
}

pub fn active_count(env: &Env) -> u32 {
    storage::get_active_count(env)
}
