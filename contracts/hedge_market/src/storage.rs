//! # Storage
//!
//! Provides typed helpers over Soroban's two storage tiers used by the market.
//! No other module touches `env.storage()` directly.
//!
//! ## Instance storage (contract-lifetime TTL)
//!
//! | Key                | Type               | Description                          |
//! |--------------------|--------------------|--------------------------------------|
//! | `AgreementCount`   | `u64`              | Auto-increment agreement ID counter  |
//! | `Assets`           | `AssetConfig`      | Native and fungible token contracts  |
//! | `Paused`           | `bool`             | Emergency pause flag                 |
//! | `Oracle`           | `Address`          | Optional live price oracle           |
//! | `Automation`       | `AutomationConfig` | Scheduler settings                   |
//! | `UpkeepCursor`     | `u64`              | Last agreement ID scanned            |
//! | `ActiveCount`      | `u32`              | Entries across all active pages      |
//! | `Transport`        | `Address`          | Replication transport contract       |
//! | `Domains`          | `Vec<u32>`         | Supported outbound domains           |
//! | `SyncStats`        | `SyncStats`        | Replication counters                 |
//! | `PendingQueue`     | `Vec<u64>`         | FIFO of undelivered message seqs     |
//! | `PendingSeq`       | `u64`              | Pending message sequence counter     |
//!
//! Instance TTL is bumped by **7 days** whenever it falls below 1 day remaining.
//!
//! ## Persistent storage (per-entry TTL)
//!
//! | Key                     | Type             | Description                     |
//! |-------------------------|------------------|---------------------------------|
//! | `Terms(id)`             | `AgreementTerms` | Immutable agreement terms       |
//! | `State(id)`             | `AgreementState` | Mutable agreement state         |
//! | `Participant(addr)`     | `Vec<u64>`       | Agreements a principal is in    |
//! | `ActivePage(page)`      | `Vec<u64>`       | Active ids in one id range      |
//! | `ActivePages`           | `Vec<u32>`       | Indexes of non-empty pages      |
//! | `Listed(id, addr)`      | `bool`           | Whitelist membership            |
//! | `ListedCount(id)`       | `u32`            | Whitelist size                  |
//! | `Price(symbol)`         | `i128`           | Price override                  |
//! | `Receiver(domain)`      | `Address`        | Remote receiver per domain      |
//! | `SourceAllowed(domain)` | `bool`           | Inbound domain allow-list       |
//! | `SenderAllowed(addr)`   | `bool`           | Inbound sender allow-list       |
//! | `Pending(seq)`          | `PendingSync`    | Undelivered outbound message    |
//!
//! Persistent TTL is bumped by **30 days** whenever it falls below 7 days remaining.

use soroban_sdk::{contracttype, Address, Env, Symbol, Vec};

use crate::types::{
    Agreement, AgreementState, AgreementTerms, AutomationConfig, PendingSync, SyncStats,
};
use crate::Error;

// ── TTL Constants ────────────────────────────────────────────────────

/// Approximate ledgers per day (~5 seconds per ledger).
const DAY_IN_LEDGERS: u32 = 17_280;

/// Instance storage: bump by 7 days when below 1 day remaining.
const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
const INSTANCE_LIFETIME_THRESHOLD: u32 = DAY_IN_LEDGERS;

/// Persistent storage: bump by 30 days when below 7 days remaining.
const PERSISTENT_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
const PERSISTENT_LIFETIME_THRESHOLD: u32 = 7 * DAY_IN_LEDGERS;

// ── Storage Keys ─────────────────────────────────────────────────────

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    AgreementCount,
    Assets,
    Paused,
    Oracle,
    Automation,
    UpkeepCursor,
    Transport,
    Domains,
    SyncStats,
    PendingQueue,
    PendingSeq,
    Terms(u64),
    State(u64),
    Participant(Address),
    ActiveCount,
    ActivePage(u32),
    ActivePages,
    Listed(u64, Address),
    ListedCount(u64),
    Price(Symbol),
    Receiver(u32),
    SourceAllowed(u32),
    SenderAllowed(Address),
    Pending(u64),
}

/// The two token contracts reserves can be held in.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AssetConfig {
    pub native: Address,
    pub fungible: Address,
}

// ── Instance Storage Helpers ─────────────────────────────────────────

/// Extend instance storage TTL if it falls below the threshold.
fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

pub fn is_initialized(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Assets)
}

pub fn set_assets(env: &Env, assets: &AssetConfig) {
    env.storage().instance().set(&DataKey::Assets, assets);
    bump_instance(env);
}

pub fn get_assets(env: &Env) -> Result<AssetConfig, Error> {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::Assets)
        .ok_or(Error::NotInitialized)
}

pub fn is_paused(env: &Env) -> bool {
    env.storage()
        .instance()
        .get(&DataKey::Paused)
        .unwrap_or(false)
}

pub fn set_paused(env: &Env, paused: bool) {
    env.storage().instance().set(&DataKey::Paused, &paused);
    bump_instance(env);
}

pub fn get_oracle(env: &Env) -> Option<Address> {
    env.storage().instance().get(&DataKey::Oracle)
}

pub fn set_oracle(env: &Env, oracle: &Address) {
    env.storage().instance().set(&DataKey::Oracle, oracle);
    bump_instance(env);
}

pub fn get_automation(env: &Env) -> Result<AutomationConfig, Error> {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::Automation)
        .ok_or(Error::NotInitialized)
}

pub fn set_automation(env: &Env, config: &AutomationConfig) {
    env.storage().instance().set(&DataKey::Automation, config);
    bump_instance(env);
}

pub fn get_upkeep_cursor(env: &Env) -> Option<u64> {
    env.storage().instance().get(&DataKey::UpkeepCursor)
}

pub fn set_upkeep_cursor(env: &Env, cursor: u64) {
    env.storage().instance().set(&DataKey::UpkeepCursor, &cursor);
}

pub fn get_transport(env: &Env) -> Option<Address> {
    env.storage().instance().get(&DataKey::Transport)
}

pub fn set_transport(env: &Env, transport: &Address) {
    env.storage().instance().set(&DataKey::Transport, transport);
    bump_instance(env);
}

pub fn get_domains(env: &Env) -> Vec<u32> {
    env.storage()
        .instance()
        .get(&DataKey::Domains)
        .unwrap_or_else(|| Vec::new(env))
}

pub fn set_domains(env: &Env, domains: &Vec<u32>) {
    env.storage().instance().set(&DataKey::Domains, domains);
    bump_instance(env);
}

pub fn get_sync_stats(env: &Env) -> SyncStats {
    env.storage()
        .instance()
        .get(&DataKey::SyncStats)
        .unwrap_or_default()
}

pub fn set_sync_stats(env: &Env, stats: &SyncStats) {
    env.storage().instance().set(&DataKey::SyncStats, stats);
    bump_instance(env);
}

pub fn get_pending_queue(env: &Env) -> Vec<u64> {
    env.storage()
        .instance()
        .get(&DataKey::PendingQueue)
        .unwrap_or_else(|| Vec::new(env))
}

pub fn set_pending_queue(env: &Env, queue: &Vec<u64>) {
    env.storage().instance().set(&DataKey::PendingQueue, queue);
}

/// Atomically read and increment the pending-message sequence.
pub fn next_pending_seq(env: &Env) -> u64 {
    let current: u64 = env
        .storage()
        .instance()
        .get(&DataKey::PendingSeq)
        .unwrap_or(0);
    env.storage()
        .instance()
        .set(&DataKey::PendingSeq, &(current + 1));
    current
}

// ─────────────────────────────────────────────────────────
// Agreement counter
// ─────────────────────────────────────────────────────────

/// Atomically read and increment the agreement counter.
/// Returns the ID that should be used for the next agreement.
pub fn get_and_increment_agreement_id(env: &Env) -> u64 {
    bump_instance(env);
    let current = agreement_count(env);
    env.storage()
        .instance()
        .set(&DataKey::AgreementCount, &(current + 1));
    current
}

pub fn agreement_count(env: &Env) -> u64 {
    env.storage()
        .instance()
        .get(&DataKey::AgreementCount)
        .unwrap_or(0)
}

// ── Persistent Storage Helpers ───────────────────────────────────────

/// Extend the TTL for a persistent storage key.
fn bump_persistent(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

/// Save the immutable terms and initial state of a new agreement.
pub fn save_agreement(env: &Env, terms: &AgreementTerms, state: &AgreementState) {
    let terms_key = DataKey::Terms(terms.id);
    env.storage().persistent().set(&terms_key, terms);
    bump_persistent(env, &terms_key);
    save_agreement_state(env, terms.id, state);
}

/// Load the full `Agreement` by combining terms and state.
pub fn load_agreement(env: &Env, id: u64) -> Result<Agreement, Error> {
    let (terms, state) = load_agreement_pair(env, id)?;
    Ok(Agreement::from_parts(terms, state))
}

/// Load terms and state together, bumping both TTLs.
pub fn load_agreement_pair(
    env: &Env,
    id: u64,
) -> Result<(AgreementTerms, AgreementState), Error> {
    Ok((load_agreement_terms(env, id)?, load_agreement_state(env, id)?))
}

/// Load only the immutable agreement terms.
pub fn load_agreement_terms(env: &Env, id: u64) -> Result<AgreementTerms, Error> {
    let key = DataKey::Terms(id);
    let terms: AgreementTerms = env
        .storage()
        .persistent()
        .get(&key)
        .ok_or(Error::NotFound)?;
    bump_persistent(env, &key);
    Ok(terms)
}

/// Load only the mutable agreement state.
pub fn load_agreement_state(env: &Env, id: u64) -> Result<AgreementState, Error> {
    let key = DataKey::State(id);
    let state: AgreementState = env
        .storage()
        .persistent()
        .get(&key)
        .ok_or(Error::NotFound)?;
    bump_persistent(env, &key);
    Ok(state)
}

/// Save only the mutable agreement state.
pub fn save_agreement_state(env: &Env, id: u64, state: &AgreementState) {
    let key = DataKey::State(id);
    env.storage().persistent().set(&key, state);
    bump_persistent(env, &key);
}

// ─────────────────────────────────────────────────────────
// Indexes
// ─────────────────────────────────────────────────────────

pub fn get_participant_ids(env: &Env, principal: &Address) -> Vec<u64> {
    let key = DataKey::Participant(principal.clone());
    let ids = env
        .storage()
        .persistent()
        .get(&key)
        .unwrap_or_else(|| Vec::new(env));
    if env.storage().persistent().has(&key) {
        bump_persistent(env, &key);
    }
    ids
}

/// Append `id` to the participant index of `principal`.
pub fn push_participant_id(env: &Env, principal: &Address, id: u64) {
    let key = DataKey::Participant(principal.clone());
    let mut ids = get_participant_ids(env, principal);
    ids.push_back(id);
    env.storage().persistent().set(&key, &ids);
    bump_persistent(env, &key);
}

/// Ascending active ids stored under one page.
pub fn get_active_page(env: &Env, page: u32) -> Vec<u64> {
    let key = DataKey::ActivePage(page);
    let ids = env
        .storage()
        .persistent()
        .get(&key)
        .unwrap_or_else(|| Vec::new(env));
    if !ids.is_empty() {
        bump_persistent(env, &key);
    }
    ids
}

/// Write one page; an empty page is removed rather than stored.
pub fn set_active_page(env: &Env, page: u32, ids: &Vec<u64>) {
    let key = DataKey::ActivePage(page);
    if ids.is_empty() {
        env.storage().persistent().remove(&key);
    } else {
        env.storage().persistent().set(&key, ids);
        bump_persistent(env, &key);
    }
}

/// Ascending indexes of the pages that hold at least one active id.
pub fn get_active_pages(env: &Env) -> Vec<u32> {
    env.storage()
        .persistent()
        .get(&DataKey::ActivePages)
        .unwrap_or_else(|| Vec::new(env))
}

pub fn set_active_pages(env: &Env, pages: &Vec<u32>) {
    env.storage().persistent().set(&DataKey::ActivePages, pages);
    bump_persistent(env, &DataKey::ActivePages);
}

pub fn get_active_count(env: &Env) -> u32 {
    env.storage()
        .instance()
        .get(&DataKey::ActiveCount)
        .unwrap_or(0)
}

pub fn set_active_count(env: &Env, count: u32) {
    env.storage().instance().set(&DataKey::ActiveCount, &count);
    bump_instance(env);
}

// ─────────────────────────────────────────────────────────
// Whitelist
// ─────────────────────────────────────────────────────────

pub fn is_listed(env: &Env, id: u64, principal: &Address) -> bool {
    env.storage()
        .persistent()
        .get(&DataKey::Listed(id, principal.clone()))
        .unwrap_or(false)
}

pub fn set_listed(env: &Env, id: u64, principal: &Address) {
    let key = DataKey::Listed(id, principal.clone());
    env.storage().persistent().set(&key, &true);
    bump_persistent(env, &key);
}

pub fn clear_listed(env: &Env, id: u64, principal: &Address) {
    env.storage()
        .persistent()
        .remove(&DataKey::Listed(id, principal.clone()));
}

pub fn listed_count(env: &Env, id: u64) -> u32 {
    env.storage()
        .persistent()
        .get(&DataKey::ListedCount(id))
        .unwrap_or(0)
}

pub fn set_listed_count(env: &Env, id: u64, count: u32) {
    let key = DataKey::ListedCount(id);
    env.storage().persistent().set(&key, &count);
    bump_persistent(env, &key);
}

// ─────────────────────────────────────────────────────────
// Prices
// ─────────────────────────────────────────────────────────

pub fn get_price(env: &Env, symbol: &Symbol) -> Option<i128> {
    env.storage()
        .persistent()
        .get(&DataKey::Price(symbol.clone()))
}

pub fn set_price(env: &Env, symbol: &Symbol, price: i128) {
    let key = DataKey::Price(symbol.clone());
    env.storage().persistent().set(&key, &price);
    bump_persistent(env, &key);
}

pub fn clear_price(env: &Env, symbol: &Symbol) {
    env.storage()
        .persistent()
        .remove(&DataKey::Price(symbol.clone()));
}

// ─────────────────────────────────────────────────────────
// Sync gateway
// ─────────────────────────────────────────────────────────

pub fn get_receiver(env: &Env, domain: u32) -> Option<Address> {
    env.storage().persistent().get(&DataKey::Receiver(domain))
}

pub fn set_receiver(env: &Env, domain: u32, receiver: &Address) {
    let key = DataKey::Receiver(domain);
    env.storage().persistent().set(&key, receiver);
    bump_persistent(env, &key);
}

pub fn is_source_allowed(env: &Env, domain: u32) -> bool {
    env.storage()
        .persistent()
        .get(&DataKey::SourceAllowed(domain))
        .unwrap_or(false)
}

pub fn set_source_allowed(env: &Env, domain: u32, allowed: bool) {
    let key = DataKey::SourceAllowed(domain);
    env.storage().persistent().set(&key, &allowed);
    bump_persistent(env, &key);
}

pub fn is_sender_allowed(env: &Env, sender: &Address) -> bool {
    env.storage()
        .persistent()
        .get(&DataKey::SenderAllowed(sender.clone()))
        .unwrap_or(false)
}

pub fn set_sender_allowed(env: &Env, sender: &Address, allowed: bool) {
    let key = DataKey::SenderAllowed(sender.clone());
    env.storage().persistent().set(&key, &allowed);
    bump_persistent(env, &key);
}

pub fn get_pending(env: &Env, seq: u64) -> Option<PendingSync> {
    env.storage().persistent().get(&DataKey::Pending(seq))
}

pub fn set_pending(env: &Env, pending: &PendingSync) {
    let key = DataKey::Pending(pending.seq);
    env.storage().persistent().set(&key, pending);
    bump_persistent(env, &key);
}

pub fn remove_pending(env: &Env, seq: u64) {
    env.storage().persistent().remove(&DataKey::Pending(seq));
}
