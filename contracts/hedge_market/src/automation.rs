//! # Automation scheduler
//!
//! `perform_upkeep` walks the active set in id order, starting just after the
//! last id scanned by the previous call and wrapping around. Each call looks
//! at no more than `max_agreements_per_check` entries and executes no more than
//! `work_budget_per_check` triggers, so a backlog drains over several calls.
//!
//! One agreement failing (missing price, refused payout) never aborts the scan:
//! the failure is logged, published as `upk_fail`, and the next entry is tried.
//! A refused automatic payout is counted as a failure but leaves the
//! agreement triggered, with its reserve waiting for `claim_payout`.

use soroban_sdk::{log, Env, Vec};

use crate::events;
use crate::lifecycle;
use crate::registry;
use crate::storage;
use crate::types::{AutomationConfig, UpkeepCheck, UpkeepReport};
use crate::Error;

pub const DEFAULT_WORK_BUDGET: u32 = 10;
pub const DEFAULT_MAX_PER_CHECK: u32 = 25;
pub const DEFAULT_CHECK_INTERVAL: u64 = 300;

pub fn default_config() -> AutomationConfig {
    AutomationConfig {
        enabled: true,
        work_budget_per_check: DEFAULT_WORK_BUDGET,
        max_agreements_per_check: DEFAULT_MAX_PER_CHECK,
        check_interval_seconds: DEFAULT_CHECK_INTERVAL,
        last_global_check: 0,
    }
}

pub fn configure(
    env: &Env,
    enabled: bool,
    work_budget: u32,
    max_per_check: u32,
    interval: u64,
) -> Result<AutomationConfig, Error> {
    if work_budget == 0 || max_per_check == 0 {
        return Err(Error::InvalidConfig);
    }
    let mut config = storage::get_automation(env)?;
    config.enabled = enabled;
    config.work_budget_per_check = work_budget;
    config.max_agreements_per_check = max_per_check;
    config.check_interval_seconds = interval;
    storage::set_automation(env, &config);
    Ok(config)
}

pub fn set_enabled(env: &Env, enabled: bool) -> Result<AutomationConfig, Error> {
    let mut config = storage::get_automation(env)?;
    config.enabled = enabled;
    storage::set_automation(env, &config);
    Ok(config)
}

/// Entries examined this call: the caller's cap, bounded by configuration.
fn scan_limit(config: &AutomationConfig, requested: u32) -> u32 {
    if requested == 0 {
        config.max_agreements_per_check
    } else {
        requested.min(config.max_agreements_per_check)
    }
}

enum Scan {
    Triggered,
    /// Can never trigger again; drop it from the active set.
    Retired,
    /// Price condition not met yet.
    Waiting,
    Failed(Error),
    /// Triggered, but the automatic payout was refused; left for the buyer to claim.
    Unpaid,
}

fn scan_one(env: &Env, id: u64, now: u64) -> Scan {
    let (terms, state) = match storage::load_agreement_pair(env, id) {
        Ok(pair) => pair,
        Err(_) => return Scan::Retired,
    };
    if !state.active || state.triggered || state.reserve_withdrawn || now > terms.end_date {
        return Scan::Retired;
    }
    match lifecycle::evaluate(env, &terms, &state, now) {
        Ok(price) => match lifecycle::execute_trigger(env, &terms, state, price) {
            Ok(state) if terms.auto_execute && !state.claimed => Scan::Unpaid,
            Ok(_) => Scan::Triggered,
            Err(err) => Scan::Failed(err),
        },
        Err(Error::PriceConditionNotMet) => Scan::Waiting,
        Err(err) => Scan::Failed(err),
    }
}

pub fn perform_upkeep(env: &Env, requested: u32) -> Result<UpkeepReport, Error> {
    let mut config = storage::get_automation(env)?;
    let now = env.ledger().timestamp();

    if !config.enabled {
        let report = UpkeepReport {
            scanned: 0,
            triggered: 0,
            failed: 0,
            skipped: true,
            timestamp: now,
        };
        events::emit_upkeep(env, &report);
        return Ok(report);
    }

    let window = registry::active_window(
        env,
        storage::get_upkeep_cursor(env),
        scan_limit(&config, requested),
    );

    let mut retired: Vec<u64> = Vec::new(env);
    let mut scanned = 0u32;
    let mut triggered = 0u32;
    let mut failed = 0u32;

    for id in window.iter() {
        if triggered >= config.work_budget_per_check {
            break;
        }
        scanned += 1;
        storage::set_upkeep_cursor(env, id);

        match scan_one(env, id, now) {
            Scan::Triggered => {
                triggered += 1;
                retired.push_back(id);
            }
            Scan::Retired => retired.push_back(id),
            Scan::Waiting => {}
            Scan::Failed(err) => {
                failed += 1;
                let code = err as u32;
                log!(env, "upkeep: agreement failed", id, code);
                events::emit_upkeep_failure(env, id, code);
            }
            Scan::Unpaid => {
                failed += 1;
                retired.push_back(id);
                let code = Error::PayoutFailed as u32;
                log!(env, "upkeep: payout refused", id, code);
                events::emit_upkeep_failure(env, id, code);
            }
        }
    }

    registry::retire_many(env, &retired);

    config.last_global_check = now;
    storage::set_automation(env, &config);

    let report = UpkeepReport {
        scanned,
        triggered,
        failed,
        skipped: false,
        timestamp: now,
    };
    events::emit_upkeep(env, &report);
    Ok(report)
}

/// Dry run: which of the entries the next upkeep would scan can trigger now.
///
/// `needed` is only set once the check interval has elapsed.
pub fn check_upkeep(env: &Env) -> Result<UpkeepCheck, Error> {
    let config = storage::get_automation(env)?;
    let now = env.ledger().timestamp();
    let mut ids = Vec::new(env);

    let due = config.last_global_check == 0
        || now >= config.last_global_check.saturating_add(config.check_interval_seconds);
    if !config.enabled || !due {
        return Ok(UpkeepCheck { needed: false, ids });
    }

    let window = registry::active_window(
        env,
        storage::get_upkeep_cursor(env),
        config.max_agreements_per_check,
    );
    for id in window.iter() {
        if let Ok((terms, state)) = storage::load_agreement_pair(env, id) {
            if lifecycle::evaluate(env, &terms, &state, now).is_ok() {
                ids.push_back(id);
            }
        }
    }

    Ok(UpkeepCheck {
        needed: !ids.is_empty(),
        ids,
    })
}
