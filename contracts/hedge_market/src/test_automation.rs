#![cfg(test)]

extern crate std;

use soroban_sdk::{contract, contractimpl, symbol_short, Env, Symbol};

use crate::invariants::*;
use crate::registry::ACTIVE_PAGE_SIZE;
use crate::test_utils::*;
use crate::{Agreement, Error, ReserveAsset};

/// Price feed stand-in; panics for symbols it has never been given.
#[contract]
pub struct MockOracle;

#[contractimpl]
impl MockOracle {
    pub fn set(env: Env, symbol: Symbol, price: i128) {
        env.storage().instance().set(&symbol, &price);
    }

    pub fn current_price(env: Env, symbol: Symbol) -> i128 {
        env.storage()
            .instance()
            .get(&symbol)
            .expect("no price for symbol")
    }
}

fn purchased(m: &Market, trigger_price: i128) -> Agreement {
    let mut params = default_params();
    params.trigger_price = trigger_price;
    let (_, agreement) = m.create(&params);
    m.buy(&agreement);
    agreement
}

#[test]
fn test_upkeep_triggers_exactly_matching_subset() {
    let m = setup();
    let prices: [i128; 5] = [10, 20, 30, 40, 50];
    let agreements: std::vec::Vec<Agreement> = prices
        .iter()
        .map(|p| purchased(&m, p * PRICE_UNIT))
        .collect();

    m.set_price(&eth(), 30 * PRICE_UNIT);
    let report = m.client.perform_upkeep(&0);

    assert_eq!(report.scanned, 5);
    assert_eq!(report.triggered, 3);
    assert_eq!(report.failed, 0);
    for agreement in &agreements {
        let current = m.client.get_agreement(&agreement.id);
        assert_eq!(current.triggered, agreement.trigger_price >= 30 * PRICE_UNIT);
        assert_all_agreement_invariants(&current);
    }
    assert_eq!(m.client.active_count(), 2);
}

#[test]
fn test_upkeep_with_no_agreements_still_completes() {
    let m = setup();
    m.advance(42);
    let report = m.client.perform_upkeep(&10);

    assert!(!report.skipped);
    assert_eq!(report.scanned, 0);
    assert_eq!(report.triggered, 0);
    assert_eq!(m.client.automation_status().last_global_check, START + 42);
}

#[test]
fn test_upkeep_with_zero_matches_updates_timestamp() {
    let m = setup();
    purchased(&m, 10 * PRICE_UNIT);
    m.set_price(&eth(), 30 * PRICE_UNIT);

    let report = m.client.perform_upkeep(&0);
    assert_eq!(report.scanned, 1);
    assert_eq!(report.triggered, 0);
    assert_eq!(m.client.automation_status().last_global_check, START);
    assert_eq!(m.client.active_count(), 1);
}

#[test]
fn test_disabled_upkeep_skips_scan() {
    let m = setup();
    let agreement = purchased(&m, 50 * PRICE_UNIT);
    m.set_price(&eth(), 30 * PRICE_UNIT);
    m.client.set_automation_enabled(&m.admin, &false);

    let report = m.client.perform_upkeep(&0);
    assert!(report.skipped);
    assert_eq!(report.scanned, 0);
    assert!(!m.client.get_agreement(&agreement.id).triggered);
    assert_eq!(m.client.automation_status().last_global_check, 0);
}

#[test]
fn test_upkeep_resumes_across_calls() {
    let m = setup();
    m.client.configure_automation(&m.admin, &true, &10, &2, &60);
    for _ in 0..5 {
        purchased(&m, 50 * PRICE_UNIT);
    }
    m.set_price(&eth(), 30 * PRICE_UNIT);

    assert_eq!(m.client.perform_upkeep(&0).triggered, 2);
    assert_eq!(m.client.active_count(), 3);
    assert_eq!(m.client.perform_upkeep(&0).triggered, 2);
    assert_eq!(m.client.perform_upkeep(&0).triggered, 1);
    assert_eq!(m.client.active_count(), 0);
    assert_eq!(m.client.perform_upkeep(&0).scanned, 0);
}

#[test]
fn test_caller_limit_is_capped_by_config() {
    let m = setup();
    m.client.configure_automation(&m.admin, &true, &10, &3, &60);
    for _ in 0..5 {
        purchased(&m, 50 * PRICE_UNIT);
    }
    m.set_price(&eth(), 30 * PRICE_UNIT);

    assert_eq!(m.client.perform_upkeep(&100).scanned, 3);
    assert_eq!(m.client.perform_upkeep(&1).scanned, 1);
}

#[test]
fn test_work_budget_limits_triggers_per_call() {
    let m = setup();
    m.client.configure_automation(&m.admin, &true, &1, &10, &60);
    for _ in 0..3 {
        purchased(&m, 50 * PRICE_UNIT);
    }
    m.set_price(&eth(), 30 * PRICE_UNIT);

    let first = m.client.perform_upkeep(&0);
    assert_eq!(first.triggered, 1);
    assert_eq!(first.scanned, 1);
    assert_eq!(m.client.perform_upkeep(&0).triggered, 1);
    assert_eq!(m.client.perform_upkeep(&0).triggered, 1);
    assert_eq!(m.client.active_count(), 0);
}

#[test]
fn test_upkeep_isolates_failing_agreement() {
    let m = setup();
    let mut params = default_params();
    params.trigger_token = symbol_short!("DOGE");
    let (_, orphan) = m.create(&params);
    m.buy(&orphan);
    let healthy = purchased(&m, 50 * PRICE_UNIT);
    m.set_price(&eth(), 30 * PRICE_UNIT);

    let report = m.client.perform_upkeep(&0);
    assert_eq!(report.scanned, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.triggered, 1);
    assert!(m.client.get_agreement(&healthy.id).triggered);
    assert!(!m.client.get_agreement(&orphan.id).triggered);
    // The failing agreement stays eligible for the next cycle.
    assert_eq!(m.client.active_count(), 1);

    m.set_price(&symbol_short!("DOGE"), PRICE_UNIT);
    assert_eq!(m.client.perform_upkeep(&0).triggered, 1);
}

#[test]
fn test_upkeep_survives_refused_payout() {
    let m = setup();
    let mut params = default_params();
    params.reserve_asset = ReserveAsset::Fungible;
    params.trigger_price = 50 * PRICE_UNIT;
    let (_, frozen) = m.create(&params);
    let frozen_buyer = m.buy(&frozen);
    let (_, healthy) = m.create(&params);
    let healthy_buyer = m.buy(&healthy);

    m.set_authorized(ReserveAsset::Fungible, &frozen_buyer, false);
    m.advance(10);
    m.set_price(&eth(), 30 * PRICE_UNIT);

    let report = m.client.perform_upkeep(&0);
    assert_eq!(report.scanned, 2);
    assert_eq!(report.triggered, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(m.client.automation_status().last_global_check, START + 10);
    assert_eq!(m.client.active_count(), 0);

    let paid = m.client.get_agreement(&healthy.id);
    assert!(paid.triggered && paid.claimed);
    assert_eq!(m.fungible.balance(&healthy_buyer), params.reserve_amount);

    let unpaid = m.client.get_agreement(&frozen.id);
    assert!(unpaid.triggered);
    assert!(!unpaid.claimed);
    assert_all_agreement_invariants(&unpaid);
    assert_eq!(m.fungible.balance(&m.client.address), params.reserve_amount);

    m.set_authorized(ReserveAsset::Fungible, &frozen_buyer, true);
    assert_eq!(
        m.client.claim_payout(&frozen_buyer, &frozen.id),
        params.reserve_amount
    );
    assert_eq!(m.fungible.balance(&m.client.address), 0);
}

#[test]
fn test_upkeep_walks_across_active_pages() {
    let m = setup();
    m.client.configure_automation(&m.admin, &true, &100, &30, &60);
    let total = ACTIVE_PAGE_SIZE as u32 + 6;
    for _ in 0..total {
        purchased(&m, 50 * PRICE_UNIT);
    }
    assert_eq!(m.client.active_count(), total);

    m.set_price(&eth(), 30 * PRICE_UNIT);
    assert_eq!(m.client.perform_upkeep(&0).triggered, 30);
    assert_eq!(m.client.perform_upkeep(&0).triggered, 30);
    assert_eq!(m.client.active_count(), total - 60);
    // Ids up to 59 are done; 60..=63 are still in the first page.
    assert!(m.client.get_agreement(&59).triggered);
    assert!(!m.client.get_agreement(&60).triggered);

    let last = m.client.perform_upkeep(&0);
    assert_eq!(last.scanned, total - 60);
    assert_eq!(last.triggered, total - 60);
    assert_eq!(m.client.active_count(), 0);
    assert_eq!(m.client.perform_upkeep(&0).scanned, 0);
}

#[test]
fn test_retiring_inside_a_page_keeps_order() {
    let m = setup();
    let agreements: std::vec::Vec<Agreement> = (0..ACTIVE_PAGE_SIZE + 2)
        .map(|_| purchased(&m, 50 * PRICE_UNIT))
        .collect();
    m.client.configure_automation(&m.admin, &true, &100, &100, &60);

    // Drain the second page by hand, then scan what is left.
    m.set_price(&eth(), 30 * PRICE_UNIT);
    let tail = &agreements[ACTIVE_PAGE_SIZE as usize..];
    for agreement in tail {
        m.client.trigger_payout(&agreement.id);
    }
    assert_eq!(m.client.active_count(), ACTIVE_PAGE_SIZE as u32);

    let report = m.client.perform_upkeep(&0);
    assert_eq!(report.scanned, ACTIVE_PAGE_SIZE as u32);
    assert_eq!(report.triggered, ACTIVE_PAGE_SIZE as u32);
    assert_eq!(m.client.active_count(), 0);
}

#[test]
fn test_upkeep_prunes_expired_agreements() {
    let m = setup();
    let mut params = default_params();
    params.end_date = START + 60;
    let (seller, agreement) = m.create(&params);
    m.buy(&agreement);

    m.advance(120);
    m.set_price(&eth(), PRICE_UNIT);
    let report = m.client.perform_upkeep(&0);
    assert_eq!(report.scanned, 1);
    assert_eq!(report.triggered, 0);
    assert_eq!(m.client.active_count(), 0);

    assert_eq!(
        m.client.withdraw_reserve(&seller, &agreement.id),
        params.reserve_amount
    );
}

#[test]
fn test_withdrawal_before_upkeep_wins() {
    let m = setup();
    let mut params = default_params();
    params.end_date = START + 60;
    let (seller, agreement) = m.create(&params);
    m.buy(&agreement);

    m.advance(61);
    m.client.withdraw_reserve(&seller, &agreement.id);
    m.set_price(&eth(), PRICE_UNIT);

    let report = m.client.perform_upkeep(&0);
    assert_eq!(report.scanned, 0);
    assert_eq!(
        m.client.try_trigger_payout(&agreement.id),
        Err(Ok(Error::NotActive))
    );
}

#[test]
fn test_upkeep_without_auto_execute_leaves_claim() {
    let m = setup();
    let mut params = default_params();
    params.auto_execute = false;
    let (_, agreement) = m.create(&params);
    let buyer = m.buy(&agreement);
    m.set_price(&eth(), PRICE_UNIT);

    assert_eq!(m.client.perform_upkeep(&0).triggered, 1);
    let current = m.client.get_agreement(&agreement.id);
    assert!(current.triggered);
    assert!(!current.claimed);
    assert_eq!(
        m.client.claim_payout(&buyer, &agreement.id),
        agreement.reserve_amount
    );
}

#[test]
fn test_check_upkeep_reports_candidates_and_interval() {
    let m = setup();
    m.client.configure_automation(&m.admin, &true, &10, &10, &300);
    let low = purchased(&m, 10 * PRICE_UNIT);
    let high = purchased(&m, 50 * PRICE_UNIT);
    m.set_price(&eth(), 30 * PRICE_UNIT);

    let check = m.client.check_upkeep();
    assert!(check.needed);
    assert_eq!(check.ids.len(), 1);
    assert_eq!(check.ids.get(0).unwrap(), high.id);
    assert!(!m.client.get_agreement(&high.id).triggered);

    m.client.perform_upkeep(&0);
    m.set_price(&eth(), 5 * PRICE_UNIT);
    assert!(!m.client.check_upkeep().needed);

    m.advance(300);
    let check = m.client.check_upkeep();
    assert!(check.needed);
    assert_eq!(check.ids.get(0).unwrap(), low.id);
}

#[test]
fn test_configure_automation_rejects_zero_limits() {
    let m = setup();
    assert_eq!(
        m.client
            .try_configure_automation(&m.admin, &true, &0, &10, &60),
        Err(Ok(Error::InvalidConfig))
    );
    assert_eq!(
        m.client
            .try_configure_automation(&m.admin, &true, &10, &0, &60),
        Err(Ok(Error::InvalidConfig))
    );
}

// ─── Oracle contract ─────────────────────────────────────

#[test]
fn test_trigger_uses_oracle_contract() {
    let m = setup();
    let oracle_id = m.env.register(MockOracle, ());
    let oracle = MockOracleClient::new(&m.env, &oracle_id);
    m.client.set_oracle(&m.admin, &oracle_id);

    let agreement = purchased(&m, 30 * PRICE_UNIT);
    assert_eq!(
        m.client.try_trigger_payout(&agreement.id),
        Err(Ok(Error::PriceUnavailable))
    );

    oracle.set(&eth(), &(29 * PRICE_UNIT));
    assert_eq!(m.client.current_price(&eth()), 29 * PRICE_UNIT);
    assert!(m.client.trigger_payout(&agreement.id).triggered);
}

#[test]
fn test_override_wins_over_oracle_contract() {
    let m = setup();
    let oracle_id = m.env.register(MockOracle, ());
    MockOracleClient::new(&m.env, &oracle_id).set(&eth(), &(10 * PRICE_UNIT));
    m.client.set_oracle(&m.admin, &oracle_id);

    m.set_price(&eth(), 40 * PRICE_UNIT);
    let agreement = purchased(&m, 30 * PRICE_UNIT);
    assert_eq!(
        m.client.try_trigger_payout(&agreement.id),
        Err(Ok(Error::PriceConditionNotMet))
    );
}
