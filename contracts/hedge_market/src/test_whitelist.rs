#![cfg(test)]

extern crate std;

use soroban_sdk::{testutils::Address as _, Address, Vec};

use crate::test_utils::*;
use crate::whitelist::MAX_BATCH;
use crate::{Agreement, Error};

fn gated(m: &Market) -> (Address, Agreement) {
    let mut params = default_params();
    params.whitelist_enabled = true;
    m.create(&params)
}

fn addresses(m: &Market, n: u32) -> Vec<Address> {
    let mut out = Vec::new(&m.env);
    for _ in 0..n {
        out.push_back(Address::generate(&m.env));
    }
    out
}

#[test]
fn test_gated_purchase_follows_membership() {
    let m = setup();
    let (seller, agreement) = gated(&m);
    let member = Address::generate(&m.env);
    m.mint(agreement.reserve_asset, &member, agreement.insurance_fee);

    assert_eq!(
        m.client
            .try_purchase(&member, &agreement.id, &agreement.insurance_fee),
        Err(Ok(Error::NotWhitelisted))
    );

    m.client.add_to_whitelist(&seller, &agreement.id, &member);
    assert!(m.client.is_whitelisted(&agreement.id, &member));
    m.client.remove_from_whitelist(&seller, &agreement.id, &member);
    assert!(!m.client.is_whitelisted(&agreement.id, &member));
    assert_eq!(
        m.client
            .try_purchase(&member, &agreement.id, &agreement.insurance_fee),
        Err(Ok(Error::NotWhitelisted))
    );

    m.client.add_to_whitelist(&seller, &agreement.id, &member);
    let bought = m
        .client
        .purchase(&member, &agreement.id, &agreement.insurance_fee);
    assert_eq!(bought.buyer, Some(member));
}

#[test]
fn test_open_agreement_ignores_whitelist() {
    let m = setup();
    let (_, agreement) = m.create(&default_params());
    let buyer = m.buy(&agreement);
    assert!(!m.client.is_whitelisted(&agreement.id, &buyer));
    assert_eq!(m.client.get_agreement(&agreement.id).buyer, Some(buyer));
}

#[test]
fn test_duplicate_add_rejected() {
    let m = setup();
    let (seller, agreement) = gated(&m);
    let member = Address::generate(&m.env);
    m.client.add_to_whitelist(&seller, &agreement.id, &member);
    assert_eq!(
        m.client
            .try_add_to_whitelist(&seller, &agreement.id, &member),
        Err(Ok(Error::AlreadyWhitelisted))
    );
}

#[test]
fn test_remove_absent_is_noop() {
    let m = setup();
    let (seller, agreement) = gated(&m);
    let stranger = Address::generate(&m.env);
    m.client
        .remove_from_whitelist(&seller, &agreement.id, &stranger);
    assert_eq!(m.client.whitelist_stats(&agreement.id).count, 0);
}

#[test]
fn test_only_seller_edits_whitelist() {
    let m = setup();
    let (_, agreement) = gated(&m);
    let intruder = Address::generate(&m.env);
    let member = Address::generate(&m.env);

    assert_eq!(
        m.client
            .try_add_to_whitelist(&intruder, &agreement.id, &member),
        Err(Ok(Error::NotAuthorized))
    );
    assert_eq!(
        m.client
            .try_remove_from_whitelist(&intruder, &agreement.id, &member),
        Err(Ok(Error::NotAuthorized))
    );
    assert_eq!(
        m.client.try_batch_add_to_whitelist(
            &intruder,
            &agreement.id,
            &addresses(&m, 2)
        ),
        Err(Ok(Error::NotAuthorized))
    );
}

#[test]
fn test_whitelist_on_missing_agreement() {
    let m = setup();
    let seller = Address::generate(&m.env);
    let member = Address::generate(&m.env);
    assert_eq!(
        m.client.try_add_to_whitelist(&seller, &9, &member),
        Err(Ok(Error::NotFound))
    );
    assert_eq!(
        m.client.try_whitelist_stats(&9),
        Err(Ok(Error::NotFound))
    );
}

#[test]
fn test_null_principal_rejected() {
    let m = setup();
    let (seller, agreement) = gated(&m);
    let null = m.client.address.clone();

    assert_eq!(
        m.client.try_add_to_whitelist(&seller, &agreement.id, &null),
        Err(Ok(Error::InvalidPrincipal))
    );

    let mut batch = addresses(&m, 2);
    batch.push_back(null);
    assert_eq!(
        m.client
            .try_batch_add_to_whitelist(&seller, &agreement.id, &batch),
        Err(Ok(Error::InvalidPrincipal))
    );
    // Validation happens before any entry is written.
    assert_eq!(m.client.whitelist_stats(&agreement.id).count, 0);
}

#[test]
fn test_batch_add_skips_duplicates() {
    let m = setup();
    let (seller, agreement) = gated(&m);
    let batch = addresses(&m, 3);
    m.client
        .add_to_whitelist(&seller, &agreement.id, &batch.get(1).unwrap());

    let mut with_repeat = batch.clone();
    with_repeat.push_back(batch.get(0).unwrap());
    assert_eq!(
        m.client
            .batch_add_to_whitelist(&seller, &agreement.id, &with_repeat),
        2
    );
    assert_eq!(m.client.whitelist_stats(&agreement.id).count, 3);
    for member in batch.iter() {
        assert!(m.client.is_whitelisted(&agreement.id, &member));
    }

    // Same batch again changes nothing.
    assert_eq!(
        m.client
            .batch_add_to_whitelist(&seller, &agreement.id, &batch),
        0
    );
}

#[test]
fn test_batch_remove_counts_only_listed() {
    let m = setup();
    let (seller, agreement) = gated(&m);
    let batch = addresses(&m, 4);
    m.client
        .batch_add_to_whitelist(&seller, &agreement.id, &batch);

    let mut removal = Vec::new(&m.env);
    removal.push_back(batch.get(0).unwrap());
    removal.push_back(batch.get(2).unwrap());
    removal.push_back(Address::generate(&m.env));
    assert_eq!(
        m.client
            .batch_remove_from_whitelist(&seller, &agreement.id, &removal),
        2
    );

    let stats = m.client.whitelist_stats(&agreement.id);
    assert_eq!(stats.count, 2);
    assert!(m.client.is_whitelisted(&agreement.id, &batch.get(1).unwrap()));
    assert!(!m.client.is_whitelisted(&agreement.id, &batch.get(2).unwrap()));
}

#[test]
fn test_batch_size_limit() {
    let m = setup();
    let (seller, agreement) = gated(&m);

    let full = addresses(&m, MAX_BATCH);
    assert_eq!(
        m.client
            .batch_add_to_whitelist(&seller, &agreement.id, &full),
        MAX_BATCH
    );

    let oversized = addresses(&m, MAX_BATCH + 1);
    assert_eq!(
        m.client
            .try_batch_add_to_whitelist(&seller, &agreement.id, &oversized),
        Err(Ok(Error::BatchTooLarge))
    );
    assert_eq!(
        m.client
            .try_batch_remove_from_whitelist(&seller, &agreement.id, &oversized),
        Err(Ok(Error::BatchTooLarge))
    );
}

#[test]
fn test_stats_reflect_flag_and_count() {
    let m = setup();
    let (seller, agreement) = gated(&m);
    let stats = m.client.whitelist_stats(&agreement.id);
    assert_eq!(stats.agreement_id, agreement.id);
    assert_eq!(stats.count, 0);
    assert!(stats.enabled);

    m.client
        .batch_add_to_whitelist(&seller, &agreement.id, &addresses(&m, 5));
    assert_eq!(m.client.whitelist_stats(&agreement.id).count, 5);

    let (_, open) = m.create(&default_params());
    assert!(!m.client.whitelist_stats(&open.id).enabled);
}

#[test]
fn test_whitelists_are_per_agreement() {
    let m = setup();
    let (seller, first) = gated(&m);
    let second = m.create_as(&seller, &{
        let mut params = default_params();
        params.whitelist_enabled = true;
        params
    });
    let member = Address::generate(&m.env);
    m.client.add_to_whitelist(&seller, &first.id, &member);

    assert!(m.client.is_whitelisted(&first.id, &member));
    assert!(!m.client.is_whitelisted(&second.id, &member));
}
