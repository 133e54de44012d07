//! # Lifecycle engine
//!
//! The per-agreement state machine:
//!
//! | Operation  | Guards (in order)                                               |
//! |------------|-----------------------------------------------------------------|
//! | `create`   | date range, trigger price, reserve, fee, deposit                |
//! | `purchase` | `Expired`, `AlreadyPurchased`, `NoReserve`, `NotWhitelisted`, `InsufficientFee` |
//! | `trigger`  | `NotActive`, `AlreadyTriggered`, `ContractExpired`, `PriceConditionNotMet` |
//! | `claim`    | `NotBeneficiary`, `NotTriggered`, `AlreadyClaimed`              |
//! | `withdraw` | `NotAuthorized`, `WasTriggered`, `NoReserve`, `StillActive`     |
//!
//! Every operation writes its state before it moves funds out of the
//! contract. The guards above are what reject a re-entrant second payout.

use soroban_sdk::{log, Address, Env};

use crate::events::{self, AgreementCreated};
use crate::ledger::AssetLedger;
use crate::oracle;
use crate::registry;
use crate::storage;
use crate::types::{Agreement, AgreementParams, AgreementState, AgreementTerms};
use crate::whitelist;
use crate::Error;

/// Register an agreement and take the seller's reserve.
pub fn create(
    env: &Env,
    seller: &Address,
    params: AgreementParams,
    attached: i128,
) -> Result<Agreement, Error> {
    let terms = registry::create(env, seller, params)?;
    AssetLedger::new(env, terms.reserve_asset)?.deposit(seller, terms.reserve_amount, attached)?;

    events::emit_agreement_created(
        env,
        AgreementCreated {
            agreement_id: terms.id,
            seller: seller.clone(),
            trigger_token: terms.trigger_token.clone(),
            trigger_price: terms.trigger_price,
            reserve_asset: terms.reserve_asset,
            reserve_amount: terms.reserve_amount,
        },
    );
    Ok(Agreement::from_parts(terms, AgreementState::default()))
}

/// Make `buyer` the beneficiary and forward the fee to the seller.
pub fn purchase(env: &Env, buyer: &Address, id: u64, fee_payment: i128) -> Result<Agreement, Error> {
    let (terms, mut state) = storage::load_agreement_pair(env, id)?;

    if env.ledger().timestamp() > terms.end_date {
        return Err(Error::Expired);
    }
    if state.buyer.is_some() {
        return Err(Error::AlreadyPurchased);
    }
    if state.reserve_withdrawn {
        return Err(Error::NoReserve);
    }
    if terms.whitelist_enabled && !whitelist::is_whitelisted(env, id, buyer) {
        return Err(Error::NotWhitelisted);
    }
    if fee_payment != terms.insurance_fee {
        return Err(Error::InsufficientFee);
    }

    state.buyer = Some(buyer.clone());
    state.active = true;
    storage::save_agreement_state(env, id, &state);
    registry::record_purchase(env, &terms, buyer);

    AssetLedger::new(env, terms.reserve_asset)?.forward(buyer, &terms.seller, terms.insurance_fee)?;

    events::emit_agreement_purchased(env, id, buyer.clone(), terms.insurance_fee);
    Ok(Agreement::from_parts(terms, state))
}

/// Check the state guards and the price condition without changing anything.
///
/// Returns the price sample that satisfied the trigger.
pub fn evaluate(
    env: &Env,
    terms: &AgreementTerms,
    state: &AgreementState,
    now: u64,
) -> Result<i128, Error> {
    if !state.active {
        return Err(Error::NotActive);
    }
    if state.triggered {
        return Err(Error::AlreadyTriggered);
    }
    if now > terms.end_date {
        return Err(Error::ContractExpired);
    }
    let price = oracle::current_price(env, &terms.trigger_token)?;
    if !oracle::condition_met(price, terms.trigger_price) {
        return Err(Error::PriceConditionNotMet);
    }
    Ok(price)
}

/// Mark an evaluated agreement triggered, paying out at once if `auto_execute`.
///
/// A refused automatic payout leaves the agreement triggered but unclaimed,
/// so the buyer can claim once the transfer can succeed. Leaves the active
/// set untouched; callers retire the id.
pub fn execute_trigger(
    env: &Env,
    terms: &AgreementTerms,
    mut state: AgreementState,
    price: i128,
) -> Result<AgreementState, Error> {
    let buyer = state.buyer.clone().ok_or(Error::NotActive)?;

    state.triggered = true;
    if terms.auto_execute {
        state.claimed = true;
    }
    storage::save_agreement_state(env, terms.id, &state);

    events::emit_agreement_triggered(env, terms.id, price, terms.auto_execute);

    if terms.auto_execute {
        let paid = AssetLedger::new(env, terms.reserve_asset)?.pay_out(&buyer, terms.reserve_amount);
        if paid.is_err() {
            state.claimed = false;
            storage::save_agreement_state(env, terms.id, &state);
            log!(env, "auto payout refused", terms.id);
            return Ok(state);
        }
        events::emit_payout_claimed(env, terms.id, buyer, terms.reserve_amount);
    }
    Ok(state)
}

pub fn trigger(env: &Env, id: u64) -> Result<Agreement, Error> {
    let (terms, state) = storage::load_agreement_pair(env, id)?;
    let price = evaluate(env, &terms, &state, env.ledger().timestamp())?;
    let state = execute_trigger(env, &terms, state, price)?;
    registry::retire(env, id);
    Ok(Agreement::from_parts(terms, state))
}

/// Pay a triggered reserve to its buyer. Returns the amount paid.
pub fn claim(env: &Env, caller: &Address, id: u64) -> Result<i128, Error> {
    let (terms, mut state) = storage::load_agreement_pair(env, id)?;

    if state.buyer.as_ref() != Some(caller) {
        return Err(Error::NotBeneficiary);
    }
    if !state.triggered {
        return Err(Error::NotTriggered);
    }
    if state.claimed {
        return Err(Error::AlreadyClaimed);
    }

    state.claimed = true;
    storage::save_agreement_state(env, id, &state);

    AssetLedger::new(env, terms.reserve_asset)?.pay_out(caller, terms.reserve_amount)?;

    events::emit_payout_claimed(env, id, caller.clone(), terms.reserve_amount);
    Ok(terms.reserve_amount)
}

/// Return an untriggered reserve to its seller. Returns the amount refunded.
pub fn withdraw(env: &Env, caller: &Address, id: u64) -> Result<i128, Error> {
    let (terms, mut state) = storage::load_agreement_pair(env, id)?;

    if terms.seller != *caller {
        return Err(Error::NotAuthorized);
    }
    if state.triggered {
        return Err(Error::WasTriggered);
    }
    if state.reserve_withdrawn {
        return Err(Error::NoReserve);
    }
    if state.active && env.ledger().timestamp() <= terms.end_date {
        return Err(Error::StillActive);
    }

    state.reserve_withdrawn = true;
    state.active = false;
    storage::save_agreement_state(env, id, &state);
    registry::retire(env, id);

    AssetLedger::new(env, terms.reserve_asset)?.refund(caller, terms.reserve_amount)?;

    events::emit_reserve_withdrawn(env, id, caller.clone(), terms.reserve_amount);
    Ok(terms.reserve_amount)
}
