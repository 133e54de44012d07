//! # Price oracle adapter
//!
//! Resolves `current_price(symbol)` for trigger evaluation. A stored override
//! wins; otherwise the configured oracle contract is asked. The answer is
//! taken as authoritative: no averaging and no staleness check.

use soroban_sdk::{contractclient, Env, Symbol};

use crate::storage;
use crate::Error;

/// Interface expected from an external price feed contract.
#[allow(dead_code)]
#[contractclient(name = "PriceOracleClient")]
pub trait PriceOracle {
    fn current_price(env: Env, symbol: Symbol) -> i128;
}

/// Current price of `symbol`, scaled 1e8.
///
/// Fails with `PriceUnavailable` when no source answers with a positive value.
pub fn current_price(env: &Env, symbol: &Symbol) -> Result<i128, Error> {
    if let Some(price) = storage::get_price(env, symbol) {
        return Ok(price);
    }

    let oracle = storage::get_oracle(env).ok_or(Error::PriceUnavailable)?;
    match PriceOracleClient::new(env, &oracle).try_current_price(symbol) {
        Ok(Ok(price)) if price > 0 => Ok(price),
        _ => Err(Error::PriceUnavailable),
    }
}

/// The trigger condition: price has fallen to or below the threshold.
#[inline]
pub fn condition_met(price: i128, trigger_price: i128) -> bool {
    price <= trigger_price
}
