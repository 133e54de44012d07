//! # Asset ledger
//!
//! One interface over the two reserve asset kinds so the lifecycle engine
//! never branches on the asset itself.
//!
//! | Kind       | Deposit                                        | Outbound           |
//! |------------|------------------------------------------------|--------------------|
//! | `Native`   | attached amount must match, then `transfer`    | `transfer`         |
//! | `Fungible` | allowance check, then `transfer_from`          | `transfer`         |
//!
//! Token calls never trap: a refused transfer comes back as a market error
//! (`InsufficientReserve`, `InsufficientFee` or `PayoutFailed`) so callers
//! such as the scheduler can carry on past it.
//!
//! Outbound calls (`pay_out`, `refund`) must only be made after the caller has
//! persisted the state change that authorizes them. A recipient that calls
//! back into the market then sees the agreement already claimed or withdrawn.

use soroban_sdk::{token, Address, Env};

use crate::storage;
use crate::types::ReserveAsset;
use crate::Error;

pub struct AssetLedger {
    env: Env,
    kind: ReserveAsset,
    token: Address,
}

impl AssetLedger {
    /// Resolve the token contract configured for `kind`.
    pub fn new(env: &Env, kind: ReserveAsset) -> Result<Self, Error> {
        let assets = storage::get_assets(env)?;
        let token = match kind {
            ReserveAsset::Native => assets.native,
            ReserveAsset::Fungible => assets.fungible,
        };
        Ok(Self {
            env: env.clone(),
            kind,
            token,
        })
    }

    fn client(&self) -> token::Client<'_> {
        token::Client::new(&self.env, &self.token)
    }

    fn contract(&self) -> Address {
        self.env.current_contract_address()
    }

    /// Fail with `InsufficientAllowance` unless `owner` approved at least `amount`.
    fn require_allowance(&self, owner: &Address, amount: i128) -> Result<(), Error> {
        let allowance = self.client().allowance(owner, &self.contract());
        if allowance < amount {
            return Err(Error::InsufficientAllowance);
        }
        Ok(())
    }

    /// Non-trapping `transfer`; any token failure becomes `on_failure`.
    fn send(&self, from: &Address, to: &Address, amount: i128, on_failure: Error) -> Result<(), Error> {
        match self.client().try_transfer(from, to, &amount) {
            Ok(Ok(())) => Ok(()),
            _ => Err(on_failure),
        }
    }

    /// Non-trapping `transfer_from` with this contract as spender.
    fn pull(&self, owner: &Address, to: &Address, amount: i128, on_failure: Error) -> Result<(), Error> {
        match self
            .client()
            .try_transfer_from(&self.contract(), owner, to, &amount)
        {
            Ok(Ok(())) => Ok(()),
            _ => Err(on_failure),
        }
    }

    /// Take `amount` of reserve from `payer` into the contract.
    ///
    /// `attached` is the value the caller declares as sent along with the
    /// call; it is only meaningful for the native asset. A payer who cannot
    /// cover the reserve (balance, authorization) gets `InsufficientReserve`.
    pub fn deposit(&self, payer: &Address, amount: i128, attached: i128) -> Result<(), Error> {
        if amount <= 0 {
            return Err(Error::InsufficientReserve);
        }
        match self.kind {
            ReserveAsset::Native => {
                if attached != amount {
                    return Err(Error::InsufficientReserve);
                }
                self.send(payer, &self.contract(), amount, Error::InsufficientReserve)
            }
            ReserveAsset::Fungible => {
                self.require_allowance(payer, amount)?;
                self.pull(payer, &self.contract(), amount, Error::InsufficientReserve)
            }
        }
    }

    /// Move a fee straight from `payer` to `recipient`; the contract never holds it.
    pub fn forward(&self, payer: &Address, recipient: &Address, amount: i128) -> Result<(), Error> {
        if amount == 0 || payer == recipient {
            return Ok(());
        }
        match self.kind {
            ReserveAsset::Native => self.send(payer, recipient, amount, Error::InsufficientFee),
            ReserveAsset::Fungible => {
                self.require_allowance(payer, amount)?;
                self.pull(payer, recipient, amount, Error::InsufficientFee)
            }
        }
    }

    /// Pay a triggered reserve to its beneficiary.
    pub fn pay_out(&self, recipient: &Address, amount: i128) -> Result<(), Error> {
        self.send(&self.contract(), recipient, amount, Error::PayoutFailed)
    }

    /// Return an untriggered reserve to its seller.
    pub fn refund(&self, recipient: &Address, amount: i128) -> Result<(), Error> {
        self.send(&self.contract(), recipient, amount, Error::PayoutFailed)
    }

    /// Amount of this asset currently held by the contract.
    pub fn held(&self) -> i128 {
        self.client().balance(&self.contract())
    }
}
