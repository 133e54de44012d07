//! # Hedge Market Contract
//!
//! A peer-to-peer price-hedging insurance marketplace. A seller locks a
//! reserve against a reference asset's price falling to a trigger threshold
//! before a deadline; a buyer pays a fee to become the beneficiary of that
//! reserve if the trigger fires.
//!
//! | Phase        | Entry Point(s)                                              |
//! |--------------|-------------------------------------------------------------|
//! | Bootstrap    | [`HedgeMarket::init`]                                       |
//! | Role admin   | `grant_role`, `revoke_role`, `transfer_super_admin`         |
//! | Lifecycle    | `create_agreement`, `purchase`, `trigger_payout`, `claim_payout`, `withdraw_reserve` |
//! | Whitelist    | `add_to_whitelist`, `remove_from_whitelist`, batch variants |
//! | Automation   | `perform_upkeep`, `check_upkeep`, `configure_automation`    |
//! | Replication  | `sync_whitelist_add`, `receive_sync_message`, `retry_pending_sync` |
//! | Prices       | `set_price`, `clear_price`, `set_oracle`, `current_price`   |
//! | Emergency    | `pause`, `unpause`, `recover_native`, `recover_fungible`    |
//! | Queries      | `get_agreement`, `list_all`, `list_by_participant`, ...     |
//!
//! ## Architecture
//!
//! Each component lives in its own module: [`registry`], [`whitelist`],
//! [`lifecycle`], [`automation`], [`sync`], with fund movement behind
//! [`ledger`] and prices behind [`oracle`]. Component functions return
//! `Result<_, Error>`; this file only authenticates callers, forwards those
//! results as contract errors and exposes queries.

#![no_std]

use soroban_sdk::{contract, contracterror, contractimpl, Address, Bytes, Env, Symbol, Vec};

pub mod automation;
pub mod events;
pub mod ledger;
pub mod lifecycle;
pub mod oracle;
pub mod rbac;
pub mod registry;
mod storage;
pub mod sync;
mod types;
pub mod whitelist;

#[cfg(test)]
mod test_automation;
#[cfg(test)]
mod test_whitelist;

pub use rbac::Role;
pub use storage::AssetConfig;
pub use types::{
    Agreement, AgreementParams, AutomationConfig, PendingSync, ReserveAsset, SyncMessage,
    SyncStats, UpkeepCheck, UpkeepReport, WhitelistOp, WhitelistStats,
};

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    NotFound = 1,
    NotAuthorized = 2,
    AlreadyInitialized = 3,
    NotInitialized = 4,
    InvalidDateRange = 5,
    InvalidTriggerPrice = 6,
    InvalidAmount = 7,
    InsufficientReserve = 8,
    InsufficientAllowance = 9,
    Expired = 10,
    AlreadyPurchased = 11,
    NotWhitelisted = 12,
    InsufficientFee = 13,
    NotActive = 14,
    AlreadyTriggered = 15,
    ContractExpired = 16,
    PriceConditionNotMet = 17,
    NotBeneficiary = 18,
    NotTriggered = 19,
    AlreadyClaimed = 20,
    StillActive = 21,
    WasTriggered = 22,
    NoReserve = 23,
    AlreadyWhitelisted = 24,
    InvalidPrincipal = 25,
    BatchTooLarge = 26,
    PriceUnavailable = 27,
    InvalidConfig = 28,
    UnknownDomain = 29,
    DispatchFailed = 30,
    UnauthorizedSource = 31,
    UnauthorizedSender = 32,
    InvalidPayload = 33,
    InsufficientBalance = 34,
    ProtocolPaused = 35,
    PayoutFailed = 36,
}

#[contract]
pub struct HedgeMarket;

#[contractimpl]
impl HedgeMarket {
    // ─────────────────────────────────────────────────────────
    // Initialisation
    // ─────────────────────────────────────────────────────────

    /// Initialise the contract: first SuperAdmin, reserve assets and default
    /// automation settings.
    ///
    /// Subsequent calls fail with `Error::AlreadyInitialized`.
    pub fn init(
        env: Env,
        super_admin: Address,
        native_asset: Address,
        fungible_asset: Address,
    ) -> Result<(), Error> {
        super_admin.require_auth();
        if storage::is_initialized(&env) {
            return Err(Error::AlreadyInitialized);
        }
        rbac::init_super_admin(&env, &super_admin)?;
        storage::set_assets(
            &env,
            &AssetConfig {
                native: native_asset,
                fungible: fungible_asset,
            },
        );
        storage::set_automation(&env, &automation::default_config());
        Ok(())
    }

    // ─────────────────────────────────────────────────────────
    // Role management
    // ─────────────────────────────────────────────────────────

    /// Grant `role` to `target`. Only the SuperAdmin can grant `SuperAdmin`.
    pub fn grant_role(env: Env, caller: Address, target: Address, role: Role) -> Result<(), Error> {
        caller.require_auth();
        rbac::grant_role(&env, &caller, &target, role)
    }

    /// Revoke any role from `target`. The SuperAdmin cannot be revoked.
    pub fn revoke_role(env: Env, caller: Address, target: Address) -> Result<(), Error> {
        caller.require_auth();
        rbac::revoke_role(&env, &caller, &target)
    }

    pub fn transfer_super_admin(
        env: Env,
        current_super_admin: Address,
        new_super_admin: Address,
    ) -> Result<(), Error> {
        current_super_admin.require_auth();
        rbac::transfer_super_admin(&env, &current_super_admin, &new_super_admin)
    }

    pub fn role_of(env: Env, address: Address) -> Option<Role> {
        rbac::get_role(&env, &address)
    }

    pub fn has_role(env: Env, address: Address, role: Role) -> bool {
        rbac::has_role(&env, &address, role)
    }

    // ─────────────────────────────────────────────────────────
    // Emergency Control
    // ─────────────────────────────────────────────────────────

    /// Halt new agreements and purchases. Triggers, claims and withdrawals
    /// keep working so no reserve is ever frozen.
    pub fn pause(env: Env, caller: Address) -> Result<(), Error> {
        Self::require_operator(&env, &caller)?;
        storage::set_paused(&env, true);
        events::emit_protocol_paused(&env, caller);
        Ok(())
    }

    pub fn unpause(env: Env, caller: Address) -> Result<(), Error> {
        Self::require_operator(&env, &caller)?;
        storage::set_paused(&env, false);
        events::emit_protocol_unpaused(&env, caller);
        Ok(())
    }

    pub fn is_paused(env: Env) -> bool {
        storage::is_paused(&env)
    }

    /// Move `amount` of the native asset held by the contract to `recipient`.
    pub fn recover_native(
        env: Env,
        caller: Address,
        amount: i128,
        recipient: Address,
    ) -> Result<(), Error> {
        Self::recover(&env, &caller, ReserveAsset::Native, amount, &recipient)
    }

    /// Move `amount` of the fungible asset held by the contract to `recipient`.
    pub fn recover_fungible(
        env: Env,
        caller: Address,
        amount: i128,
        recipient: Address,
    ) -> Result<(), Error> {
        Self::recover(&env, &caller, ReserveAsset::Fungible, amount, &recipient)
    }

    // ─────────────────────────────────────────────────────────
    // Prices
    // ─────────────────────────────────────────────────────────

    /// Override the price of `symbol`. `caller` must be an operator or price feeder.
    pub fn set_price(env: Env, caller: Address, symbol: Symbol, price: i128) -> Result<(), Error> {
        caller.require_auth();
        rbac::require_price_feeder(&env, &caller)?;
        if price <= 0 {
            return Err(Error::InvalidTriggerPrice);
        }
        storage::set_price(&env, &symbol, price);
        events::emit_price_set(&env, symbol, price, caller);
        Ok(())
    }

    /// Drop the override for `symbol`, falling back to the oracle contract.
    pub fn clear_price(env: Env, caller: Address, symbol: Symbol) -> Result<(), Error> {
        caller.require_auth();
        rbac::require_price_feeder(&env, &caller)?;
        storage::clear_price(&env, &symbol);
        Ok(())
    }

    pub fn set_oracle(env: Env, caller: Address, oracle: Address) -> Result<(), Error> {
        Self::require_operator(&env, &caller)?;
        storage::set_oracle(&env, &oracle);
        Ok(())
    }

    pub fn current_price(env: Env, symbol: Symbol) -> Result<i128, Error> {
        oracle::current_price(&env, &symbol)
    }

    // ─────────────────────────────────────────────────────────
    // Agreement lifecycle
    // ─────────────────────────────────────────────────────────

    /// Create an agreement and lock the seller's reserve.
    ///
    /// For `ReserveAsset::Native`, `attached` is the value sent with the call
    /// and must equal `reserve_amount`. Fungible reserves are pulled through
    /// an allowance granted to this contract beforehand.
    pub fn create_agreement(
        env: Env,
        seller: Address,
        params: AgreementParams,
        attached: i128,
    ) -> Result<Agreement, Error> {
        Self::require_not_paused(&env)?;
        seller.require_auth();
        lifecycle::create(&env, &seller, params, attached)
    }

    /// Buy agreement `id`. `fee_payment` must equal its `insurance_fee`,
    /// which goes straight to the seller.
    pub fn purchase(env: Env, buyer: Address, id: u64, fee_payment: i128) -> Result<Agreement, Error> {
        Self::require_not_paused(&env)?;
        buyer.require_auth();
        lifecycle::purchase(&env, &buyer, id, fee_payment)
    }

    /// Trigger agreement `id` if its price condition holds. Callable by anyone.
    ///
    /// With `auto_execute`, a payout the token refuses leaves the agreement
    /// triggered but unclaimed; the buyer can claim later.
    pub fn trigger_payout(env: Env, id: u64) -> Result<Agreement, Error> {
        lifecycle::trigger(&env, id)
    }

    /// Pay a triggered reserve to its buyer. Returns the amount paid.
    pub fn claim_payout(env: Env, buyer: Address, id: u64) -> Result<i128, Error> {
        buyer.require_auth();
        lifecycle::claim(&env, &buyer, id)
    }

    /// Return an untriggered, unsold or expired reserve to its seller.
    pub fn withdraw_reserve(env: Env, seller: Address, id: u64) -> Result<i128, Error> {
        seller.require_auth();
        lifecycle::withdraw(&env, &seller, id)
    }

    // ─────────────────────────────────────────────────────────
    // Registry queries
    // ─────────────────────────────────────────────────────────

    pub fn get_agreement(env: Env, id: u64) -> Result<Agreement, Error> {
        registry::get(&env, id)
    }

    pub fn list_all(env: Env) -> Result<Vec<Agreement>, Error> {
        registry::list_all(&env)
    }

    pub fn list_agreements(env: Env, start: u64, limit: u32) -> Result<Vec<Agreement>, Error> {
        registry::list_page(&env, start, limit)
    }

    pub fn list_by_participant(env: Env, principal: Address) -> Result<Vec<Agreement>, Error> {
        registry::list_by_participant(&env, &principal)
    }

    pub fn total_agreements(env: Env) -> u64 {
        registry::total(&env)
    }

    /// Purchased agreements not yet triggered, withdrawn or pruned as expired.
    pub fn active_count(env: Env) -> u32 {
        registry::active_count(&env)
    }

    // ─────────────────────────────────────────────────────────
    // Whitelist
    // ─────────────────────────────────────────────────────────

    pub fn add_to_whitelist(env: Env, seller: Address, id: u64, principal: Address) -> Result<(), Error> {
        seller.require_auth();
        whitelist::add(&env, &seller, id, &principal)
    }

    pub fn remove_from_whitelist(
        env: Env,
        seller: Address,
        id: u64,
        principal: Address,
    ) -> Result<(), Error> {
        seller.require_auth();
        whitelist::remove(&env, &seller, id, &principal)
    }

    /// Returns how many principals were newly listed; duplicates are skipped.
    pub fn batch_add_to_whitelist(
        env: Env,
        seller: Address,
        id: u64,
        principals: Vec<Address>,
    ) -> Result<u32, Error> {
        seller.require_auth();
        whitelist::batch_add(&env, &seller, id, &principals)
    }

    pub fn batch_remove_from_whitelist(
        env: Env,
        seller: Address,
        id: u64,
        principals: Vec<Address>,
    ) -> Result<u32, Error> {
        seller.require_auth();
        whitelist::batch_remove(&env, &seller, id, &principals)
    }

    pub fn is_whitelisted(env: Env, id: u64, principal: Address) -> bool {
        whitelist::is_whitelisted(&env, id, &principal)
    }

    pub fn whitelist_stats(env: Env, id: u64) -> Result<WhitelistStats, Error> {
        whitelist::stats(&env, id)
    }

    // ─────────────────────────────────────────────────────────
    // Automation
    // ─────────────────────────────────────────────────────────

    /// Scan up to `max_agreements` active agreements and trigger the ones whose
    /// price condition holds. `0` means the configured maximum.
    pub fn perform_upkeep(env: Env, max_agreements: u32) -> Result<UpkeepReport, Error> {
        automation::perform_upkeep(&env, max_agreements)
    }

    pub fn check_upkeep(env: Env) -> Result<UpkeepCheck, Error> {
        automation::check_upkeep(&env)
    }

    pub fn configure_automation(
        env: Env,
        caller: Address,
        enabled: bool,
        work_budget: u32,
        max_per_check: u32,
        check_interval: u64,
    ) -> Result<AutomationConfig, Error> {
        Self::require_operator(&env, &caller)?;
        automation::configure(&env, enabled, work_budget, max_per_check, check_interval)
    }

    pub fn set_automation_enabled(env: Env, caller: Address, enabled: bool) -> Result<(), Error> {
        Self::require_operator(&env, &caller)?;
        automation::set_enabled(&env, enabled)?;
        Ok(())
    }

    pub fn automation_status(env: Env) -> Result<AutomationConfig, Error> {
        storage::get_automation(&env)
    }

    // ─────────────────────────────────────────────────────────
    // Cross-domain replication
    // ─────────────────────────────────────────────────────────

    /// Whitelist `principals` locally, then replicate to every supported domain.
    ///
    /// Replication failures are queued for retry and never undo the local change.
    pub fn sync_whitelist_add(
        env: Env,
        seller: Address,
        id: u64,
        principals: Vec<Address>,
    ) -> Result<u32, Error> {
        seller.require_auth();
        let applied = whitelist::batch_add(&env, &seller, id, &principals)?;
        sync::dispatch(&env, id, WhitelistOp::Add, principals);
        Ok(applied)
    }

    pub fn sync_whitelist_remove(
        env: Env,
        seller: Address,
        id: u64,
        principals: Vec<Address>,
    ) -> Result<u32, Error> {
        seller.require_auth();
        let applied = whitelist::batch_remove(&env, &seller, id, &principals)?;
        sync::dispatch(&env, id, WhitelistOp::Remove, principals);
        Ok(applied)
    }

    /// Inbound delivery from the transport contract.
    pub fn receive_sync_message(
        env: Env,
        source_domain: u32,
        sender: Address,
        payload: Bytes,
    ) -> Result<u32, Error> {
        sync::receive(&env, source_domain, &sender, &payload)
    }

    /// Resend up to `max` queued outbound messages. Callable by anyone.
    pub fn retry_pending_sync(env: Env, max: u32) -> u32 {
        sync::retry_pending(&env, max)
    }

    pub fn set_transport(env: Env, caller: Address, transport: Address) -> Result<(), Error> {
        Self::require_operator(&env, &caller)?;
        sync::set_transport(&env, &transport);
        Ok(())
    }

    pub fn set_chain_receiver(
        env: Env,
        caller: Address,
        domain: u32,
        receiver: Address,
    ) -> Result<(), Error> {
        Self::require_operator(&env, &caller)?;
        sync::set_receiver(&env, domain, &receiver);
        Ok(())
    }

    pub fn add_supported_domain(env: Env, caller: Address, domain: u32) -> Result<(), Error> {
        Self::require_operator(&env, &caller)?;
        sync::add_domain(&env, domain);
        Ok(())
    }

    pub fn remove_supported_domain(env: Env, caller: Address, domain: u32) -> Result<(), Error> {
        Self::require_operator(&env, &caller)?;
        sync::remove_domain(&env, domain);
        Ok(())
    }

    pub fn set_source_domain_allowed(
        env: Env,
        caller: Address,
        domain: u32,
        allowed: bool,
    ) -> Result<(), Error> {
        Self::require_operator(&env, &caller)?;
        sync::set_source_allowed(&env, domain, allowed);
        Ok(())
    }

    pub fn set_sender_allowed(
        env: Env,
        caller: Address,
        sender: Address,
        allowed: bool,
    ) -> Result<(), Error> {
        Self::require_operator(&env, &caller)?;
        sync::set_sender_allowed(&env, &sender, allowed);
        Ok(())
    }

    pub fn sync_stats(env: Env) -> SyncStats {
        sync::stats(&env)
    }

    pub fn supported_domains(env: Env) -> Vec<u32> {
        sync::domains(&env)
    }

    pub fn pending_sync(env: Env) -> Vec<PendingSync> {
        sync::pending(&env)
    }

    pub fn pending_sync_count(env: Env) -> u32 {
        sync::pending_count(&env)
    }

    // ─────────────────────────────────────────────────────────
    // Internal Helpers
    // ─────────────────────────────────────────────────────────

    fn require_not_paused(env: &Env) -> Result<(), Error> {
        if storage::is_paused(env) {
            return Err(Error::ProtocolPaused);
        }
        Ok(())
    }

    fn require_operator(env: &Env, caller: &Address) -> Result<(), Error> {
        caller.require_auth();
        rbac::require_operator(env, caller)
    }

    fn recover(
        env: &Env,
        caller: &Address,
        asset: ReserveAsset,
        amount: i128,
        recipient: &Address,
    ) -> Result<(), Error> {
        Self::require_operator(env, caller)?;
        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }
        if *recipient == env.current_contract_address() {
            return Err(Error::InvalidPrincipal);
        }
        let ledger = ledger::AssetLedger::new(env, asset)?;
        if amount > ledger.held() {
            return Err(Error::InsufficientBalance);
        }
        ledger.refund(recipient, amount)?;
        events::emit_funds_recovered(env, asset, amount, recipient.clone());
        Ok(())
    }
}
