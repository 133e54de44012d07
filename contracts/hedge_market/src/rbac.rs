//! # RBAC: operator authorization
//!
//! Manages the three-role hierarchy that guards the administrative surface:
//!
//! ```text
//! SuperAdmin
//!     ├── Admin
//!     └── PriceFeeder
//! ```
//!
//! "Operator" means `SuperAdmin` or `Admin`. Operators configure automation,
//! the sync gateway, the oracle, pausing and emergency recovery. A
//! `PriceFeeder` may only set price overrides.
//!
//! Seller-scoped authorization (whitelists, withdrawals) is not a role; it is
//! checked against the agreement's `seller` by the owning module.
//!
//! ## Storage layout
//!
//! - `RbacKey::SuperAdmin` → `Address`, the one and only super-admin.
//! - `RbacKey::Role(addr)` → `Role`, the role held by `addr`, if any.
//!
//! ## Event emissions
//!
//! | Event topic prefix | Trigger |
//! |--------------------|---------|
//! | `role_set`         | Role granted or replaced |
//! | `role_del`         | Role revoked |
//!
//! ## Threat model notes
//!
//! - `Admin` cannot escalate to `SuperAdmin`.
//! - `SuperAdmin` cannot be removed via `revoke_role`; use `transfer_super_admin`.
//! - An address holds **at most one role** at a time.

use soroban_sdk::{contracttype, symbol_short, Address, Env, Symbol};

use crate::Error;

/// The set of roles that can be assigned to an address.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Role {
    /// Full control, including granting `SuperAdmin`.
    SuperAdmin,
    /// Operator: configuration, pausing, recovery, role management.
    Admin,
    /// May set and clear price overrides.
    PriceFeeder,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RbacKey {
    Role(Address),
    SuperAdmin,
}

fn store_role(env: &Env, address: &Address, role: &Role) {
    env.storage()
        .persistent()
        .set(&RbacKey::Role(address.clone()), role);
}

fn clear_role(env: &Env, address: &Address) {
    env.storage()
        .persistent()
        .remove(&RbacKey::Role(address.clone()));
}

/// Read the role for `address`, returning `None` if unassigned.
pub fn get_role(env: &Env, address: &Address) -> Option<Role> {
    env.storage()
        .persistent()
        .get(&RbacKey::Role(address.clone()))
}

pub fn get_super_admin(env: &Env) -> Option<Address> {
    env.storage().persistent().get(&RbacKey::SuperAdmin)
}

/// Set the initial SuperAdmin. Fails with `AlreadyInitialized` if one exists.
pub fn init_super_admin(env: &Env, super_admin: &Address) -> Result<(), Error> {
    if env.storage().persistent().has(&RbacKey::SuperAdmin) {
        return Err(Error::AlreadyInitialized);
    }
    env.storage()
        .persistent()
        .set(&RbacKey::SuperAdmin, super_admin);
    store_role(env, super_admin, &Role::SuperAdmin);
    emit(env, super_admin, &Role::SuperAdmin, None);
    Ok(())
}

/// Grant `role` to `target`.
///
/// - Only `SuperAdmin` can grant `SuperAdmin`; operators grant everything else.
/// - The SuperAdmin cannot be demoted through this path.
pub fn grant_role(env: &Env, caller: &Address, target: &Address, role: Role) -> Result<(), Error> {
    match role {
        Role::SuperAdmin => require_role(env, caller, &Role::SuperAdmin)?,
        _ => require_operator(env, caller)?,
    }

    if let Some(Role::SuperAdmin) = get_role(env, target) {
        if role != Role::SuperAdmin {
            return Err(Error::NotAuthorized);
        }
    }

    store_role(env, target, &role);
    emit(env, target, &role, Some(caller.clone()));
    Ok(())
}

/// Revoke any role from `target`. A target without a role is a no-op.
pub fn revoke_role(env: &Env, caller: &Address, target: &Address) -> Result<(), Error> {
    require_operator(env, caller)?;

    if get_super_admin(env).as_ref() == Some(target) {
        return Err(Error::NotAuthorized);
    }

    if get_role(env, target).is_some() {
        clear_role(env, target);
        emit_revoke(env, target, Some(caller.clone()));
    }
    Ok(())
}

/// Hand the SuperAdmin role to `new`; `current` loses it immediately.
pub fn transfer_super_admin(env: &Env, current: &Address, new: &Address) -> Result<(), Error> {
    require_role(env, current, &Role::SuperAdmin)?;

    clear_role(env, current);
    emit_revoke(env, current, Some(current.clone()));

    env.storage().persistent().set(&RbacKey::SuperAdmin, new);
    store_role(env, new, &Role::SuperAdmin);
    emit(env, new, &Role::SuperAdmin, Some(current.clone()));
    Ok(())
}

// ─────────────────────────────────────────────────────────
// Access guards
// ─────────────────────────────────────────────────────────

pub fn require_role(env: &Env, address: &Address, required: &Role) -> Result<(), Error> {
    match get_role(env, address) {
        Some(ref r) if r == required => Ok(()),
        _ => Err(Error::NotAuthorized),
    }
}

pub fn require_any_of(env: &Env, address: &Address, allowed: &[Role]) -> Result<(), Error> {
    match get_role(env, address) {
        Some(ref r) if allowed.contains(r) => Ok(()),
        _ => Err(Error::NotAuthorized),
    }
}

/// Assert that `address` is the SuperAdmin or an Admin.
#[inline]
pub fn require_operator(env: &Env, address: &Address) -> Result<(), Error> {
    require_any_of(env, address, &[Role::SuperAdmin, Role::Admin])
}

/// Operators and price feeders may move price overrides.
#[inline]
pub fn require_price_feeder(env: &Env, address: &Address) -> Result<(), Error> {
    require_any_of(
        env,
        address,
        &[Role::SuperAdmin, Role::Admin, Role::PriceFeeder],
    )
}

pub fn has_role(env: &Env, address: &Address, role: Role) -> bool {
    get_role(env, address).map(|r| r == role).unwrap_or(false)
}

// ─────────────────────────────────────────────────────────
// Internal helpers
// ─────────────────────────────────────────────────────────

/// Topic: `(role_set, target_address, role_symbol)`, data: `Option<caller>`.
fn emit(env: &Env, target: &Address, role: &Role, by: Option<Address>) {
    env.events().publish(
        (symbol_short!("role_set"), target.clone(), role_to_symbol(role)),
        by,
    );
}

fn emit_revoke(env: &Env, target: &Address, by: Option<Address>) {
    env.events()
        .publish((symbol_short!("role_del"), target.clone()), by);
}

fn role_to_symbol(role: &Role) -> Symbol {
    match role {
        Role::SuperAdmin => symbol_short!("supadmin"),
        Role::Admin => symbol_short!("admin"),
        Role::PriceFeeder => symbol_short!("feeder"),
    }
}
