//! # Types
//!
//! Shared data structures used across all modules of the hedge market.
//!
//! ## Design decisions
//!
//! ### Terms / State split
//!
//! An `Agreement` is internally stored as two separate ledger entries:
//!
//! - [`AgreementTerms`]: written once at creation; never mutated.
//! - [`AgreementState`]: written on purchase, trigger, claim and withdrawal.
//!
//! The public API exposes the reconstructed [`Agreement`] struct for convenience.
//!
//! ### Lifecycle
//!
//! ```text
//! Created ──► Purchased ──► Triggered ──► Claimed
//!    │            │
//!    │            └──► (expired, untriggered) ──► Withdrawn
//!    └──► Withdrawn (never purchased)
//! ```
//!
//! Each status flag only ever moves from `false` to `true`, except `active`
//! which is cleared when the reserve goes back to the seller.

use soroban_sdk::{contracttype, Address, Bytes, Symbol, Vec};

/// Which of the two configured token contracts backs an agreement.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReserveAsset {
    /// The ledger's native asset, attached to the creating call.
    Native,
    /// The secondary fungible token, pulled through a prior allowance.
    Fungible,
}

/// Caller-supplied parameters for `create_agreement`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AgreementParams {
    /// Symbol of the monitored reference asset (e.g. `ETH`).
    pub trigger_token: Symbol,
    /// Price threshold, in the oracle's fixed-point scale (1e8).
    pub trigger_price: i128,
    pub start_date: u64,
    pub end_date: u64,
    pub reserve_asset: ReserveAsset,
    pub reserve_amount: i128,
    pub insurance_fee: i128,
    /// Pay the reserve out in the same call that triggers.
    pub auto_execute: bool,
    /// Gate `purchase` on whitelist membership.
    pub whitelist_enabled: bool,
}

/// Immutable agreement terms, written once at creation.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AgreementTerms {
    pub id: u64,
    pub seller: Address,
    pub trigger_token: Symbol,
    pub trigger_price: i128,
    pub start_date: u64,
    pub end_date: u64,
    pub reserve_asset: ReserveAsset,
    pub reserve_amount: i128,
    pub insurance_fee: i128,
    pub auto_execute: bool,
    pub whitelist_enabled: bool,
}

/// Mutable agreement state.
///
/// Kept small so the frequent lifecycle writes stay cheap.
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AgreementState {
    pub buyer: Option<Address>,
    /// Purchased and the reserve has not been returned.
    pub active: bool,
    pub triggered: bool,
    pub claimed: bool,
    pub reserve_withdrawn: bool,
}

/// Full representation of an insurance agreement.
///
/// Used as the public API return type; reconstructed internally from
/// the split `AgreementTerms` + `AgreementState` storage entries.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Agreement {
    /// Sequential unique ID, starting at 0.
    pub id: u64,
    /// Address that posted the reserve and receives the fee.
    pub seller: Address,
    /// Beneficiary, set once at purchase.
    pub buyer: Option<Address>,
    pub trigger_token: Symbol,
    pub trigger_price: i128,
    pub start_date: u64,
    pub end_date: u64,
    pub reserve_asset: ReserveAsset,
    pub reserve_amount: i128,
    pub insurance_fee: i128,
    pub auto_execute: bool,
    pub whitelist_enabled: bool,
    pub active: bool,
    pub triggered: bool,
    pub claimed: bool,
    pub reserve_withdrawn: bool,
}

impl Agreement {
    pub fn from_parts(terms: AgreementTerms, state: AgreementState) -> Self {
        Agreement {
            id: terms.id,
            seller: terms.seller,
            buyer: state.buyer,
            trigger_token: terms.trigger_token,
            trigger_price: terms.trigger_price,
            start_date: terms.start_date,
            end_date: terms.end_date,
            reserve_asset: terms.reserve_asset,
            reserve_amount: terms.reserve_amount,
            insurance_fee: terms.insurance_fee,
            auto_execute: terms.auto_execute,
            whitelist_enabled: terms.whitelist_enabled,
            active: state.active,
            triggered: state.triggered,
            claimed: state.claimed,
            reserve_withdrawn: state.reserve_withdrawn,
        }
    }
}

/// Whitelist summary for one agreement.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WhitelistStats {
    pub agreement_id: u64,
    pub count: u32,
    pub enabled: bool,
}

/// Process-wide automation settings plus the last completed scan time.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AutomationConfig {
    pub enabled: bool,
    /// Maximum trigger executions per `perform_upkeep` call.
    pub work_budget_per_check: u32,
    /// Maximum agreements examined per `perform_upkeep` call.
    pub max_agreements_per_check: u32,
    pub check_interval_seconds: u64,
    pub last_global_check: u64,
}

/// Outcome of one `perform_upkeep` call.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UpkeepReport {
    pub scanned: u32,
    pub triggered: u32,
    pub failed: u32,
    /// Automation was disabled; nothing was scanned.
    pub skipped: bool,
    pub timestamp: u64,
}

/// Result of the read-only `check_upkeep` dry run.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UpkeepCheck {
    pub needed: bool,
    pub ids: Vec<u64>,
}

/// Whitelist mutation carried by a replication message.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WhitelistOp {
    Add,
    Remove,
}

/// Replication payload, XDR-encoded on the wire.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SyncMessage {
    pub agreement_id: u64,
    pub op: WhitelistOp,
    pub principals: Vec<Address>,
}

/// An outbound message waiting for a successful dispatch.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PendingSync {
    pub seq: u64,
    pub domain: u32,
    pub agreement_id: u64,
    pub op: WhitelistOp,
    pub payload: Bytes,
    pub attempts: u32,
}

/// Replication counters.
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SyncStats {
    pub messages_sent: u64,
    pub messages_received: u64,
    pub messages_failed: u64,
    pub messages_dropped: u64,
}
