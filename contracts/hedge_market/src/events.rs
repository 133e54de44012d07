use soroban_sdk::{contracttype, symbol_short, Address, Env, Symbol};

use crate::types::{ReserveAsset, UpkeepReport, WhitelistOp};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AgreementCreated {
    pub agreement_id: u64,
    pub seller: Address,
    pub trigger_token: Symbol,
    pub trigger_price: i128,
    pub reserve_asset: ReserveAsset,
    pub reserve_amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AgreementPurchased {
    pub agreement_id: u64,
    pub buyer: Address,
    pub fee: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AgreementTriggered {
    pub agreement_id: u64,
    pub price: i128,
    pub auto_executed: bool,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PayoutClaimed {
    pub agreement_id: u64,
    pub buyer: Address,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReserveWithdrawn {
    pub agreement_id: u64,
    pub seller: Address,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WhitelistChanged {
    pub agreement_id: u64,
    pub principal: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UpkeepFailure {
    pub agreement_id: u64,
    pub code: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SyncDispatched {
    pub domain: u32,
    pub message_id: u64,
    pub agreement_id: u64,
    pub op: WhitelistOp,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SyncQueued {
    pub domain: u32,
    pub seq: u64,
    pub attempts: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SyncApplied {
    pub source_domain: u32,
    pub sender: Address,
    pub agreement_id: u64,
    pub op: WhitelistOp,
    pub applied: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PriceSet {
    pub symbol: Symbol,
    pub price: i128,
    pub by: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FundsRecovered {
    pub asset: ReserveAsset,
    pub amount: i128,
    pub recipient: Address,
}

pub fn emit_agreement_created(env: &Env, data: AgreementCreated) {
    let topics = (symbol_short!("created"), data.agreement_id);
    env.events().publish(topics, data);
}

pub fn emit_agreement_purchased(env: &Env, agreement_id: u64, buyer: Address, fee: i128) {
    let topics = (symbol_short!("purchased"), agreement_id);
    let data = AgreementPurchased {
        agreement_id,
        buyer,
        fee,
    };
    env.events().publish(topics, data);
}

pub fn emit_agreement_triggered(env: &Env, agreement_id: u64, price: i128, auto_executed: bool) {
    let topics = (symbol_short!("triggered"), agreement_id);
    let data = AgreementTriggered {
        agreement_id,
        price,
        auto_executed,
    };
    env.events().publish(topics, data);
}

pub fn emit_payout_claimed(env: &Env, agreement_id: u64, buyer: Address, amount: i128) {
    let topics = (symbol_short!("claimed"), agreement_id);
    let data = PayoutClaimed {
        agreement_id,
        buyer,
        amount,
    };
    env.events().publish(topics, data);
}

pub fn emit_reserve_withdrawn(env: &Env, agreement_id: u64, seller: Address, amount: i128) {
    let topics = (symbol_short!("withdrawn"), agreement_id);
    let data = ReserveWithdrawn {
        agreement_id,
        seller,
        amount,
    };
    env.events().publish(topics, data);
}

pub fn emit_whitelist_added(env: &Env, agreement_id: u64, principal: Address) {
    let topics = (symbol_short!("wl_add"), agreement_id);
    env.events().publish(
        topics,
        WhitelistChanged {
            agreement_id,
            principal,
        },
    );
}

pub fn emit_whitelist_removed(env: &Env, agreement_id: u64, principal: Address) {
    let topics = (symbol_short!("wl_del"), agreement_id);
    env.events().publish(
        topics,
        WhitelistChanged {
            agreement_id,
            principal,
        },
    );
}

/// Topic: `(upkeep,)` on a completed scan, `(upk_skip,)` when disabled.
pub fn emit_upkeep(env: &Env, report: &UpkeepReport) {
    let topic = if report.skipped {
        symbol_short!("upk_skip")
    } else {
        symbol_short!("upkeep")
    };
    env.events().publish((topic,), report.clone());
}

pub fn emit_upkeep_failure(env: &Env, agreement_id: u64, code: u32) {
    let topics = (symbol_short!("upk_fail"), agreement_id);
    env.events().publish(topics, UpkeepFailure { agreement_id, code });
}

pub fn emit_sync_dispatched(env: &Env, data: SyncDispatched) {
    let topics = (symbol_short!("sync_out"), data.domain);
    env.events().publish(topics, data);
}

pub fn emit_sync_queued(env: &Env, domain: u32, seq: u64, attempts: u32) {
    let topics = (symbol_short!("sync_fail"), domain);
    env.events().publish(
        topics,
        SyncQueued {
            domain,
            seq,
            attempts,
        },
    );
}

pub fn emit_sync_dropped(env: &Env, domain: u32, seq: u64, attempts: u32) {
    let topics = (symbol_short!("sync_drop"), domain);
    env.events().publish(
        topics,
        SyncQueued {
            domain,
            seq,
            attempts,
        },
    );
}

pub fn emit_sync_applied(env: &Env, data: SyncApplied) {
    let topics = (symbol_short!("sync_in"), data.source_domain);
    env.events().publish(topics, data);
}

pub fn emit_price_set(env: &Env, symbol: Symbol, price: i128, by: Address) {
    let topics = (symbol_short!("price_set"), symbol.clone());
    env.events().publish(topics, PriceSet { symbol, price, by });
}

pub fn emit_funds_recovered(env: &Env, asset: ReserveAsset, amount: i128, recipient: Address) {
    let topics = (symbol_short!("recovered"),);
    env.events().publish(
        topics,
        FundsRecovered {
            asset,
            amount,
            recipient,
        },
    );
}

pub fn emit_protocol_paused(env: &Env, by: Address) {
    env.events().publish((symbol_short!("paused"),), by);
}

pub fn emit_protocol_unpaused(env: &Env, by: Address) {
    env.events().publish((symbol_short!("unpaused"),), by);
}
