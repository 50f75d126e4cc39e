//! Sync metrics

use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, IntCounter, IntCounterVec,
    IntGauge,
};

lazy_static::lazy_static! {
    pub static ref SYNC_CYCLES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "bank_sync_cycles_total",
        "Reconciliation cycles by outcome",
        &["outcome"]
    )
    .unwrap();

    pub static ref TRANSACTIONS_POSTED_TOTAL: IntCounter = register_int_counter!(
        "bank_sync_transactions_posted_total",
        "Transactions posted to the destination"
    )
    .unwrap();

    pub static ref FETCH_FAILURES_TOTAL: IntCounter = register_int_counter!(
        "bank_sync_fetch_failures_total",
        "Per-account transaction fetch failures"
    )
    .unwrap();

    pub static ref LEDGER_ENTRIES: IntGauge = register_int_gauge!(
        "bank_sync_ledger_entries",
        "Entries in the committed dedup ledger"
    )
    .unwrap();
}
