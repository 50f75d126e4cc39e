//! Reconciliation loop: forward new source transactions to the destination
//!
//! One cycle prunes a working copy of the ledger, polls every account,
//! posts transactions the ledger has not seen and persists the copy. The
//! copy becomes the committed ledger only once it is on disk, so an aborted
//! cycle is replayed in full by the next one.

use crate::config::Config;
use crate::connector::{Destination, SourceBank};
use crate::dedup::{DedupLedger, LedgerStore};
use crate::metrics::{
    FETCH_FAILURES_TOTAL, LEDGER_ENTRIES, SYNC_CYCLES_TOTAL, TRANSACTIONS_POSTED_TOTAL,
};
use crate::types::{Account, BankTransactionRequest, DestinationRoute};
use crate::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Time windows used by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    /// Trailing window of source transactions fetched each cycle
    pub lookback: Duration,
    /// Trailing window a ledger entry is kept; not shorter than `lookback`
    pub retention: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            lookback: Duration::days(7),
            retention: Duration::days(7),
        }
    }
}

impl From<&Config> for SyncSettings {
    fn from(config: &Config) -> Self {
        Self {
            lookback: config.lookback(),
            retention: config.retention(),
        }
    }
}

/// Outcome of one completed cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Accounts fetched successfully
    pub accounts_polled: usize,
    /// Accounts skipped after a fetch failure
    pub accounts_failed: usize,
    /// Transactions returned by the source
    pub fetched: usize,
    /// Transactions already in the ledger
    pub skipped: usize,
    /// Transactions posted this cycle
    pub posted: usize,
    /// Ledger entries dropped by retention
    pub pruned: usize,
}

/// The reconciliation engine; sole owner of the dedup ledger
pub struct SyncEngine {
    source: Arc<dyn SourceBank>,
    destination: Arc<dyn Destination>,
    route: DestinationRoute,
    accounts: Vec<Account>,
    store: LedgerStore,
    ledger: DedupLedger,
    settings: SyncSettings,
}

impl SyncEngine {
    /// Create engine from already-resolved parts
    pub fn new(
        source: Arc<dyn SourceBank>,
        destination: Arc<dyn Destination>,
        route: DestinationRoute,
        accounts: Vec<Account>,
        store: LedgerStore,
        ledger: DedupLedger,
        settings: SyncSettings,
    ) -> Self {
        LEDGER_ENTRIES.set(ledger.len() as i64);
        Self {
            source,
            destination,
            route,
            accounts,
            store,
            ledger,
            settings,
        }
    }

    /// Load the ledger, resolve the destination route and the account list.
    ///
    /// Any failure here is fatal for the process.
    pub async fn bootstrap(
        source: Arc<dyn SourceBank>,
        destination: Arc<dyn Destination>,
        store: LedgerStore,
        provider: &str,
        settings: SyncSettings,
    ) -> Result<Self> {
        let ledger = store.load()?;
        info!(entries = ledger.len(), path = %store.path().display(), "Ledger loaded");

        let route = destination.resolve_route(provider).await?;
        info!(provider, route = %route.id, "Resolved {} bank integration", destination.name());

        let accounts = source.list_accounts().await?;
        info!(count = accounts.len(), "Resolved {} accounts", source.name());

        Ok(Self::new(
            source,
            destination,
            route,
            accounts,
            store,
            ledger,
            settings,
        ))
    }

    /// Committed ledger (last successfully persisted state)
    pub fn ledger(&self) -> &DedupLedger {
        &self.ledger
    }

    /// Accounts polled each cycle
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    /// Run one cycle now
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        self.run_cycle_at(Utc::now()).await
    }

    /// Run one cycle as of `now`
    pub async fn run_cycle_at(&mut self, now: DateTime<Utc>) -> Result<CycleReport> {
        let result = self.reconcile(now).await;

        let outcome = match &result {
            Ok(_) => "completed",
            Err(Error::Persist { .. }) => "persist_failed",
            Err(_) => "aborted",
        };
        SYNC_CYCLES_TOTAL.with_label_values(&[outcome]).inc();

        result
    }

    async fn reconcile(&mut self, now: DateTime<Utc>) -> Result<CycleReport> {
        let mut working = self.ledger.pruned(now, self.settings.retention);
        let mut report = CycleReport {
            pruned: self.ledger.len() - working.len(),
            ..CycleReport::default()
        };
        if report.pruned > 0 {
            debug!(pruned = report.pruned, "Pruned expired ledger entries");
        }

        let since = now - self.settings.lookback;

        for account in &self.accounts {
            debug!(account = %account.display_name, "Processing account");

            let transactions = match self.source.list_transactions(account, since).await {
                Ok(transactions) => transactions,
                Err(e) => {
                    // Deferred to the next cycle; the lookback window still covers it
                    error!(account = %account.display_name, error = %e, "Error fetching transactions");
                    FETCH_FAILURES_TOTAL.inc();
                    report.accounts_failed += 1;
                    continue;
                }
            };
            report.accounts_polled += 1;
            report.fetched += transactions.len();

            let mut posted = 0;
            for tx in &transactions {
                if working.contains(&tx.id) {
                    debug!(transaction_id = %tx.id, "Skipping already processed transaction");
                    report.skipped += 1;
                    continue;
                }

                let request = BankTransactionRequest::from_transaction(tx, &self.route);
                if let Err(e) = self.destination.post_transaction(&request).await {
                    error!(
                        account = %account.display_name,
                        transaction_id = %tx.id,
                        error = %e,
                        "Error posting transaction, aborting cycle"
                    );
                    return Err(Error::Post {
                        account: account.display_name.clone(),
                        transaction_id: tx.id.clone(),
                        source: Box::new(e),
                    });
                }

                working.record(tx.id.clone(), now);
                TRANSACTIONS_POSTED_TOTAL.inc();
                posted += 1;
            }

            if posted > 0 {
                info!(account = %account.display_name, transactions = posted, "Account sync completed");
            }
            report.posted += posted;
        }

        self.store.persist(&working)?;
        self.ledger = working;
        LEDGER_ENTRIES.set(self.ledger.len() as i64);

        debug!(
            posted = report.posted,
            skipped = report.skipped,
            accounts_failed = report.accounts_failed,
            "Sync completed"
        );
        Ok(report)
    }
}
