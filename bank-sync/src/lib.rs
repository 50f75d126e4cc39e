//! Bank Sync
//!
//! Periodically forwards settled transactions from a source bank API
//! (Mercury) to a destination accounting API (Invoice Ninja), posting each
//! transaction once despite polling overlapping time windows.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────┐     ┌──────────────────────────────────┐
//! │ SyncScheduler  │────▶│            SyncEngine            │
//! └────────────────┘     │  prune ▶ fetch ▶ dedup ▶ post    │
//!                        └──┬──────────────┬─────────────┬──┘
//!                           │              │             │
//!                    ┌──────▼─────┐ ┌──────▼──────┐ ┌────▼────────┐
//!                    │ SourceBank │ │ Destination │ │ LedgerStore │
//!                    │ (Mercury)  │ │ (Inv.Ninja) │ │   (JSON)    │
//!                    └──────┬─────┘ └──────┬──────┘ └─────────────┘
//!                           └──────┬───────┘
//!                           ┌──────▼────────┐
//!                           │ HttpTransport │
//!                           └───────────────┘
//! ```
//!
//! # Invariants
//!
//! - A ledger entry exists only for a transaction the destination accepted
//! - A failed post aborts the cycle; nothing from that cycle is persisted
//! - Ledger entries are pruned after the retention window, which is never
//!   shorter than the source lookback window
//! - One cycle runs at a time; the ledger has a single owner

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod config;
pub mod connector;
pub mod dedup;
pub mod error;
pub mod invoice_ninja;
pub mod mercury;
pub mod metrics;
pub mod retry;
pub mod scheduler;
pub mod sync;
pub mod transport;
pub mod types;

// Re-exports
pub use config::Config;
pub use connector::{Destination, SourceBank};
pub use dedup::{DedupLedger, LedgerStore};
pub use error::{Error, Result};
pub use scheduler::{CycleRunner, SyncScheduler};
pub use sync::{CycleReport, SyncEngine, SyncSettings};
pub use types::*;
