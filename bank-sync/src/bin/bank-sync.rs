//! Bank sync service binary

use anyhow::Context;
use bank_sync::invoice_ninja::InvoiceNinjaClient;
use bank_sync::mercury::MercuryClient;
use bank_sync::transport::HttpTransport;
use bank_sync::{Config, LedgerStore, SyncEngine, SyncScheduler, SyncSettings};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("Error loading configuration")?;

    init_tracing(&config.log_level);
    tracing::info!("Starting bank sync");

    // One transport for both APIs
    let transport = HttpTransport::new(&config.http).context("Error building HTTP client")?;
    let source = MercuryClient::new(&config.mercury_base_url, &config.mercury_api_key, transport.clone())?;
    let destination =
        InvoiceNinjaClient::new(&config.invoice_ninja_url, &config.invoice_ninja_token, transport)?;

    let mut engine = SyncEngine::bootstrap(
        Arc::new(source),
        Arc::new(destination),
        LedgerStore::new(config.ledger_path()),
        &config.bank_provider,
        SyncSettings::from(&config),
    )
    .await
    .context("Error initializing sync engine")?;

    let scheduler = SyncScheduler::new(config.sync_interval());
    scheduler
        .run_until(&mut engine, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;

    tracing::info!("Shutting down bank sync");
    Ok(())
}

/// `RUST_LOG` wins; otherwise the configured level
fn init_tracing(log_level: &str) {
    let level = match log_level.to_lowercase().as_str() {
        "debug" => tracing::Level::DEBUG,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
