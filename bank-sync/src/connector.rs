//! Source and destination connector interfaces

use crate::{types::*, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Source bank: account directory and settled transaction feed
#[async_trait]
pub trait SourceBank: Send + Sync {
    /// List accounts to poll
    async fn list_accounts(&self) -> Result<Vec<Account>>;

    /// List settled transactions posted since `since`, in source order
    async fn list_transactions(
        &self,
        account: &Account,
        since: DateTime<Utc>,
    ) -> Result<Vec<Transaction>>;

    /// Get connector name
    fn name(&self) -> &str;
}

/// Destination accounting system
#[async_trait]
pub trait Destination: Send + Sync {
    /// List bank integrations
    async fn list_integrations(&self) -> Result<Vec<BankIntegration>>;

    /// Post one bank transaction
    async fn post_transaction(&self, request: &BankTransactionRequest) -> Result<()>;

    /// Get connector name
    fn name(&self) -> &str;

    /// Resolve the route for `provider`: first integration with that provider name
    async fn resolve_route(&self, provider: &str) -> Result<DestinationRoute> {
        self.list_integrations()
            .await?
            .into_iter()
            .find(|ig| ig.provider_name == provider)
            .map(|ig| DestinationRoute { id: ig.id })
            .ok_or_else(|| crate::Error::RouteNotFound(provider.to_string()))
    }
}
