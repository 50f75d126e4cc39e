//! Mercury source bank adapter

use crate::{connector::SourceBank, transport::HttpTransport, types::*, Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Deserialize;
use tracing::{debug, warn};

const SERVICE: &str = "Mercury";

#[derive(Debug, Deserialize)]
struct AccountsResponse {
    accounts: Vec<Account>,
}

// Rows are decoded one at a time so a malformed row can't sink the whole feed
#[derive(Debug, Deserialize)]
struct TransactionsResponse {
    transactions: Vec<serde_json::Value>,
}

/// Mercury API client
pub struct MercuryClient {
    base_url: String,
    headers: HeaderMap,
    transport: HttpTransport,
}

impl MercuryClient {
    /// Create new Mercury client
    pub fn new(base_url: &str, api_key: &str, transport: HttpTransport) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| Error::Config(format!("invalid Mercury API key: {}", e)))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            headers,
            transport,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl SourceBank for MercuryClient {
    async fn list_accounts(&self) -> Result<Vec<Account>> {
        debug!("Fetching Mercury accounts");

        let res: AccountsResponse = self
            .transport
            .get_json(SERVICE, &self.url("/accounts"), &self.headers)
            .await?;
        Ok(res.accounts)
    }

    async fn list_transactions(
        &self,
        account: &Account,
        since: DateTime<Utc>,
    ) -> Result<Vec<Transaction>> {
        let start = since.to_rfc3339_opts(SecondsFormat::Secs, true);
        debug!(account = %account.display_name, since = %start, "Fetching Mercury transactions");

        // status=sent restricts the feed to settled transactions
        let url = self.url(&format!(
            "/account/{}/transactions?status=sent&start={}",
            account.id, start
        ));
        let res: TransactionsResponse = self.transport.get_json(SERVICE, &url, &self.headers).await?;

        let mut transactions = Vec::with_capacity(res.transactions.len());
        for row in res.transactions {
            match Transaction::deserialize(&row) {
                Ok(tx) => transactions.push(tx),
                Err(e) => warn!(
                    account = %account.display_name,
                    id = row.get("id").and_then(|v| v.as_str()).unwrap_or("<missing>"),
                    error = %e,
                    "Skipping malformed Mercury transaction"
                ),
            }
        }
        Ok(transactions)
    }

    fn name(&self) -> &str {
        SERVICE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;
    use chrono::TimeZone;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> MercuryClient {
        let transport = HttpTransport::new(&HttpConfig {
            max_retries: 0,
            ..HttpConfig::default()
        })
        .unwrap();
        MercuryClient::new(&server.uri(), "secret-token", transport).unwrap()
    }

    #[tokio::test]
    async fn test_list_accounts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/accounts"))
            .and(header("Authorization", "Bearer secret-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "accounts": [
                    {"id": "acc-1", "name": "Checking", "status": "active"},
                    {"id": "acc-2", "name": "Savings", "status": "active"}
                ]
            })))
            .mount(&server)
            .await;

        let accounts = client(&server).list_accounts().await.unwrap();

        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].id, "acc-1");
        assert_eq!(accounts[1].display_name, "Savings");
    }

    #[tokio::test]
    async fn test_list_transactions_requests_settled_since() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/account/acc-1/transactions"))
            .and(query_param("status", "sent"))
            .and(query_param("start", "2024-03-08T12:00:00Z"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total": 2,
                "transactions": [
                    {"id": "tx-1", "amount": 125.5, "bankDescription": "Stripe payout", "postedAt": "2024-03-10T09:00:00Z"},
                    {"id": "tx-2", "amount": -40.0, "bankDescription": "AWS", "postedAt": "2024-03-11T09:00:00Z"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let account = Account {
            id: "acc-1".to_string(),
            display_name: "Checking".to_string(),
        };
        let since = Utc.with_ymd_and_hms(2024, 3, 8, 12, 0, 0).unwrap();
        let txs = client(&server).list_transactions(&account, since).await.unwrap();

        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].id, "tx-1");
        assert_eq!(txs[1].description.as_deref(), Some("AWS"));
    }

    #[tokio::test]
    async fn test_null_fields_do_not_drop_the_feed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/account/acc-1/transactions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "transactions": [
                    {"id": "tx-ok", "amount": 10.0, "bankDescription": "Stripe", "postedAt": "2024-03-10T09:00:00Z"},
                    {"id": "tx-null", "amount": -5.0, "bankDescription": null, "postedAt": "2024-03-10T10:00:00Z"},
                    {"id": "tx-undated", "amount": -1.0, "bankDescription": "Fee", "postedAt": null}
                ]
            })))
            .mount(&server)
            .await;

        let account = Account {
            id: "acc-1".to_string(),
            display_name: "Checking".to_string(),
        };
        let since = Utc.with_ymd_and_hms(2024, 3, 8, 12, 0, 0).unwrap();
        let txs = client(&server).list_transactions(&account, since).await.unwrap();

        // Null description is kept; a row without a posting date is skipped
        let ids: Vec<&str> = txs.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["tx-ok", "tx-null"]);
        assert_eq!(txs[1].description, None);
    }

    #[tokio::test]
    async fn test_unauthorized_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .mount(&server)
            .await;

        let result = client(&server).list_accounts().await;
        assert!(matches!(result, Err(Error::Api { status: 401, .. })));
    }
}
