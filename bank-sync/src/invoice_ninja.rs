//! Invoice Ninja destination adapter

use crate::{connector::Destination, transport::HttpTransport, types::*, Error, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use tracing::debug;

const SERVICE: &str = "InvoiceNinja";

#[derive(Debug, Deserialize)]
struct IntegrationsResponse {
    data: Vec<BankIntegration>,
}

/// Invoice Ninja API client
pub struct InvoiceNinjaClient {
    api_url: String,
    headers: HeaderMap,
    transport: HttpTransport,
}

impl InvoiceNinjaClient {
    /// Create new client for the instance at `base_url`
    pub fn new(base_url: &str, token: &str, transport: HttpTransport) -> Result<Self> {
        let mut token = HeaderValue::from_str(token)
            .map_err(|e| Error::Config(format!("invalid InvoiceNinja token: {}", e)))?;
        token.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static("x-api-token"), token);
        headers.insert(
            HeaderName::from_static("x-requested-with"),
            HeaderValue::from_static("XMLHttpRequest"),
        );

        Ok(Self {
            api_url: format!("{}/api/v1", base_url.trim_end_matches('/')),
            headers,
            transport,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }
}

#[async_trait]
impl Destination for InvoiceNinjaClient {
    async fn list_integrations(&self) -> Result<Vec<BankIntegration>> {
        debug!("Fetching InvoiceNinja bank integrations");

        let res: IntegrationsResponse = self
            .transport
            .get_json(SERVICE, &self.url("/bank_integrations"), &self.headers)
            .await?;
        Ok(res.data)
    }

    async fn post_transaction(&self, request: &BankTransactionRequest) -> Result<()> {
        debug!(
            amount = %request.amount,
            base_type = %request.base_type,
            description = %request.description,
            "Creating InvoiceNinja bank transaction"
        );

        let _: serde_json::Value = self
            .transport
            .post_json(SERVICE, &self.url("/bank_transactions"), &self.headers, request)
            .await?;
        Ok(())
    }

    fn name(&self) -> &str {
        SERVICE
    }
}
