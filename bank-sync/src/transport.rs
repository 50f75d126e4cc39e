//! Retry-capable JSON transport shared by the API adapters

use crate::config::HttpConfig;
use crate::retry::{RetryConfig, RetryStrategy};
use crate::{Error, Result};
use reqwest::header::HeaderMap;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// HTTP transport: one pooled client plus a bounded retry budget.
///
/// Built once at startup and handed to each adapter.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    retry: RetryStrategy,
}

impl HttpTransport {
    /// Create transport from config
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            retry: RetryStrategy::new(RetryConfig::from(config)),
        })
    }

    /// Create transport from parts
    pub fn with_client(client: Client, retry: RetryStrategy) -> Self {
        Self { client, retry }
    }

    /// GET `url` and decode the JSON body
    pub async fn get_json<T>(&self, service: &'static str, url: &str, headers: &HeaderMap) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let client = &self.client;
        self.retry
            .execute_with_retry(
                move || async move {
                    debug!(service, method = "GET", url, "API request");
                    let response = client.get(url).headers(headers.clone()).send().await?;
                    decode(service, response).await
                },
                url,
            )
            .await
    }

    /// POST `body` as JSON to `url` and decode the JSON body
    pub async fn post_json<B, T>(
        &self,
        service: &'static str,
        url: &str,
        headers: &HeaderMap,
        body: &B,
    ) -> Result<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let client = &self.client;
        self.retry
            .execute_with_retry(
                move || async move {
                    debug!(service, method = "POST", url, "API request");
                    let response = client
                        .post(url)
                        .headers(headers.clone())
                        .json(body)
                        .send()
                        .await?;
                    decode(service, response).await
                },
                url,
            )
            .await
    }
}

async fn decode<T: DeserializeOwned>(service: &'static str, response: Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(Error::Api {
            service,
            status: status.as_u16(),
            body,
        });
    }

    debug!(service, status = status.as_u16(), body = %body, "API response");
    Ok(serde_json::from_str(&body)?)
}
