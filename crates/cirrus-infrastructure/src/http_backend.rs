//! HTTP implementation of the presence and account ports.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cirrus_core::backend::{Account, AccountApi, PresenceApi};
use cirrus_core::config::BackendConfig;
use cirrus_core::error::{CirrusError, Result};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

const LAST_ACTIVE_PATH: &str = "/v3/user/lastActive/desktop";
const ACCOUNT_PATH: &str = "/v3/user/account";

/// Gateway response envelope: `{"status": bool, "message": "...", "data": ...}`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    status: bool,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

pub struct HttpBackend {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| CirrusError::config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        match &self.api_key {
            Some(key) if !key.is_empty() => Ok(request.bearer_auth(key)),
            // Phrased like the gateway's own rejection so the watchdog treats it alike.
            _ => Err(CirrusError::http(401, "Missing API key")),
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = self
            .authorize(request)?
            .send()
            .await
            .map_err(|e| CirrusError::network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(CirrusError::http(status.as_u16(), error_message(&body, status.as_str())))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Option<T>> {
        let response = self.send(request).await?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| CirrusError::network(e.to_string()))?;
        parse_envelope(status, &body)
    }
}

#[async_trait]
impl PresenceApi for HttpBackend {
    async fn report_presence(&self, timestamp: DateTime<Utc>) -> Result<()> {
        let request = self
            .client
            .post(self.url(LAST_ACTIVE_PATH))
            .json(&json!({ "timestamp": timestamp.timestamp_millis() }));
        self.send_json::<serde_json::Value>(request).await?;
        Ok(())
    }
}

#[async_trait]
impl AccountApi for HttpBackend {
    async fn fetch_account(&self) -> Result<Account> {
        let request = self.client.get(self.url(ACCOUNT_PATH));
        self.send_json::<Account>(request)
            .await?
            .ok_or_else(|| CirrusError::http(200, "Account response carried no data"))
    }
}

/// Extracts the gateway `message` from an error body, falling back to the
/// raw body or the status text.
fn error_message(body: &str, status: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<Envelope<serde_json::Value>>(body)
        && !envelope.message.is_empty()
    {
        return envelope.message;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status.to_string()
    } else {
        trimmed.to_string()
    }
}

fn parse_envelope<T: DeserializeOwned>(status: u16, body: &str) -> Result<Option<T>> {
    let envelope: Envelope<T> = serde_json::from_str(body)?;
    if !envelope.status {
        return Err(CirrusError::http(status, envelope.message));
    }
    Ok(envelope.data)
}
