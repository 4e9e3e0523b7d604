//! # Currency Client SDK
//!
//! A typed Rust client for the currency converter API.

use std::time::Duration;

use fx_types::{ConvertRequest, ConvertResponse, OutputFormat};
use reqwest::{Client, RequestBuilder};

/// Error type for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Currency converter API client.
pub struct CurrencyClient {
    base_url: String,
    timeout: Option<Duration>,
    http: Client,
}

impl CurrencyClient {
    /// Creates a new client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: None,
            http: Client::new(),
        }
    }

    /// Bounds every request, including reading the body.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Checks if the API is healthy.
    pub async fn health(&self) -> Result<bool, ClientError> {
        let resp = self
            .request(self.http.get(format!("{}/health", self.base_url)))
            .send()
            .await?;
        Ok(resp.status().is_success())
    }

    /// Converts `quantity` of `from` into `to`.
    pub async fn convert(
        &self,
        from: &str,
        to: &str,
        quantity: f64,
    ) -> Result<ConvertResponse, ClientError> {
        let resp = self.send_convert(from, to, quantity, OutputFormat::Json).await?;
        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Same as [`convert`](Self::convert), returning the server's plain-text
    /// rendering.
    pub async fn convert_text(
        &self,
        from: &str,
        to: &str,
        quantity: f64,
    ) -> Result<String, ClientError> {
        let resp = self.send_convert(from, to, quantity, OutputFormat::Text).await?;
        Ok(resp.text().await?)
    }

    async fn send_convert(
        &self,
        from: &str,
        to: &str,
        quantity: f64,
        format: OutputFormat,
    ) -> Result<reqwest::Response, ClientError> {
        let req = ConvertRequest {
            currency_from: from.to_string(),
            currency_to: to.to_string(),
            quantity,
        };
        let resp = self
            .request(self.http.post(format!("{}/convert", self.base_url)))
            .query(&[("format", format)])
            .json(&req)
            .send()
            .await?;
        check_status(resp).await
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        }
    }
}

/// Turns a non-success response into `ClientError::Api`.
///
/// Error bodies are plain text, except the rate limiter's JSON
/// `{"error": ...}`.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
        .unwrap_or(body);
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}
