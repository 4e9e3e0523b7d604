//! Chart-style market-data API fetcher with retry and endpoint failover.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use fx_types::{CancellationToken, CurrencyPair, FetchError, RateFetcher};

use crate::backoff::Backoff;

pub const DEFAULT_PRIMARY_URL: &str = "https://query1.finance.yahoo.com/v7/finance/chart";
pub const DEFAULT_SECONDARY_URL: &str = "https://query2.finance.yahoo.com/v7/finance/chart";

// The upstream blocks obvious non-browser clients.
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:112.0) Gecko/20100101 Firefox/112.0";

/// Endpoint and retry settings for [`ChartFetcher`].
#[derive(Debug, Clone)]
pub struct ChartFetcherConfig {
    /// Tried first.
    pub primary_url: Url,
    /// Tried once the primary is exhausted or rejects the request.
    pub secondary_url: Url,
    /// Attempts per endpoint for rate-limit and transport failures.
    pub max_retries: u32,
    /// First backoff delay; doubles after every retry.
    pub base_backoff: Duration,
    /// Upper bound for a single HTTP attempt, body included.
    pub request_timeout: Duration,
}

impl ChartFetcherConfig {
    pub fn new(primary_url: Url, secondary_url: Url) -> Self {
        Self {
            primary_url,
            secondary_url,
            max_retries: 2,
            base_backoff: Duration::from_millis(500),
            request_timeout: Duration::from_secs(2),
        }
    }
}

impl Default for ChartFetcherConfig {
    fn default() -> Self {
        Self::new(
            Url::parse(DEFAULT_PRIMARY_URL).expect("default primary URL is valid"),
            Url::parse(DEFAULT_SECONDARY_URL).expect("default secondary URL is valid"),
        )
    }
}

// Only the fields we read; everything else in the payload is ignored.
#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: f64,
}

/// Fetches the current market price of `{FROM}{TO}=X` from a chart API.
pub struct ChartFetcher {
    config: ChartFetcherConfig,
    http: Client,
}

impl ChartFetcher {
    pub fn new(config: ChartFetcherConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    /// Tries one endpoint, retrying retryable failures with backoff.
    async fn fetch_from_endpoint(
        &self,
        cancel: &CancellationToken,
        base: &Url,
        pair: &CurrencyPair,
    ) -> Result<f64, FetchError> {
        let url = chart_url(base, pair)?;
        let max_attempts = self.config.max_retries.max(1);
        let mut backoff = Backoff::new(self.config.base_backoff);
        let mut attempt = 1;

        loop {
            match self.attempt(cancel, &url).await {
                Ok(price) => return Ok(price),
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    warn!(endpoint = %base, attempt, error = %err, "Retrying after backoff");
                    backoff.wait(cancel).await?;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// A single HTTP round trip, raced against cancellation.
    async fn attempt(&self, cancel: &CancellationToken, url: &Url) -> Result<f64, FetchError> {
        let request = self
            .http
            .get(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .timeout(self.config.request_timeout);

        let exchange = async {
            let response = request.send().await.map_err(transport)?;
            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(FetchError::RateLimited);
            }
            if !status.is_success() {
                return Err(FetchError::UpstreamRejected {
                    status: status.as_u16(),
                });
            }
            let body = response.bytes().await.map_err(transport)?;
            parse_price(&body)
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            result = exchange => result,
        }
    }
}

#[async_trait]
impl RateFetcher for ChartFetcher {
    #[instrument(skip(self, cancel), fields(pair = %pair))]
    async fn fetch_rate(
        &self,
        cancel: &CancellationToken,
        pair: &CurrencyPair,
    ) -> Result<f64, FetchError> {
        let mut last = None;

        for base in [&self.config.primary_url, &self.config.secondary_url] {
            match self.fetch_from_endpoint(cancel, base, pair).await {
                Ok(price) => {
                    debug!(endpoint = %base, price, "Fetched rate");
                    return Ok(price);
                }
                Err(FetchError::Cancelled) => return Err(FetchError::Cancelled),
                Err(err) => {
                    warn!(endpoint = %base, error = %err, "Endpoint failed, failing over");
                    last = Some(err);
                }
            }
        }

        Err(FetchError::Exhausted {
            pair: pair.clone(),
            last: Box::new(last.unwrap_or(FetchError::EmptyResult)),
        })
    }
}

fn transport(err: reqwest::Error) -> FetchError {
    FetchError::Transport(err.to_string())
}

/// Builds `{base}/{FROM}{TO}=X?range=1d&interval=1d`.
fn chart_url(base: &Url, pair: &CurrencyPair) -> Result<Url, FetchError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| FetchError::InvalidEndpoint(base.to_string()))?
        .pop_if_empty()
        .push(&format!("{}=X", pair.symbol()));
    url.query_pairs_mut()
        .clear()
        .append_pair("range", "1d")
        .append_pair("interval", "1d");
    Ok(url)
}

/// Extracts `chart.result[0].meta.regularMarketPrice`.
fn parse_price(body: &[u8]) -> Result<f64, FetchError> {
    let envelope: ChartEnvelope = serde_json::from_slice(body)
        .map_err(|e| FetchError::MalformedResponse(e.to_string()))?;

    let first = envelope
        .chart
        .result
        .unwrap_or_default()
        .into_iter()
        .next()
        .ok_or(FetchError::EmptyResult)?;

    let price = first.meta.regular_market_price;
    if price.is_finite() && price > 0.0 {
        Ok(price)
    } else {
        Err(FetchError::UnusablePrice(price))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_url() {
        let base = Url::parse(DEFAULT_PRIMARY_URL).unwrap();
        let pair = CurrencyPair::parse("usd", "czk").unwrap();
        let url = chart_url(&base, &pair).unwrap();
        assert_eq!(
            url.as_str(),
            "https://query1.finance.yahoo.com/v7/finance/chart/USDCZK=X?range=1d&interval=1d"
        );
    }

    #[test]
    fn test_chart_url_with_trailing_slash() {
        let base = Url::parse("http://127.0.0.1:9000/chart/").unwrap();
        let pair = CurrencyPair::parse("gbp", "usd").unwrap();
        let url = chart_url(&base, &pair).unwrap();
        assert_eq!(url.path(), "/chart/GBPUSD=X");
    }

    #[test]
    fn test_parse_price() {
        let body = serde_json::json!({
            "chart": {
                "result": [{
                    "meta": {
                        "currency": "EUR",
                        "symbol": "USDEUR=X",
                        "regularMarketPrice": 0.9213
                    }
                }],
                "error": null
            }
        });
        assert_eq!(parse_price(body.to_string().as_bytes()).unwrap(), 0.9213);
    }

    #[test]
    fn test_parse_empty_result() {
        let body = br#"{"chart":{"result":[],"error":null}}"#;
        assert!(matches!(parse_price(body), Err(FetchError::EmptyResult)));

        let body = br#"{"chart":{"result":null,"error":{"code":"Not Found"}}}"#;
        assert!(matches!(parse_price(body), Err(FetchError::EmptyResult)));
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(
            parse_price(b"<html>blocked</html>"),
            Err(FetchError::MalformedResponse(_))
        ));
        let body = br#"{"chart":{"result":[{"meta":{}}]}}"#;
        assert!(matches!(
            parse_price(body),
            Err(FetchError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_parse_zero_price() {
        let body = br#"{"chart":{"result":[{"meta":{"regularMarketPrice":0}}]}}"#;
        assert!(matches!(parse_price(body), Err(FetchError::UnusablePrice(_))));
    }

    #[test]
    fn test_default_config() {
        let config = ChartFetcherConfig::default();
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.base_backoff, Duration::from_millis(500));
        assert_eq!(config.request_timeout, Duration::from_secs(2));
    }
}
