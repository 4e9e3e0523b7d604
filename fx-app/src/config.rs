//! Configuration from flags, environment and `.env`.

use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};

use fx_fetch::{ChartFetcherConfig, DEFAULT_PRIMARY_URL, DEFAULT_SECONDARY_URL, Url};

/// Where rates come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FetcherKind {
    /// Live chart API with retry and failover
    Remote,
    /// Built-in fixed table, no network access
    Static,
}

/// Application configuration. Flags win over environment variables.
#[derive(Debug, Parser)]
#[command(name = "fx-server", version, about = "Currency converter HTTP service")]
pub struct Config {
    /// Port to listen on
    #[arg(short, long, env = "CURRENCY_CONVERTER_PORT", default_value_t = 18880)]
    pub port: u16,

    /// Chart API base URL tried first
    #[arg(long, env = "FX_PRIMARY_URL", default_value = DEFAULT_PRIMARY_URL)]
    pub primary_url: String,

    /// Chart API base URL tried when the primary fails
    #[arg(long, env = "FX_SECONDARY_URL", default_value = DEFAULT_SECONDARY_URL)]
    pub secondary_url: String,

    #[arg(long, env = "FX_FETCHER", value_enum, default_value_t = FetcherKind::Remote)]
    pub fetcher: FetcherKind,

    /// SQLite URL of the persistent rate store; disabled when unset
    #[arg(long, env = "RATE_STORE_URL")]
    pub store_url: Option<String>,

    /// Lifetime of persisted rates
    #[arg(long, env = "RATE_STORE_TTL_SECS", default_value_t = 86_400)]
    pub store_ttl_secs: u64,

    /// Deadline for a single conversion request
    #[arg(long, env = "FX_REQUEST_TIMEOUT_SECS", default_value_t = 10)]
    pub request_timeout_secs: u64,

    /// Per-client request quota
    #[arg(long, env = "FX_RATE_LIMIT_PER_MINUTE", default_value_t = 100)]
    pub rate_limit_per_minute: u32,

    /// Key the rate limit on `X-Forwarded-For` (only behind a trusted proxy)
    #[arg(long, env = "FX_TRUST_FORWARDED_FOR")]
    pub trust_forwarded_for: bool,
}

impl Config {
    /// Loads `.env` (if present), then parses the command line.
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self::parse()
    }

    pub fn chart_config(&self) -> anyhow::Result<ChartFetcherConfig> {
        let primary = Url::parse(&self.primary_url)
            .with_context(|| format!("Invalid primary URL: {}", self.primary_url))?;
        let secondary = Url::parse(&self.secondary_url)
            .with_context(|| format!("Invalid secondary URL: {}", self.secondary_url))?;
        Ok(ChartFetcherConfig::new(primary, secondary))
    }

    pub fn store_ttl(&self) -> Duration {
        Duration::from_secs(self.store_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}
