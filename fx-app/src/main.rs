//! # Currency Converter Application
//!
//! Binary that wires together all the components:
//! - Load configuration from flags, environment and `.env`
//! - Pick the rate fetcher and the optional persistent store
//! - Create the converter
//! - Start the HTTP server

mod config;
mod telemetry;

use std::sync::Arc;

use fx_fetch::{ChartFetcher, StaticFetcher};
use fx_hex::{Converter, inbound::HttpServer};
use fx_store::build_store;
use fx_types::RateFetcher;

use config::{Config, FetcherKind};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load();
    let otel_provider = telemetry::init()?;

    tracing::info!("Starting currency converter on port {}", config.port);

    let fetcher: Box<dyn RateFetcher> = match config.fetcher {
        FetcherKind::Remote => {
            let chart = config.chart_config()?;
            tracing::info!(
                primary = %chart.primary_url,
                secondary = %chart.secondary_url,
                "Using remote chart fetcher"
            );
            Box::new(ChartFetcher::new(chart))
        }
        FetcherKind::Static => {
            tracing::info!("Using static rate table");
            Box::new(StaticFetcher::default())
        }
    };

    let mut converter = Converter::new(fetcher);
    if let Some(url) = &config.store_url {
        tracing::info!("Using rate store: {}", url);
        let store = build_store(url, config.store_ttl()).await?;
        converter = converter.with_store(Arc::new(store));
    }

    let server = HttpServer::new(converter)
        .with_rate_limit(config.rate_limit_per_minute)
        .with_trusted_proxy(config.trust_forwarded_for)
        .with_request_timeout(config.request_timeout());

    server.run(&config.addr()).await?;

    // Ensure traces are flushed before exit
    if let Some(provider) = otel_provider {
        let _ = provider.shutdown();
    }
    Ok(())
}
