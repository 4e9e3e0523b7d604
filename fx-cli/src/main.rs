//! Currency CLI
//!
//! Converts amounts either locally (fetching the rate itself) or through a
//! running converter server.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use fx_client::CurrencyClient;
use fx_fetch::{ChartFetcher, ChartFetcherConfig, StaticFetcher};
use fx_hex::Converter;
use fx_types::{CancellationToken, Conversion, ConvertResponse, RateFetcher};

#[derive(Parser)]
#[command(name = "currency")]
#[command(author, version, about = "Currency conversion CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert using live market rates fetched by this process
    #[command(allow_negative_numbers = true)]
    Convert {
        #[command(flatten)]
        args: ConvertArgs,
        /// Use the built-in static rate table instead of the network
        #[arg(long)]
        offline: bool,
        /// Give up after this many seconds
        #[arg(long, env = "FX_TIMEOUT_SECS", default_value_t = 10)]
        timeout_secs: u64,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Convert through a running converter server
    #[command(allow_negative_numbers = true)]
    Remote {
        #[command(flatten)]
        args: ConvertArgs,
        /// Base URL of the converter API
        #[arg(
            long,
            env = "CURRENCY_API_URL",
            default_value = "http://localhost:18880"
        )]
        api_url: String,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// List the currencies available offline
    Currencies,
    /// Check API health
    Health {
        /// Base URL of the converter API
        #[arg(
            long,
            env = "CURRENCY_API_URL",
            default_value = "http://localhost:18880"
        )]
        api_url: String,
    },
}

#[derive(Args)]
struct ConvertArgs {
    /// Source currency code, e.g. USD
    from: String,
    /// Target currency code, e.g. EUR
    to: String,
    /// Amount of the source currency
    #[arg(default_value_t = 1.0)]
    quantity: f64,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            args,
            offline,
            timeout_secs,
            format,
        } => {
            let start = Instant::now();
            let fetcher: Box<dyn RateFetcher> = if offline {
                Box::new(StaticFetcher::default())
            } else {
                Box::new(ChartFetcher::new(ChartFetcherConfig::default()))
            };
            let conversion =
                convert_local(fetcher, &args, Duration::from_secs(timeout_secs)).await?;
            match format {
                Format::Text => {
                    print!("{conversion}");
                    println!("\nTime taken: {} ms", start.elapsed().as_millis());
                }
                Format::Json => print_json(&ConvertResponse::from(&conversion))?,
            }
        }

        Commands::Remote {
            args,
            api_url,
            format,
        } => {
            let client = CurrencyClient::new(&api_url);
            match format {
                Format::Text => {
                    let text = client
                        .convert_text(&args.from, &args.to, args.quantity)
                        .await?;
                    print!("{text}");
                }
                Format::Json => {
                    let resp = client.convert(&args.from, &args.to, args.quantity).await?;
                    print_json(&resp)?;
                }
            }
        }

        Commands::Currencies => {
            for code in offline_currencies() {
                println!("{code}");
            }
        }

        Commands::Health { api_url } => {
            let healthy = CurrencyClient::new(&api_url).health().await?;
            if healthy {
                println!("✓ API is healthy");
            } else {
                println!("✗ API is not healthy");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Runs one conversion, cancelled by Ctrl+C or after `timeout`.
async fn convert_local<F: RateFetcher>(
    fetcher: F,
    args: &ConvertArgs,
    timeout: Duration,
) -> Result<Conversion> {
    let converter = Converter::new(fetcher);
    let cancel = CancellationToken::new();

    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let result = tokio::time::timeout(
        timeout,
        converter.convert(&cancel, &args.from, &args.to, args.quantity),
    )
    .await;
    interrupt.abort();

    result
        .map_err(|_| anyhow::anyhow!("Timed out after {}s", timeout.as_secs()))?
        .with_context(|| format!("Failed to convert {} to {}", args.from, args.to))
}

/// Codes in the built-in table, sorted. Live conversion accepts any code
/// the upstream knows.
fn offline_currencies() -> Vec<String> {
    let mut codes: Vec<String> = StaticFetcher::default()
        .currencies()
        .map(ToString::to_string)
        .collect();
    codes.sort();
    codes
}

fn print_json(resp: &ConvertResponse) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(resp)?);
    Ok(())
}
