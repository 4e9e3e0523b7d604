//! HTTP Server configuration and startup.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use fx_types::{CancellationToken, RateFetcher};

use super::handlers::{self, AppState};
use super::rate_limit::{RateLimiterState, rate_limit_middleware};
use crate::Converter;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_RATE_LIMIT: u32 = 100;
const LIMITER_PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// HTTP Server for the currency conversion API.
pub struct HttpServer<F: RateFetcher> {
    converter: Arc<Converter<F>>,
    rate_limiter: Arc<RateLimiterState>,
    requests_per_minute: u32,
    trust_forwarded_for: bool,
    request_timeout: Duration,
    shutdown: CancellationToken,
}

impl<F: RateFetcher> HttpServer<F> {
    /// Creates a new HTTP server with the given converter.
    pub fn new(converter: Converter<F>) -> Self {
        Self {
            converter: Arc::new(converter),
            rate_limiter: Arc::new(RateLimiterState::per_minute(DEFAULT_RATE_LIMIT)),
            requests_per_minute: DEFAULT_RATE_LIMIT,
            trust_forwarded_for: false,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            shutdown: CancellationToken::new(),
        }
    }

    /// Sets the per-client request quota.
    pub fn with_rate_limit(mut self, requests_per_minute: u32) -> Self {
        self.requests_per_minute = requests_per_minute;
        self.rebuild_rate_limiter()
    }

    /// Keys the rate limit on `X-Forwarded-For` instead of the peer address.
    /// Only for deployments behind a proxy that sets the header.
    pub fn with_trusted_proxy(mut self, trust: bool) -> Self {
        self.trust_forwarded_for = trust;
        self.rebuild_rate_limiter()
    }

    fn rebuild_rate_limiter(mut self) -> Self {
        self.rate_limiter = Arc::new(
            RateLimiterState::per_minute(self.requests_per_minute)
                .trust_forwarded_for(self.trust_forwarded_for),
        );
        self
    }

    /// Sets the deadline for a single conversion request.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Token cancelled when the server shuts down. Cancelling it also
    /// triggers shutdown.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Builds the Axum router with all routes.
    pub fn router(&self) -> Router {
        let state = Arc::new(AppState {
            converter: self.converter.clone(),
            shutdown: self.shutdown.clone(),
            request_timeout: self.request_timeout,
        });

        Router::new()
            .route("/health", get(handlers::health))
            .route("/convert", post(handlers::convert::<F>))
            .route("/api-docs/openapi.json", get(handlers::openapi_json))
            .layer(middleware::from_fn_with_state(
                self.rate_limiter.clone(),
                rate_limit_middleware,
            ))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Binds `addr` and serves until a shutdown signal arrives.
    pub async fn run(self, addr: &str) -> anyhow::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener).await
    }

    /// Serves on an already bound listener with graceful shutdown.
    pub async fn serve(self, listener: TcpListener) -> anyhow::Result<()> {
        tracing::info!("Server listening on {}", listener.local_addr()?);

        let pruner = tokio::spawn(prune_rate_limiter(
            self.rate_limiter.clone(),
            self.shutdown.clone(),
        ));

        let shutdown = self.shutdown.clone();
        let app = self
            .router()
            .into_make_service_with_connect_info::<SocketAddr>();
        let served = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown_signal() => {},
                    _ = shutdown.cancelled() => {},
                }
                // Abort in-flight fetches instead of waiting out their retries.
                shutdown.cancel();
                tracing::info!("Shutdown signal received, starting graceful shutdown...");
            })
            .await;

        pruner.abort();
        served?;
        Ok(())
    }
}

/// Periodically forgets clients whose buckets have refilled.
async fn prune_rate_limiter(limiter: Arc<RateLimiterState>, shutdown: CancellationToken) {
    let mut interval = tokio::time::interval(LIMITER_PRUNE_INTERVAL);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = interval.tick() => {
                let tracked = limiter.prune();
                tracing::debug!(tracked, "Pruned rate limiter");
            }
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
