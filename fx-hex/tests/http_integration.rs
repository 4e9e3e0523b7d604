//! Integration tests for the HTTP adapter.
//!
//! These drive the full router (rate limiting, extractors, error mapping)
//! with deterministic fetchers; no network access is needed.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    extract::connect_info::MockConnectInfo,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use fx_fetch::StaticFetcher;
use fx_hex::{Converter, inbound::HttpServer};
use fx_types::{CancellationToken, ConvertResponse, CurrencyPair, FetchError, RateFetcher};

struct FixedFetcher(f64);

#[async_trait]
impl RateFetcher for FixedFetcher {
    async fn fetch_rate(
        &self,
        _cancel: &CancellationToken,
        _pair: &CurrencyPair,
    ) -> Result<f64, FetchError> {
        Ok(self.0)
    }
}

struct DownFetcher;

#[async_trait]
impl RateFetcher for DownFetcher {
    async fn fetch_rate(
        &self,
        _cancel: &CancellationToken,
        pair: &CurrencyPair,
    ) -> Result<f64, FetchError> {
        Err(FetchError::Exhausted {
            pair: pair.clone(),
            last: Box::new(FetchError::UpstreamRejected { status: 503 }),
        })
    }
}

struct StalledFetcher;

#[async_trait]
impl RateFetcher for StalledFetcher {
    async fn fetch_rate(
        &self,
        cancel: &CancellationToken,
        _pair: &CurrencyPair,
    ) -> Result<f64, FetchError> {
        cancel.cancelled().await;
        Err(FetchError::Cancelled)
    }
}

fn app<F: RateFetcher>(fetcher: F) -> Router {
    HttpServer::new(Converter::new(fetcher)).router()
}

fn convert_request(query: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(format!("/convert{query}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// The router as seen by a connection from `peer`.
fn from_peer(router: &Router, peer: &str) -> Router {
    router
        .clone()
        .layer(MockConnectInfo(peer.parse::<SocketAddr>().unwrap()))
}

/// Sends one POST /convert over a fresh TCP connection and returns the raw
/// response.
async fn post_over_tcp(addr: SocketAddr, extra_headers: &str, body: &str) -> String {
    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    let head = format!(
        "POST /convert?format=text HTTP/1.1\r\nHost: {addr}\r\n\
         Content-Type: application/json\r\nContent-Length: {}\r\n{extra_headers}\
         Connection: close\r\n\r\n",
        body.len()
    );
    tokio::io::AsyncWriteExt::write_all(&mut stream, format!("{head}{body}").as_bytes())
        .await
        .unwrap();
    let mut raw = String::new();
    tokio::io::AsyncReadExt::read_to_string(&mut stream, &mut raw)
        .await
        .unwrap();
    raw
}

#[tokio::test]
async fn test_health() {
    let response = app(FixedFetcher(1.0))
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_convert_json() {
    let response = app(FixedFetcher(1.2))
        .oneshot(convert_request(
            "",
            r#"{"currency_from":"usd","currency_to":"eur","quantity":5}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: ConvertResponse = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body.from, "USD");
    assert_eq!(body.to, "EUR");
    assert_eq!(body.result, 6.0);
    assert_eq!(body.from_rate, 1.2);
    assert_eq!(body.to_rate, 1.0 / 1.2);
    assert_eq!(body.quantity, 5.0);
}

#[tokio::test]
async fn test_convert_text() {
    let response = app(FixedFetcher(1.2))
        .oneshot(convert_request(
            "?format=text",
            r#"{"currency_from":"usd","currency_to":"eur","quantity":5}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );
    assert_eq!(
        body_text(response).await,
        "Amount: 5 USD\n\n1 USD = 1.2000 EUR\n1 EUR = 0.8333 USD\n\nResult: 6.00 EUR\n"
    );
}

#[tokio::test]
async fn test_quantity_defaults_to_one() {
    let response = app(StaticFetcher::default())
        .oneshot(convert_request(
            "",
            r#"{"currency_from":"gbp","currency_to":"gbp"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: ConvertResponse = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body.quantity, 1.0);
    assert_eq!(body.result, 1.0);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = app(FixedFetcher(1.0));

    for body in [
        "not json",
        r#"{"currency_from":"usd"}"#,
        r#"{"currency_from":"usd","currency_to":"eur","quantity":"ten"}"#,
        r#"{"currency_from":"","currency_to":"eur","quantity":1}"#,
    ] {
        let response = app.clone().oneshot(convert_request("", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
    }
}

#[tokio::test]
async fn test_unknown_format_is_bad_request() {
    let response = app(FixedFetcher(1.0))
        .oneshot(convert_request(
            "?format=xml",
            r#"{"currency_from":"usd","currency_to":"eur","quantity":1}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_fetch_failure_is_internal_error() {
    let response = app(DownFetcher)
        .oneshot(convert_request(
            "",
            r#"{"currency_from":"usd","currency_to":"eur","quantity":1}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let message = body_text(response).await;
    assert!(message.starts_with("fetch rate: "), "{message}");
    assert!(message.contains("USD/EUR"));
}

#[tokio::test]
async fn test_invalid_rate_is_internal_error() {
    let response = app(FixedFetcher(0.0))
        .oneshot(convert_request(
            "",
            r#"{"currency_from":"usd","currency_to":"eur","quantity":1}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(response).await.contains("invalid rate"));
}

#[tokio::test]
async fn test_overflowing_amount_is_bad_request() {
    let response = app(StaticFetcher::default())
        .oneshot(convert_request(
            "",
            r#"{"currency_from":"gbp","currency_to":"usd","quantity":1.7e308}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("overflows"));
}

#[tokio::test]
async fn test_request_deadline_returns_gateway_timeout() {
    let router = HttpServer::new(Converter::new(StalledFetcher))
        .with_request_timeout(Duration::from_millis(50))
        .router();

    let response = router
        .oneshot(convert_request(
            "",
            r#"{"currency_from":"usd","currency_to":"eur","quantity":1}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn test_shutdown_cancels_in_flight_conversion() {
    let server = HttpServer::new(Converter::new(StalledFetcher));
    let shutdown = server.shutdown_token();
    let router = server.router();

    let request = tokio::spawn(router.oneshot(convert_request(
        "",
        r#"{"currency_from":"usd","currency_to":"eur","quantity":1}"#,
    )));
    tokio::time::sleep(Duration::from_millis(20)).await;
    shutdown.cancel();

    let response = request.await.unwrap().unwrap();
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn test_rate_limit_returns_429_and_exempts_health() {
    let router = HttpServer::new(Converter::new(FixedFetcher(1.0)))
        .with_rate_limit(2)
        .router();
    let client = from_peer(&router, "192.0.2.1:50000");
    let body = r#"{"currency_from":"usd","currency_to":"eur","quantity":1}"#;

    for _ in 0..2 {
        let response = client.clone().oneshot(convert_request("", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = client.clone().oneshot(convert_request("", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["retry_after_seconds"], 60);

    // A new source port is the same client.
    let response = from_peer(&router, "192.0.2.1:50001")
        .oneshot(convert_request("", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    // Another address has its own quota.
    let response = from_peer(&router, "198.51.100.4:40000")
        .oneshot(convert_request("", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_rotating_forwarded_for_does_not_escape_quota() {
    let server = HttpServer::new(Converter::new(FixedFetcher(1.0))).with_rate_limit(1);
    let shutdown = server.shutdown_token();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(server.serve(listener));
    let body = r#"{"currency_from":"usd","currency_to":"eur","quantity":1}"#;

    let mut statuses = Vec::new();
    for i in 0..5 {
        let header = format!("X-Forwarded-For: 10.0.0.{i}\r\n");
        let raw = post_over_tcp(addr, &header, body).await;
        statuses.push(raw.starts_with("HTTP/1.1 200"));
    }
    assert_eq!(statuses, [true, false, false, false, false]);

    shutdown.cancel();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_trusted_proxy_keys_on_forwarded_for() {
    let router = HttpServer::new(Converter::new(FixedFetcher(1.0)))
        .with_rate_limit(1)
        .with_trusted_proxy(true)
        .router();
    let proxy = from_peer(&router, "10.1.1.1:443");
    let body = r#"{"currency_from":"usd","currency_to":"eur","quantity":1}"#;

    for client in ["203.0.113.1", "203.0.113.2"] {
        let mut request = convert_request("", body);
        request
            .headers_mut()
            .insert("X-Forwarded-For", client.parse().unwrap());
        let response = proxy.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "client {client}");
    }

    let mut request = convert_request("", body);
    request
        .headers_mut()
        .insert("X-Forwarded-For", "203.0.113.1".parse().unwrap());
    let response = proxy.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_openapi_document() {
    let response = app(FixedFetcher(1.0))
        .oneshot(
            Request::builder()
                .uri("/api-docs/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let doc: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(doc["info"]["title"], "Currency Converter API");
    assert!(doc["paths"]["/convert"].is_object());
}

#[tokio::test]
async fn test_served_over_tcp() {
    let server = HttpServer::new(Converter::new(FixedFetcher(2.0)));
    let shutdown = server.shutdown_token();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(server.serve(listener));

    let body = r#"{"currency_from":"usd","currency_to":"eur","quantity":3}"#;
    let raw = post_over_tcp(addr, "", body).await;

    assert!(raw.starts_with("HTTP/1.1 200"));
    assert!(raw.ends_with("Result: 6.00 EUR\n"));

    shutdown.cancel();
    handle.await.unwrap().unwrap();
}
