//! OpenAPI specification and documentation.

#![allow(dead_code)] // Path functions are only used by utoipa for documentation generation

use fx_types::dto::{ConvertRequest, ConvertResponse, OutputFormat};
use utoipa::OpenApi;

// Dummy functions to generate path documentation
// These are not the actual handlers, just for OpenAPI path generation

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = inline(serde_json::Value), example = json!({"status": "healthy"}))
    )
)]
async fn health() {}

/// Convert a quantity between two currencies
#[utoipa::path(
    post,
    path = "/convert",
    tag = "conversion",
    request_body = ConvertRequest,
    params(
        ("format" = Option<OutputFormat>, Query, description = "Response format, `json` (default) or `text`")
    ),
    responses(
        (status = 200, description = "Conversion result", body = ConvertResponse),
        (status = 400, description = "Malformed body, empty currency code, unknown format or overflowing result", body = String),
        (status = 429, description = "Rate limit exceeded"),
        (status = 500, description = "Rate could not be fetched or was invalid", body = String),
        (status = 504, description = "Conversion did not finish before the request deadline", body = String)
    )
)]
async fn convert() {}

/// OpenAPI documentation for the currency conversion API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Currency Converter API",
        version = "1.0.0",
        description = "Converts amounts between currencies using live market rates.\n\nRates are cached in memory together with their inverse, so converting back never triggers a second upstream fetch.",
        license(name = "MIT"),
    ),
    paths(health, convert),
    components(schemas(ConvertRequest, ConvertResponse, OutputFormat)),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "conversion", description = "Currency conversion"),
    )
)]
pub struct ApiDoc;
