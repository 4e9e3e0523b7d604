//! HTTP request handlers.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};

use fx_types::{
    AppError, CancellationToken, ConvertQuery, ConvertRequest, ConvertResponse, OutputFormat,
    RateFetcher,
};

use crate::{ApiDoc, Converter};

/// Application state shared across handlers.
pub struct AppState<F: RateFetcher> {
    pub converter: Arc<Converter<F>>,
    /// Parent of every per-request token; cancelled on shutdown.
    pub shutdown: CancellationToken,
    pub request_timeout: Duration,
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0 {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Timeout(msg) => (StatusCode::GATEWAY_TIMEOUT, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, message).into_response()
    }
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// Serves the OpenAPI document.
pub async fn openapi_json() -> impl IntoResponse {
    use utoipa::OpenApi;
    Json(ApiDoc::openapi())
}

/// Convert a quantity between two currencies.
#[tracing::instrument(skip_all)]
pub async fn convert<F: RateFetcher>(
    State(state): State<Arc<AppState<F>>>,
    query: Result<Query<ConvertQuery>, QueryRejection>,
    body: Result<Json<ConvertRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let Json(req) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    tracing::debug!(
        from = %req.currency_from,
        to = %req.currency_to,
        quantity = req.quantity,
        "Convert request"
    );

    let cancel = state.shutdown.child_token();
    let conversion = tokio::time::timeout(
        state.request_timeout,
        state
            .converter
            .convert(&cancel, &req.currency_from, &req.currency_to, req.quantity),
    )
    .await
    .map_err(|_| {
        cancel.cancel();
        AppError::Timeout(format!(
            "Conversion did not finish within {}s",
            state.request_timeout.as_secs_f64()
        ))
    })?
    .map_err(AppError::from)?;

    let response = match query.format.unwrap_or_default() {
        OutputFormat::Json => Json(ConvertResponse::from(&conversion)).into_response(),
        OutputFormat::Text => conversion.to_string().into_response(),
    };
    Ok(response)
}
