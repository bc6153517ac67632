//! Error boundary: the outermost stage of the request pipeline.
//!
//! Responsibility:
//! - Catch every failure that escaped the inner stages and handlers
//!   (`AppError` returned anywhere below, or a panic)
//! - Classify it with one fixed table and write `{"error": "<message>"}`
//!
//! Policy for responses already produced downstream:
//! - Only responses tagged with `UncaughtFailure` are rewritten.
//! - A response a handler built itself (including its own 4xx/5xx) passes
//!   through untouched, so a failure is never written over it.

use std::any::Any;

use axum::{
    Json, Router,
    extract::Request,
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tower_http::catch_panic::CatchPanicLayer;

use crate::error::{AppError, FailureCategory, UncaughtFailure};

/// First match wins; anything not listed is a 500.
const CLASSIFICATION: [(FailureCategory, StatusCode); 5] = [
    (FailureCategory::NotFound, StatusCode::NOT_FOUND),
    (FailureCategory::AccessViolation, StatusCode::FORBIDDEN),
    (FailureCategory::Unauthorized, StatusCode::UNAUTHORIZED),
    (FailureCategory::DataAccess, StatusCode::BAD_REQUEST),
    (FailureCategory::PayloadTooLarge, StatusCode::PAYLOAD_TOO_LARGE),
];

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn classify(category: FailureCategory) -> StatusCode {
    CLASSIFICATION
        .iter()
        .find(|(c, _)| *c == category)
        .map(|(_, status)| *status)
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Wrap everything already layered on `router` in the boundary.
///
/// Must be applied after the auth stage so that it sits outside of it.
pub fn apply(router: Router) -> Router {
    router
        .layer(CatchPanicLayer::custom(panic_as_failure))
        .layer(middleware::from_fn(translate_failures))
}

fn panic_as_failure(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unexpected failure".to_string()
    };
    AppError::Internal(message).into_response()
}

async fn translate_failures(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();

    let response = next.run(req).await;
    let Some(failure) = response.extensions().get::<UncaughtFailure>().cloned() else {
        return response;
    };

    let error = failure.error();
    let status = classify(error.category());
    if status.is_server_error() {
        tracing::error!(%method, %uri, status = status.as_u16(), error = %error, "request failed");
    } else {
        tracing::warn!(%method, %uri, status = status.as_u16(), error = %error, "request failed");
    }

    let body = ErrorResponse {
        error: error.to_string(),
    };
    (status, Json(body)).into_response()
}
