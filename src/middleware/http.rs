//! Transport-level middleware shared by every route.
//!
//! - `x-request-id`: generated when missing, echoed on the response
//! - access tracing (TraceLayer)
//! - request body size limit, applied both to declared lengths and to
//!   bodies buffered by extractors or the auth stage (`DefaultBodyLimit`)
//! - global timeout
//!
//! Failures raised by these layers never reach the error boundary (it sits
//! inside them), so they are answered here with the same `{"error": ..}` shape.
//! That includes the plain-text 413 `RequestBodyLimitLayer` writes for an
//! oversized `Content-Length`.

use std::time::Duration;

use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::extract::DefaultBodyLimit;
use axum::http::{StatusCode, header, header::HeaderName};
use axum::middleware::map_response;
use axum::{
    Json,
    response::{IntoResponse, Response},
};
use tower::timeout::TimeoutLayer;
use tower::{BoxError, ServiceBuilder};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::middleware::error_boundary::ErrorResponse;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub fn apply(router: Router, body_limit_bytes: usize) -> Router {
    let request_id_header = HeaderName::from_static(REQUEST_ID_HEADER);

    let layers = ServiceBuilder::new()
        .layer(map_response(payload_too_large_as_json))
        .layer(HandleErrorLayer::new(|err: BoxError| async move {
            let (status, message) = if err.is::<tower::timeout::error::Elapsed>() {
                (StatusCode::REQUEST_TIMEOUT, "request timed out".to_string())
            } else {
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            };
            (status, Json(ErrorResponse { error: message })).into_response()
        }))
        .layer(SetRequestIdLayer::new(
            request_id_header.clone(),
            MakeRequestUuid,
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header))
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(body_limit_bytes))
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT));

    router.layer(layers)
}

async fn payload_too_large_as_json(res: Response) -> Response {
    let is_json = res
        .headers()
        .get(header::CONTENT_TYPE)
        .is_some_and(|v| v.as_bytes().starts_with(b"application/json"));
    if res.status() != StatusCode::PAYLOAD_TOO_LARGE || is_json {
        return res;
    }

    let body = ErrorResponse {
        error: "request body exceeds the size limit".to_string(),
    };
    let mut json = (StatusCode::PAYLOAD_TOO_LARGE, Json(body)).into_response();
    // keep x-request-id and friends
    for (name, value) in res.headers() {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            json.headers_mut().append(name.clone(), value.clone());
        }
    }
    json
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, routing::post};
    use tower::ServiceExt;

    async fn accept(body: String) -> String {
        body
    }

    #[tokio::test]
    async fn declared_oversized_body_gets_json_413() {
        let router = apply(Router::new().route("/upload", post(accept)), 8);
        let req = axum::http::Request::builder()
            .method("POST")
            .uri("/upload")
            .header(header::CONTENT_LENGTH, "32")
            .body(Body::from("x".repeat(32)))
            .unwrap();

        let res = router.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(res.headers()[header::CONTENT_TYPE], "application/json");
        assert!(res.headers().contains_key(REQUEST_ID_HEADER));
        let body = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.error, "request body exceeds the size limit");
    }

    #[tokio::test]
    async fn small_body_passes() {
        let router = apply(Router::new().route("/upload", post(accept)), 8);
        let req = axum::http::Request::builder()
            .method("POST")
            .uri("/upload")
            .body(Body::from("abc"))
            .unwrap();

        let res = router.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
}
