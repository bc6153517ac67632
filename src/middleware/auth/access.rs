//! Bearer token enrichment → Identity in request extensions.
//!
//! Runs in front of every handler and never rejects a request on its own:
//! - no / blank / invalid / expired token: the request passes through anonymously
//! - valid token with subject id 0: same as no token (nothing published or rewritten)
//! - valid token: the `Identity` is inserted into extensions and the user id is
//!   added to the request as `CurrentUserId`
//!   - GET/HEAD/DELETE/OPTIONS: as a query parameter
//!   - anything else with a JSON body: as a top-level field of the body
//!
//! Rewriting a body is fail-open: if it is empty, not JSON or not an object,
//! the original bytes are forwarded unchanged.
//! Access control is left to handlers (see the `CurrentUser` extractor).

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, Bytes},
    extract::{FromRequest, Request, State},
    http::{HeaderValue, Method, StatusCode, header},
    middleware::{self, Next},
    response::Response,
};
use tracing::{debug, warn};

use crate::error::AppError;
use crate::middleware::auth::rewrite;
use crate::services::auth::{Identity, TokenValidator};

/// Name of the injected query parameter / JSON field.
pub const CURRENT_USER_ID: &str = "CurrentUserId";

/// Request bodies are buffered under the router's `DefaultBodyLimit`.
#[derive(Clone, Debug)]
pub struct Enrichment {
    validator: Arc<TokenValidator>,
}

impl Enrichment {
    pub fn new(validator: Arc<TokenValidator>) -> Self {
        Self { validator }
    }
}

/// Put the enrichment stage in front of everything already routed by `router`.
///
/// ```ignore
/// let router = middleware::auth::access::apply(router, Enrichment::new(validator));
/// ```
pub fn apply(router: Router, enrichment: Enrichment) -> Router {
    router.layer(middleware::from_fn_with_state(enrichment, access_middleware))
}

async fn access_middleware(
    State(enrichment): State<Enrichment>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .and_then(|raw| enrichment.validator.validate(raw));

    let req = match identity {
        Some(identity) if identity.is_established() => enrichment.attach(req, identity).await?,
        Some(_) => {
            debug!("token verified but carries no usable subject id; continuing anonymously");
            req
        }
        None => req,
    };

    Ok(next.run(req).await)
}

fn is_read_style(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::DELETE | Method::OPTIONS
    )
}

impl Enrichment {
    async fn attach(&self, mut req: Request, identity: Identity) -> Result<Request, AppError> {
        let user_id = identity.user_id;
        debug!(
            user_id,
            permissions = identity.permissions.len(),
            "authenticated request"
        );

        // middleware → extractor
        req.extensions_mut().insert(identity);

        if is_read_style(req.method()) {
            match rewrite::append_query_param(req.uri(), CURRENT_USER_ID, &user_id.to_string()) {
                Some(uri) => *req.uri_mut() = uri,
                None => warn!(uri = %req.uri(), "could not append user id to query string"),
            }
            return Ok(req);
        }

        self.rewrite_body(req, user_id).await
    }

    async fn rewrite_body(&self, req: Request, user_id: i64) -> Result<Request, AppError> {
        if !rewrite::is_json(req.headers()) {
            return Ok(req);
        }

        // Buffer once; whatever happens below, downstream reads these bytes from the start.
        // The buffered request keeps the extensions so the configured body limit applies.
        let (mut parts, body) = req.into_parts();
        let mut buffered = Request::new(body);
        *buffered.extensions_mut() = parts.extensions.clone();
        let bytes = Bytes::from_request(buffered, &()).await.map_err(|rejection| {
            warn!(error = %rejection, "failed to buffer request body");
            if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                AppError::PayloadTooLarge("request body exceeds the size limit".to_string())
            } else {
                AppError::invalid_request("request body could not be read")
            }
        })?;

        let Some(rewritten) = rewrite::inject_json_field(&bytes, CURRENT_USER_ID, user_id) else {
            debug!(len = bytes.len(), "body left as is (empty, not JSON or not an object)");
            return Ok(Request::from_parts(parts, Body::from(bytes)));
        };

        parts.headers.remove(header::TRANSFER_ENCODING);
        parts
            .headers
            .insert(header::CONTENT_LENGTH, HeaderValue::from(rewritten.len()));
        Ok(Request::from_parts(parts, Body::from(rewritten)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SigningConfig;
    use crate::services::auth::{SigningKeys, TokenIssuer};
    use axum::{Json, extract::DefaultBodyLimit, routing::get};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    /// Echoes what the handler sees: identity, query and raw body.
    async fn echo(req: Request) -> Json<Value> {
        let identity = req.extensions().get::<Identity>().map(|i| i.user_id);
        let query = req.uri().query().map(str::to_string);
        let content_length = req
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = axum::body::to_bytes(req.into_body(), usize::MAX)
            .await
            .unwrap();
        Json(json!({
            "identity": identity,
            "query": query,
            "content_length": content_length,
            "body": String::from_utf8_lossy(&body),
        }))
    }

    fn setup() -> (Router, TokenIssuer) {
        let cfg = SigningConfig::from_parts(Some("access-test-secret"), None, None, None).unwrap();
        let keys = Arc::new(SigningKeys::new(cfg));
        let validator = Arc::new(TokenValidator::new(keys.clone()));
        let router = Router::new().route("/echo", get(echo).post(echo).put(echo));
        let router = apply(router, Enrichment::new(validator));
        (router, TokenIssuer::new(keys))
    }

    async fn send(router: Router, req: Request) -> Value {
        let res = router.oneshot(req).await.unwrap();
        let body = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn anonymous_request_passes_through_untouched() {
        let (router, _) = setup();
        let req = axum::http::Request::builder()
            .uri("/echo?x=1")
            .body(Body::empty())
            .unwrap();
        let seen = send(router, req).await;
        assert_eq!(seen["identity"], Value::Null);
        assert_eq!(seen["query"], "x=1");
    }

    #[tokio::test]
    async fn anonymous_json_body_reaches_handler_unchanged() {
        let (router, _) = setup();
        let body = r#"{"name":"x","CurrentUserId":99}"#;
        let req = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/echo")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();
        let seen = send(router, req).await;
        assert_eq!(seen["identity"], Value::Null);
        assert_eq!(seen["body"], body);
        assert_eq!(seen["content_length"], Value::Null);
    }

    #[tokio::test]
    async fn invalid_token_is_treated_as_anonymous() {
        let (router, _) = setup();
        let req = axum::http::Request::builder()
            .uri("/echo")
            .header(header::AUTHORIZATION, "Bearer nope")
            .body(Body::empty())
            .unwrap();
        let seen = send(router, req).await;
        assert_eq!(seen["identity"], Value::Null);
        assert_eq!(seen["query"], Value::Null);
    }

    #[tokio::test]
    async fn get_gains_query_parameter() {
        let (router, issuer) = setup();
        let token = issuer.issue(7, "carol", None, ["bids.place"]).unwrap();
        let req = axum::http::Request::builder()
            .uri("/echo?x=1")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let seen = send(router, req).await;
        assert_eq!(seen["identity"], 7);
        assert_eq!(seen["query"], "x=1&CurrentUserId=7");
    }

    #[tokio::test]
    async fn json_post_gains_body_field_and_length() {
        let (router, issuer) = setup();
        let token = issuer.issue(7, "carol", None, ["bids.place"]).unwrap();
        let req = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/echo")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name":"x"}"#))
            .unwrap();
        let seen = send(router, req).await;

        let body: Value = serde_json::from_str(seen["body"].as_str().unwrap()).unwrap();
        assert_eq!(body, json!({"name": "x", "CurrentUserId": 7}));
        let len = seen["body"].as_str().unwrap().len().to_string();
        assert_eq!(seen["content_length"], len);
        // body requests don't touch the query string
        assert_eq!(seen["query"], Value::Null);
    }

    #[tokio::test]
    async fn malformed_or_foreign_bodies_are_forwarded_unchanged() {
        for (content_type, body) in [
            ("application/json", "{not json"),
            ("application/json", ""),
            ("text/plain", r#"{"name":"x"}"#),
        ] {
            let (router, issuer) = setup();
            let token = issuer.issue(7, "carol", None, ["bids.place"]).unwrap();
            let req = axum::http::Request::builder()
                .method(Method::PUT)
                .uri("/echo")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(body))
                .unwrap();
            let seen = send(router, req).await;
            assert_eq!(seen["body"], body, "{content_type}");
            assert_eq!(seen["identity"], 7);
        }
    }

    #[tokio::test]
    async fn zero_subject_is_a_no_op() {
        let (router, issuer) = setup();
        let token = issuer.issue(0, "nobody", None, ["read"]).unwrap();
        let req = axum::http::Request::builder()
            .uri("/echo")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let seen = send(router, req).await;
        assert_eq!(seen["identity"], Value::Null);
        assert_eq!(seen["query"], Value::Null);
    }

    #[tokio::test]
    async fn oversized_body_is_payload_too_large() {
        let cfg = SigningConfig::from_parts(Some("access-test-secret"), None, None, None).unwrap();
        let keys = Arc::new(SigningKeys::new(cfg));
        let validator = Arc::new(TokenValidator::new(keys.clone()));
        let router = apply(
            Router::new().route("/echo", axum::routing::post(echo)),
            Enrichment::new(validator),
        )
        .layer(DefaultBodyLimit::max(4));
        let token = TokenIssuer::new(keys).issue(7, "carol", None, ["x"]).unwrap();

        let req = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/echo")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name":"too long"}"#))
            .unwrap();
        let res = router.oneshot(req).await.unwrap();
        let failure = res
            .extensions()
            .get::<crate::error::UncaughtFailure>()
            .unwrap();
        assert!(matches!(failure.error(), AppError::PayloadTooLarge(_)));
    }
}
