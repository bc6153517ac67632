/*
 * Responsibility
 * - load Config → build services/state → assemble the Router
 * - decide middleware order (outermost first):
 *   http (request id, trace, body limit, timeout) → security headers
 *   → error boundary (+ panic catcher) → auth enrichment → routes
 * - axum::serve() with graceful shutdown
 */
use std::{panic, sync::Arc};

use anyhow::Result;
use axum::{Router, http::Uri};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::error::AppError;
use crate::middleware::{self, auth::Enrichment};
use crate::repos::InMemoryAuctionRepository;
use crate::services::auth::{SigningKeys, TokenValidator};
use crate::services::id_codec::IdCodec;
use crate::{api, state::AppState};

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,auction_api=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook() {
    let default_hook = panic::take_hook();

    // Request panics are turned into 500s by the error boundary; the hook only
    // makes sure they also show up in the tracing output.
    panic::set_hook(Box::new(move |info| {
        tracing::error!(%info, "panic");
        default_hook(info);
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;
    init_panic_hook();

    tracing::info!(
        env = ?config.app_env,
        addr = %config.addr,
        issuer = %config.signing.issuer,
        audience = %config.signing.audience,
        expiry_minutes = config.signing.expiry_minutes,
        "starting auction API"
    );

    let keys = Arc::new(SigningKeys::new(config.signing.clone()));
    let validator = Arc::new(TokenValidator::new(keys));
    let state = build_state(&config)?;

    let app = build_router(state, validator, config.request_body_limit_bytes);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
            tracing::info!("shutting down");
        })
        .await?;
    Ok(())
}

fn build_state(config: &Config) -> Result<AppState> {
    let id_codec = IdCodec::new(config.sqids_min_length, &config.sqids_alphabet)?;
    let auctions = Arc::new(InMemoryAuctionRepository::new());
    Ok(AppState::new(auctions, id_codec))
}

async fn route_not_found(uri: Uri) -> AppError {
    AppError::not_found(format!("no route for {}", uri.path()))
}

/// Assemble the full pipeline around the v1 routes.
///
/// The enrichment stage gets an already-built validator; the error boundary is
/// layered after it so that it wraps enrichment and every handler.
pub fn build_router(
    state: AppState,
    validator: Arc<TokenValidator>,
    body_limit_bytes: usize,
) -> Router {
    let router = Router::new()
        .nest("/api/v1", api::v1::routes())
        .fallback(route_not_found)
        .with_state(state);

    let router =
        middleware::auth::access::apply(router, Enrichment::new(validator));
    let router = middleware::error_boundary::apply(router);
    let router = middleware::security_headers::apply(router);
    middleware::http::apply(router, body_limit_bytes)
}
