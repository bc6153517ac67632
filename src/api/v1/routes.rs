/*
 * Responsibility
 * - URL layout of v1
 * - nothing here enforces authentication; handlers opt in via CurrentUser
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::v1::handlers::{
    auctions::{activate_auction, create_auction, get_auction, list_auctions, update_auction},
    health::health,
    me::me,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/me", get(me))
        .route("/auctions", get(list_auctions).post(create_auction))
        .route(
            "/auctions/{auction_id}",
            get(get_auction).put(update_auction),
        )
        .route("/auctions/{auction_id}/activate", post(activate_auction))
}
