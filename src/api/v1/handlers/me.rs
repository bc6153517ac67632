/*
 * Responsibility
 * - GET /me: the identity the auth middleware derived from the bearer token
 */
use axum::Json;

use crate::api::v1::{dto::me::MeResponse, extractors::CurrentUser};

pub async fn me(CurrentUser(identity): CurrentUser) -> Json<MeResponse> {
    Json(identity.into())
}
