/*
 * Responsibility
 * - take the public id from the path and decode it into the internal id
 * - the tag type keeps ids of different resources apart at compile time
 * - malformed ids fail as an invalid request
 */
use std::marker::PhantomData;

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;

use crate::error::AppError;
use crate::state::AppState;

pub struct PublicId<T> {
    pub id: i64,
    pub public: String,
    _marker: PhantomData<T>,
}

pub enum AuctionTag {}
pub type PublicAuctionId = PublicId<AuctionTag>;

impl<T> FromRequestParts<AppState> for PublicId<T>
where
    T: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Path(public) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::invalid_request("missing id"))?;
        let id = state.id_codec.decode(&public)?;
        Ok(Self {
            id,
            public,
            _marker: PhantomData,
        })
    }
}

impl<T> std::fmt::Debug for PublicId<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublicId")
            .field("id", &self.id)
            .field("public", &self.public)
            .finish()
    }
}
