/*
 * Responsibility
 * - shared context attached to the Router (AppState)
 * - cheap to Clone (everything behind Arc or Clone-cheap)
 */
use std::sync::Arc;

use crate::repos::AuctionRepository;
use crate::services::id_codec::IdCodec;

#[derive(Clone)]
pub struct AppState {
    pub auctions: Arc<dyn AuctionRepository>,
    pub id_codec: IdCodec,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("id_codec", &self.id_codec)
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(auctions: Arc<dyn AuctionRepository>, id_codec: IdCodec) -> Self {
        Self { auctions, id_codec }
    }
}
