pub mod auction_repo;
pub mod error;

pub use auction_repo::{AuctionRepository, InMemoryAuctionRepository};
