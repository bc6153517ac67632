pub mod auctions;
pub mod me;
