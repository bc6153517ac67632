pub mod auctions;
pub mod health;
pub mod me;
