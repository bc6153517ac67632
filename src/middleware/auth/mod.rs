pub mod access;
pub mod rewrite;

pub use access::{CURRENT_USER_ID, Enrichment};
