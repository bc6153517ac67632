//! Auction API: request authentication and enrichment pipeline.
//!
//! - `services::auth`: signing keys, token issuer, token validator
//! - `middleware::auth`: enrichment stage (identity + `CurrentUserId` injection)
//! - `middleware::error_boundary`: failure classification into `{"error": ..}`
//! - `app`: configuration, wiring and the serve loop

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod repos;
pub mod services;
pub mod state;
