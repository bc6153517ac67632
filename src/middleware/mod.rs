/*
 * Responsibility
 * - public surface of the middleware stack
 * - each submodule exposes `apply(router, ..) -> Router`; app.rs decides the order
 */
pub mod auth;
pub mod error_boundary;
pub mod http;
pub mod security_headers;
