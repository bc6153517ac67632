/*
 * Responsibility
 * - Shared AppError for handlers, extractors and middleware
 * - Each variant belongs to one failure category (see FailureCategory)
 * - into_response() only tags the response; the error boundary middleware
 *   classifies the failure and writes the `{"error": ...}` body
 */
use std::sync::Arc;

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::repos::error::RepoError;
use crate::services::auth::TokenError;
use crate::services::id_codec::IdCodecError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    InvalidRequest(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error(transparent)]
    Repository(#[from] RepoError),
    #[error("{0}")]
    Internal(String),
}

/// Failure categories known to the error boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    /// resource or entry point not found
    NotFound,
    /// access to something the caller may not touch
    AccessViolation,
    /// no (usable) credentials
    Unauthorized,
    /// domain or data-access failure
    DataAccess,
    /// request body over the configured limit
    PayloadTooLarge,
    Other,
}

impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn unauthorized() -> Self {
        Self::Unauthorized("authentication required".to_string())
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn category(&self) -> FailureCategory {
        match self {
            AppError::NotFound(_) => FailureCategory::NotFound,
            AppError::Forbidden(_) => FailureCategory::AccessViolation,
            AppError::Unauthorized(_) => FailureCategory::Unauthorized,
            AppError::InvalidRequest(_) | AppError::Repository(_) => FailureCategory::DataAccess,
            AppError::PayloadTooLarge(_) => FailureCategory::PayloadTooLarge,
            AppError::Internal(_) => FailureCategory::Other,
        }
    }
}

/// A failure that left the handler chain unhandled.
///
/// Carried in response extensions from `AppError::into_response` to the error
/// boundary. A response without it is never rewritten.
#[derive(Debug, Clone)]
pub struct UncaughtFailure(Arc<AppError>);

impl UncaughtFailure {
    pub fn error(&self) -> &AppError {
        &self.0
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Placeholder status; the boundary replaces the whole response.
        let mut res = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        res.extensions_mut().insert(UncaughtFailure(Arc::new(self)));
        res
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return AppError::PayloadTooLarge(e.body_text());
        }
        AppError::InvalidRequest(e.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(e: QueryRejection) -> Self {
        AppError::InvalidRequest(e.body_text())
    }
}

impl From<IdCodecError> for AppError {
    fn from(e: IdCodecError) -> Self {
        match e {
            // Client supplied a malformed public id (e.g. /auctions/{id})
            IdCodecError::DecodeInvalidFormat | IdCodecError::DecodeOutOfRange => {
                AppError::invalid_request("invalid id")
            }
            // Server-side config / programming errors
            _ => AppError::Internal(e.to_string()),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        AppError::Internal(e.to_string())
    }
}
