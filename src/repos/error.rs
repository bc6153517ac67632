/**
 * Responsibility
 * - what a repository reports upward (all of it is a data-access failure)
 */
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{entity} {id} does not exist")]
    NotFound { entity: &'static str, id: i64 },
    #[error("{entity} {id} is already active")]
    AlreadyActive { entity: &'static str, id: i64 },
    #[error("invalid {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}
