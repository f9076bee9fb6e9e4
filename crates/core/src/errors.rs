use thiserror::Error;

use crate::validation::RowRejection;

/// Session-level failures. Expired and undecodable tokens collapse into the
/// same bucket because callers treat both as "log in again".
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("no bearer token is present")]
    Missing,
    #[error("bearer token is expired or undecodable")]
    Invalid,
}

/// Everything a workflow screen can surface to the user. Nothing here is
/// fatal: remote calls are terminal boundaries and their failures are
/// converted at the call site.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("role `{role}` may not open this screen (requires `{required}`)")]
    Forbidden { role: String, required: String },
    #[error(transparent)]
    Validation(#[from] RowRejection),
    #[error("no action is allowed at step {step} of this flow")]
    ActionNotAllowed { step: i64 },
    #[error("submission `{id}` was not found")]
    NotFound { id: String },
    #[error("remote call failed with status {status}: {message}")]
    Remote { status: u16, message: String },
    #[error("invalid data format")]
    DataShape,
}
