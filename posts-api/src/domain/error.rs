use thiserror::Error;

use super::post::{FieldViolation, PostId};

#[derive(Debug, Error)]
pub(crate) enum DomainError {
    #[error("invalid post id: {0}")]
    InvalidIdentifier(String),

    #[error("validation failed for {} field(s)", .0.len())]
    InvalidFields(Vec<FieldViolation>),

    #[error("update payload has no fields")]
    EmptyUpdate,

    #[error("post not found: {0}")]
    NotFound(PostId),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl DomainError {
    pub(crate) fn invalid_field(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidFields(vec![FieldViolation::new(field, message)])
    }
}
