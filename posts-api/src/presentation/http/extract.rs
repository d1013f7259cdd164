use axum::{
    extract::{FromRequest, FromRequestParts, Path},
    http::request::Parts,
};

use crate::domain::error::DomainError;
use crate::domain::post::PostId;
use crate::presentation::http::app_error::AppError;

/// `axum::Json` whose rejections render as JSON error bodies.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub(crate) struct JsonBody<T>(pub(crate) T);

/// Well-formed `{id}` path segment. Runs before any body extraction, so a
/// malformed id is rejected without touching the store.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PostIdParam(pub(crate) PostId);

impl<S> FromRequestParts<S> for PostIdParam
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| DomainError::InvalidIdentifier(rejection.body_text()))?;
        Ok(Self(raw.parse()?))
    }
}
