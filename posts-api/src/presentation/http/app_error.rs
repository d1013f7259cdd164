use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::domain::error::DomainError;
use crate::domain::post::FieldViolation;

pub(crate) const INVALID_ID_MESSAGE: &str = "Invalid post ID. Please provide a valid ObjectId.";
pub(crate) const INVALID_FIELDS_MESSAGE: &str = "Please add all fields";
pub(crate) const EMPTY_UPDATE_MESSAGE: &str =
    "Please provide at least one of title, content, or author.";
pub(crate) const INTERNAL_MESSAGE: &str = "Internal server error.";
const MALFORMED_BODY_MESSAGE: &str = "Request body must be a valid JSON object.";
const BODY_TOO_LARGE_MESSAGE: &str = "Request body is too large.";

/// Order in which field errors are reported.
const FIELD_ORDER: [&str; 3] = ["title", "content", "author"];

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("malformed request body: {0}")]
    Body(#[from] JsonRejection),
}

pub(crate) type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct FieldErrorDto {
    pub(crate) field: String,
    pub(crate) message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ErrorResponseDto {
    pub(crate) message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) errors: Vec<FieldErrorDto>,
}

impl ErrorResponseDto {
    fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            errors: Vec::new(),
        }
    }

    fn invalid_fields(mut errors: Vec<FieldErrorDto>) -> Self {
        errors.sort_by_key(|err| field_rank(&err.field));
        Self {
            message: INVALID_FIELDS_MESSAGE.to_string(),
            errors,
        }
    }
}

impl From<FieldViolation> for FieldErrorDto {
    fn from(violation: FieldViolation) -> Self {
        Self {
            field: violation.field.to_string(),
            message: violation.message,
        }
    }
}

fn field_rank(field: &str) -> usize {
    FIELD_ORDER
        .iter()
        .position(|known| *known == field)
        .unwrap_or(FIELD_ORDER.len())
}

fn validation_field_errors(errors: &ValidationErrors) -> Vec<FieldErrorDto> {
    errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| FieldErrorDto {
                field: field.to_string(),
                message: err
                    .message
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| err.code.to_string()),
            })
        })
        .collect()
}

fn domain_response(err: DomainError) -> (StatusCode, ErrorResponseDto) {
    match err {
        DomainError::InvalidIdentifier(_) => (
            StatusCode::BAD_REQUEST,
            ErrorResponseDto::message(INVALID_ID_MESSAGE),
        ),
        DomainError::InvalidFields(violations) => (
            StatusCode::BAD_REQUEST,
            ErrorResponseDto::invalid_fields(
                violations.into_iter().map(FieldErrorDto::from).collect(),
            ),
        ),
        DomainError::EmptyUpdate => (
            StatusCode::BAD_REQUEST,
            ErrorResponseDto::message(EMPTY_UPDATE_MESSAGE),
        ),
        DomainError::NotFound(id) => (
            StatusCode::NOT_FOUND,
            ErrorResponseDto::message(format!("Post with ID {id} not found.")),
        ),
        DomainError::Unavailable(cause) => {
            error!("post store failure: {cause}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponseDto::message(INTERNAL_MESSAGE),
            )
        }
    }
}

fn body_response(rejection: JsonRejection) -> (StatusCode, ErrorResponseDto) {
    let status = rejection.status();
    let message = match status {
        StatusCode::UNSUPPORTED_MEDIA_TYPE => rejection.body_text(),
        StatusCode::PAYLOAD_TOO_LARGE => BODY_TOO_LARGE_MESSAGE.to_string(),
        _ => MALFORMED_BODY_MESSAGE.to_string(),
    };
    let status = match status {
        StatusCode::UNSUPPORTED_MEDIA_TYPE | StatusCode::PAYLOAD_TOO_LARGE => status,
        _ => StatusCode::BAD_REQUEST,
    };
    (status, ErrorResponseDto::message(message))
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Domain(err) => domain_response(err),
            AppError::Validation(err) => (
                StatusCode::BAD_REQUEST,
                ErrorResponseDto::invalid_fields(validation_field_errors(&err)),
            ),
            AppError::Body(rejection) => body_response(rejection),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use validator::{ValidationError, ValidationErrors};

    use super::{AppError, EMPTY_UPDATE_MESSAGE, ErrorResponseDto, INTERNAL_MESSAGE};
    use crate::domain::error::DomainError;
    use crate::domain::post::{FieldViolation, PostId};

    async fn render(err: AppError) -> (StatusCode, ErrorResponseDto) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body must be readable");
        let body = serde_json::from_slice(&bytes).expect("body must be JSON");
        (status, body)
    }

    #[tokio::test]
    async fn not_found_names_the_post_id() {
        let id: PostId = "65a1f0c2b4d3e2a1f0c2b4d3".parse().expect("valid id");
        let (status, body) = render(DomainError::NotFound(id).into()).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body.message,
            "Post with ID 65a1f0c2b4d3e2a1f0c2b4d3 not found."
        );
    }

    #[tokio::test]
    async fn empty_update_is_bad_request() {
        let (status, body) = render(DomainError::EmptyUpdate.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.message, EMPTY_UPDATE_MESSAGE);
        assert!(body.errors.is_empty());
    }

    #[tokio::test]
    async fn store_failure_hides_internal_cause() {
        let err = DomainError::Unavailable("connection refused at 10.0.0.7".to_string());
        let (status, body) = render(err.into()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.message, INTERNAL_MESSAGE);
        assert!(!body.message.contains("10.0.0.7"));
    }

    #[tokio::test]
    async fn domain_field_violations_are_listed_in_field_order() {
        let err = DomainError::InvalidFields(vec![
            FieldViolation::new("author", "Author is required."),
            FieldViolation::new("title", "Title must be at least 5 characters long"),
        ]);
        let (status, body) = render(err.into()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let fields: Vec<&str> = body.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["title", "author"]);
    }

    #[tokio::test]
    async fn validator_errors_use_their_messages() {
        let mut errors = ValidationErrors::new();
        errors.add(
            "content",
            ValidationError::new("type").with_message(Cow::Borrowed("Content must be a string.")),
        );
        errors.add(
            "title",
            ValidationError::new("required").with_message(Cow::Borrowed("Title is required.")),
        );

        let (status, body) = render(errors.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.errors.len(), 2);
        assert_eq!(body.errors[0].field, "title");
        assert_eq!(body.errors[0].message, "Title is required.");
        assert_eq!(body.errors[1].message, "Content must be a string.");
    }
}
