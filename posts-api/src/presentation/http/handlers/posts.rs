use std::borrow::Cow;

use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::domain::error::DomainError;
use crate::domain::post::{
    CreatePostRequest, FieldViolation, Post, UpdatePostRequest, normalize_author,
    normalize_content, normalize_title,
};
use crate::presentation::AppState;
use crate::presentation::http::app_error::{AppResult, ErrorResponseDto};
use crate::presentation::http::extract::{JsonBody, PostIdParam};

/// Raw JSON values are kept so that a wrong type is reported per field
/// instead of failing the whole body. `null` deserializes as absent.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct CreatePostDto {
    #[schema(value_type = String, min_length = 5, example = "Hello World")]
    #[validate(
        required(message = "Title is required."),
        custom(function = "validate_title")
    )]
    pub(crate) title: Option<Value>,
    #[schema(value_type = String, min_length = 20)]
    #[validate(
        required(message = "Content is required."),
        custom(function = "validate_content")
    )]
    pub(crate) content: Option<Value>,
    #[schema(value_type = String, example = "Ann")]
    #[validate(
        required(message = "Author is required."),
        custom(function = "validate_author")
    )]
    pub(crate) author: Option<Value>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct UpdatePostDto {
    #[schema(value_type = Option<String>, min_length = 5)]
    #[validate(custom(function = "validate_title"))]
    pub(crate) title: Option<Value>,
    #[schema(value_type = Option<String>, min_length = 20)]
    #[validate(custom(function = "validate_content"))]
    pub(crate) content: Option<Value>,
    #[schema(value_type = Option<String>)]
    #[validate(custom(function = "validate_author"))]
    pub(crate) author: Option<Value>,
}

impl UpdatePostDto {
    fn is_blank(&self) -> bool {
        [&self.title, &self.content, &self.author]
            .into_iter()
            .all(|field| match field {
                None => true,
                Some(Value::String(text)) => text.is_empty(),
                Some(_) => false,
            })
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PostDto {
    #[schema(example = "65a1f0c2b4d3e2a1f0c2b4d3")]
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) author: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct MessageDto {
    pub(crate) message: String,
}

impl From<Post> for PostDto {
    fn from(post: Post) -> Self {
        Self {
            id: post.id.to_string(),
            title: post.title,
            content: post.content,
            author: post.author,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

fn validate_title(value: &Value) -> Result<(), ValidationError> {
    validate_text(value, "Title", normalize_title)
}

fn validate_content(value: &Value) -> Result<(), ValidationError> {
    validate_text(value, "Content", normalize_content)
}

fn validate_author(value: &Value) -> Result<(), ValidationError> {
    validate_text(value, "Author", normalize_author)
}

fn validate_text(
    value: &Value,
    label: &str,
    normalize: fn(&str) -> Result<String, FieldViolation>,
) -> Result<(), ValidationError> {
    match value {
        Value::String(text) if text.is_empty() => {
            Err(field_error("required", format!("{label} is required.")))
        }
        Value::String(text) => normalize(text)
            .map(|_| ())
            .map_err(|violation| field_error("length", violation.message)),
        _ => Err(field_error("type", format!("{label} must be a string."))),
    }
}

fn field_error(code: &'static str, message: String) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Owned(message))
}

fn into_text(value: Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(text)) => Some(text),
        _ => None,
    }
}

#[utoipa::path(
    get,
    path = "/api/posts",
    tag = "posts",
    responses(
        (status = 200, description = "All posts, oldest first; empty when there are none", body = [PostDto]),
        (status = 500, description = "Store unavailable", body = ErrorResponseDto)
    )
)]
pub(crate) async fn list_posts(
    State(state): State<AppState>,
) -> AppResult<(StatusCode, Json<Vec<PostDto>>)> {
    let posts = state.blog_service.list_posts().await?;

    Ok((
        StatusCode::OK,
        Json(posts.into_iter().map(PostDto::from).collect()),
    ))
}

#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    tag = "posts",
    params(
        ("id" = String, Path, description = "Post id (24-char hex ObjectId)")
    ),
    responses(
        (status = 200, description = "Post found", body = PostDto),
        (status = 400, description = "Malformed id", body = ErrorResponseDto),
        (status = 404, description = "Post not found", body = ErrorResponseDto),
        (status = 500, description = "Store unavailable", body = ErrorResponseDto)
    )
)]
pub(crate) async fn get_post(
    State(state): State<AppState>,
    PostIdParam(id): PostIdParam,
) -> AppResult<(StatusCode, Json<PostDto>)> {
    let post = state.blog_service.get_post(id).await?;

    Ok((StatusCode::OK, Json(PostDto::from(post))))
}

#[utoipa::path(
    post,
    path = "/api/posts",
    tag = "posts",
    request_body = CreatePostDto,
    responses(
        (status = 201, description = "Post created", body = PostDto),
        (status = 400, description = "Missing or invalid fields", body = ErrorResponseDto),
        (status = 500, description = "Store unavailable", body = ErrorResponseDto)
    )
)]
pub(crate) async fn create_post(
    State(state): State<AppState>,
    JsonBody(dto): JsonBody<CreatePostDto>,
) -> AppResult<(StatusCode, Json<PostDto>)> {
    dto.validate()?;
    let req = CreatePostRequest {
        title: into_text(dto.title).unwrap_or_default(),
        content: into_text(dto.content).unwrap_or_default(),
        author: into_text(dto.author).unwrap_or_default(),
    };

    let post = state.blog_service.create_post(req).await?;
    Ok((StatusCode::CREATED, Json(PostDto::from(post))))
}

#[utoipa::path(
    patch,
    path = "/api/posts/{id}",
    tag = "posts",
    params(
        ("id" = String, Path, description = "Post id (24-char hex ObjectId)")
    ),
    request_body = UpdatePostDto,
    responses(
        (status = 200, description = "Post updated", body = PostDto),
        (status = 400, description = "Malformed id, empty or invalid payload", body = ErrorResponseDto),
        (status = 404, description = "Post not found", body = ErrorResponseDto),
        (status = 500, description = "Store unavailable", body = ErrorResponseDto)
    )
)]
pub(crate) async fn update_post(
    State(state): State<AppState>,
    PostIdParam(id): PostIdParam,
    JsonBody(dto): JsonBody<UpdatePostDto>,
) -> AppResult<(StatusCode, Json<PostDto>)> {
    if dto.is_blank() {
        return Err(DomainError::EmptyUpdate.into());
    }
    dto.validate()?;
    let req = UpdatePostRequest {
        title: into_text(dto.title),
        content: into_text(dto.content),
        author: into_text(dto.author),
    };

    let post = state.blog_service.update_post(id, req).await?;
    Ok((StatusCode::OK, Json(PostDto::from(post))))
}

#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    tag = "posts",
    params(
        ("id" = String, Path, description = "Post id (24-char hex ObjectId)")
    ),
    responses(
        (status = 200, description = "Post deleted", body = MessageDto),
        (status = 400, description = "Malformed id", body = ErrorResponseDto),
        (status = 404, description = "Post not found", body = ErrorResponseDto),
        (status = 500, description = "Store unavailable", body = ErrorResponseDto)
    )
)]
pub(crate) async fn delete_post(
    State(state): State<AppState>,
    PostIdParam(id): PostIdParam,
) -> AppResult<(StatusCode, Json<MessageDto>)> {
    state.blog_service.delete_post(id).await?;

    Ok((
        StatusCode::OK,
        Json(MessageDto {
            message: "Post deleted.".to_string(),
        }),
    ))
}
