use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::error::DomainError;
use crate::domain::post::{Post, PostId};

#[derive(Debug, Clone)]
pub(crate) struct NewPost {
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) author: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

/// Already-validated field changes. Absent fields are not written.
#[derive(Debug, Clone)]
pub(crate) struct PostPatch {
    pub(crate) title: Option<String>,
    pub(crate) content: Option<String>,
    pub(crate) author: Option<String>,
    /// Proposed revision time. The store persists
    /// `advance_revision_time(updated_at, <stored updatedAt>)` atomically.
    pub(crate) updated_at: DateTime<Utc>,
}

/// Document store holding posts. The store assigns ids on insert and keeps
/// each single-document write atomic. `update_post` resolves `updatedAt`
/// against the stored value inside that write.
#[async_trait]
pub(crate) trait PostRepository: Send + Sync {
    async fn list_posts(&self) -> Result<Vec<Post>, DomainError>;
    async fn get_post(&self, id: PostId) -> Result<Option<Post>, DomainError>;
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError>;
    async fn update_post(&self, id: PostId, patch: PostPatch) -> Result<Option<Post>, DomainError>;
    async fn delete_post(&self, id: PostId) -> Result<bool, DomainError>;

    /// Releases the connection. Called once after the server has drained.
    async fn close(&self) {}
}
