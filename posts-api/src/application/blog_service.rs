use std::sync::Arc;

use tracing::info;

use crate::data::post_repository::{NewPost, PostPatch, PostRepository};
use crate::domain::error::DomainError;
use crate::domain::post::{
    CreatePostRequest, Post, PostId, UpdatePostRequest, next_revision_time, now,
};

pub(crate) struct BlogService {
    repo: Arc<dyn PostRepository>,
}

impl BlogService {
    pub(crate) fn new(repo: Arc<dyn PostRepository>) -> Self {
        Self { repo }
    }

    pub(crate) async fn list_posts(&self) -> Result<Vec<Post>, DomainError> {
        self.repo.list_posts().await
    }

    pub(crate) async fn get_post(&self, id: PostId) -> Result<Post, DomainError> {
        self.repo
            .get_post(id)
            .await?
            .ok_or(DomainError::NotFound(id))
    }

    pub(crate) async fn create_post(&self, req: CreatePostRequest) -> Result<Post, DomainError> {
        let req = req.validate()?;
        let created_at = now();

        let new_post = NewPost {
            title: req.title,
            content: req.content,
            author: req.author,
            created_at,
            updated_at: created_at,
        };
        let post = self.repo.create_post(new_post).await?;
        info!(post_id = %post.id, "post created");
        Ok(post)
    }

    /// The stored post is loaded first so a missing post is reported before
    /// writing. The store still clamps `updatedAt` past whatever it holds at
    /// write time, so a concurrent update cannot make it go backwards.
    pub(crate) async fn update_post(
        &self,
        id: PostId,
        req: UpdatePostRequest,
    ) -> Result<Post, DomainError> {
        let req = req.validate()?;
        let current = self.get_post(id).await?;

        let patch = PostPatch {
            title: req.title,
            content: req.content,
            author: req.author,
            updated_at: next_revision_time(current.updated_at),
        };
        let post = self
            .repo
            .update_post(id, patch)
            .await?
            .ok_or(DomainError::NotFound(id))?;
        info!(post_id = %id, "post updated");
        Ok(post)
    }

    pub(crate) async fn delete_post(&self, id: PostId) -> Result<(), DomainError> {
        if !self.repo.delete_post(id).await? {
            return Err(DomainError::NotFound(id));
        }
        info!(post_id = %id, "post deleted");
        Ok(())
    }
}
