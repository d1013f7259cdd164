use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use crate::data::post_repository::{NewPost, PostPatch, PostRepository};
use crate::domain::error::DomainError;
use crate::domain::post::{Post, PostId, advance_revision_time};

/// Process-local store. Ids are ObjectIds, so key order is creation order.
#[derive(Debug, Default)]
pub(crate) struct InMemoryPostRepository {
    posts: RwLock<BTreeMap<PostId, Post>>,
}

impl InMemoryPostRepository {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: PoisonError<T>) -> DomainError {
    DomainError::Unavailable("in-memory store lock poisoned".to_string())
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn list_posts(&self) -> Result<Vec<Post>, DomainError> {
        let posts = self.posts.read().map_err(poisoned)?;
        let mut listed: Vec<Post> = posts.values().cloned().collect();
        listed.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(listed)
    }

    async fn get_post(&self, id: PostId) -> Result<Option<Post>, DomainError> {
        let posts = self.posts.read().map_err(poisoned)?;
        Ok(posts.get(&id).cloned())
    }

    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError> {
        let post = Post {
            id: PostId::generate(),
            title: input.title,
            content: input.content,
            author: input.author,
            created_at: input.created_at,
            updated_at: input.updated_at,
        };

        let mut posts = self.posts.write().map_err(poisoned)?;
        posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update_post(&self, id: PostId, patch: PostPatch) -> Result<Option<Post>, DomainError> {
        let mut posts = self.posts.write().map_err(poisoned)?;
        let Some(post) = posts.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(title) = patch.title {
            post.title = title;
        }
        if let Some(content) = patch.content {
            post.content = content;
        }
        if let Some(author) = patch.author {
            post.author = author;
        }
        post.updated_at = advance_revision_time(patch.updated_at, post.updated_at);

        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, id: PostId) -> Result<bool, DomainError> {
        let mut posts = self.posts.write().map_err(poisoned)?;
        Ok(posts.remove(&id).is_some())
    }
}
