use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{self, Document, doc};
use mongodb::options::ReturnDocument;
use mongodb::{Client, Collection, Database, IndexModel};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::data::post_repository::{NewPost, PostPatch, PostRepository};
use crate::domain::error::DomainError;
use crate::domain::post::{Post, PostId};

const COLLECTION: &str = "posts";

#[derive(Debug, Clone)]
pub(crate) struct MongoPostRepository {
    client: Client,
    posts: Collection<PostDocument>,
}

impl MongoPostRepository {
    pub(crate) fn new(client: Client, database: &Database) -> Self {
        Self {
            client,
            posts: database.collection(COLLECTION),
        }
    }

    /// Index backing the list order.
    pub(crate) async fn ensure_indexes(&self) -> Result<(), DomainError> {
        let index = IndexModel::builder()
            .keys(doc! { "createdAt": 1, "_id": 1 })
            .build();
        self.posts
            .create_index(index)
            .await
            .map_err(map_post_db_error)?;
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PostDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    title: String,
    content: String,
    author: String,
    #[serde(rename = "createdAt")]
    created_at: bson::DateTime,
    #[serde(rename = "updatedAt")]
    updated_at: bson::DateTime,
}

#[async_trait]
impl PostRepository for MongoPostRepository {
    async fn list_posts(&self) -> Result<Vec<Post>, DomainError> {
        let documents: Vec<PostDocument> = self
            .posts
            .find(doc! {})
            .sort(doc! { "createdAt": 1, "_id": 1 })
            .await
            .map_err(map_post_db_error)?
            .try_collect()
            .await
            .map_err(map_post_db_error)?;

        documents.into_iter().map(map_document_to_post).collect()
    }

    async fn get_post(&self, id: PostId) -> Result<Option<Post>, DomainError> {
        let document = self
            .posts
            .find_one(doc! { "_id": id.object_id() })
            .await
            .map_err(map_post_db_error)?;

        document.map(map_document_to_post).transpose()
    }

    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError> {
        let document = PostDocument {
            id: ObjectId::new(),
            title: input.title,
            content: input.content,
            author: input.author,
            created_at: to_bson_datetime(input.created_at),
            updated_at: to_bson_datetime(input.updated_at),
        };

        self.posts
            .insert_one(&document)
            .await
            .map_err(map_post_db_error)?;

        map_document_to_post(document)
    }

    async fn update_post(&self, id: PostId, patch: PostPatch) -> Result<Option<Post>, DomainError> {
        let document = self
            .posts
            .find_one_and_update(doc! { "_id": id.object_id() }, update_pipeline(patch))
            .return_document(ReturnDocument::After)
            .await
            .map_err(map_post_db_error)?;

        document.map(map_document_to_post).transpose()
    }

    async fn delete_post(&self, id: PostId) -> Result<bool, DomainError> {
        let result = self
            .posts
            .delete_one(doc! { "_id": id.object_id() })
            .await
            .map_err(map_post_db_error)?;

        Ok(result.deleted_count > 0)
    }

    async fn close(&self) {
        self.client.clone().shutdown().await;
    }
}

/// Single-stage update pipeline. `updatedAt` is resolved against the stored
/// value inside the write, so it never moves backwards. String values are
/// wrapped in `$literal` because pipeline stages treat a leading `$` as a
/// field path.
fn update_pipeline(patch: PostPatch) -> Vec<Document> {
    let mut set = doc! {
        "updatedAt": {
            "$max": [to_bson_datetime(patch.updated_at), { "$add": ["$updatedAt", 1] }]
        }
    };
    let fields = [
        ("title", patch.title),
        ("content", patch.content),
        ("author", patch.author),
    ];
    for (field, value) in fields {
        if let Some(value) = value {
            set.insert(field, doc! { "$literal": value });
        }
    }

    vec![doc! { "$set": set }]
}

fn to_bson_datetime(at: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(at.timestamp_millis())
}

fn from_bson_datetime(at: bson::DateTime) -> Result<DateTime<Utc>, DomainError> {
    DateTime::from_timestamp_millis(at.timestamp_millis())
        .ok_or_else(|| DomainError::Unavailable(format!("timestamp out of range: {at}")))
}

fn map_document_to_post(document: PostDocument) -> Result<Post, DomainError> {
    let id = document.id;
    Post::new(
        PostId::from(id),
        document.title,
        document.content,
        document.author,
        from_bson_datetime(document.created_at)?,
        from_bson_datetime(document.updated_at)?,
    )
    .map_err(|err| {
        error!(post_id = %id, "stored post violates field rules: {err}");
        DomainError::Unavailable(err.to_string())
    })
}

fn map_post_db_error(err: mongodb::error::Error) -> DomainError {
    DomainError::Unavailable(err.to_string())
}
