use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::error::DomainError;

pub(crate) const TITLE_MIN_CHARS: usize = 5;
pub(crate) const CONTENT_MIN_CHARS: usize = 20;

/// Store key of a post. Its text form is 24 hex characters, so a malformed
/// id can be rejected without asking the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub(crate) struct PostId(ObjectId);

impl PostId {
    pub(crate) fn generate() -> Self {
        Self(ObjectId::new())
    }

    pub(crate) fn object_id(&self) -> ObjectId {
        self.0
    }
}

impl From<ObjectId> for PostId {
    fn from(oid: ObjectId) -> Self {
        Self(oid)
    }
}

impl FromStr for PostId {
    type Err = DomainError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        ObjectId::parse_str(raw)
            .map(Self)
            .map_err(|_| DomainError::InvalidIdentifier(raw.to_string()))
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_hex())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FieldViolation {
    pub(crate) field: &'static str,
    pub(crate) message: String,
}

impl FieldViolation {
    pub(crate) fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Post {
    pub(crate) id: PostId,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) author: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl Post {
    /// Rebuilds a post from stored values, re-checking every field rule.
    pub(crate) fn new(
        id: PostId,
        title: impl Into<String>,
        content: impl Into<String>,
        author: impl Into<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let fields = CreatePostRequest {
            title: title.into(),
            content: content.into(),
            author: author.into(),
        }
        .validate()?;

        if updated_at < created_at {
            return Err(DomainError::invalid_field(
                "updatedAt",
                "must not be earlier than createdAt",
            ));
        }

        Ok(Self {
            id,
            title: fields.title,
            content: fields.content,
            author: fields.author,
            created_at,
            updated_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CreatePostRequest {
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) author: String,
}

impl CreatePostRequest {
    /// Normalizes all fields, reporting every violated one.
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        let mut violations = Vec::new();
        let title = collect(normalize_title(&self.title), &mut violations);
        let content = collect(normalize_content(&self.content), &mut violations);
        let author = collect(normalize_author(&self.author), &mut violations);

        match (title, content, author) {
            (Some(title), Some(content), Some(author)) => Ok(Self {
                title,
                content,
                author,
            }),
            _ => Err(DomainError::InvalidFields(violations)),
        }
    }
}

/// Allow-list of mutable fields; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct UpdatePostRequest {
    pub(crate) title: Option<String>,
    pub(crate) content: Option<String>,
    pub(crate) author: Option<String>,
}

impl UpdatePostRequest {
    pub(crate) fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.author.is_none()
    }

    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        if self.is_empty() {
            return Err(DomainError::EmptyUpdate);
        }

        let mut violations = Vec::new();
        let title = self
            .title
            .and_then(|raw| collect(normalize_title(&raw), &mut violations));
        let content = self
            .content
            .and_then(|raw| collect(normalize_content(&raw), &mut violations));
        let author = self
            .author
            .and_then(|raw| collect(normalize_author(&raw), &mut violations));

        if !violations.is_empty() {
            return Err(DomainError::InvalidFields(violations));
        }
        Ok(Self {
            title,
            content,
            author,
        })
    }
}

/// Current time at the store's millisecond precision.
pub(crate) fn now() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

/// `updatedAt` for a new revision; always later than `previous`.
pub(crate) fn next_revision_time(previous: DateTime<Utc>) -> DateTime<Utc> {
    advance_revision_time(now(), previous)
}

/// Time actually stored for a revision proposed at `proposed` over a post
/// currently stamped `stored`. Stores apply this inside the write, so an
/// overlapping update computed from an older read cannot move it backwards.
pub(crate) fn advance_revision_time(
    proposed: DateTime<Utc>,
    stored: DateTime<Utc>,
) -> DateTime<Utc> {
    proposed.max(stored + Duration::milliseconds(1))
}

pub(crate) fn normalize_title(title: &str) -> Result<String, FieldViolation> {
    let title = title.trim();
    if title.chars().count() < TITLE_MIN_CHARS {
        return Err(FieldViolation::new(
            "title",
            format!("Title must be at least {TITLE_MIN_CHARS} characters long"),
        ));
    }
    Ok(title.to_string())
}

pub(crate) fn normalize_content(content: &str) -> Result<String, FieldViolation> {
    if content.chars().count() < CONTENT_MIN_CHARS {
        return Err(FieldViolation::new(
            "content",
            format!("Content must be at least {CONTENT_MIN_CHARS} characters long"),
        ));
    }
    Ok(content.to_string())
}

pub(crate) fn normalize_author(author: &str) -> Result<String, FieldViolation> {
    let author = author.trim();
    if author.is_empty() {
        return Err(FieldViolation::new("author", "Author is required."));
    }
    Ok(author.to_string())
}

fn collect(
    result: Result<String, FieldViolation>,
    violations: &mut Vec<FieldViolation>,
) -> Option<String> {
    result.map_err(|violation| violations.push(violation)).ok()
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::{
        CreatePostRequest, DomainError, Post, PostId, UpdatePostRequest, advance_revision_time,
        next_revision_time, now,
    };

    fn content(len: usize) -> String {
        "x".repeat(len)
    }

    #[test]
    fn post_id_accepts_object_id_hex() {
        let id: PostId = "65a1f0c2b4d3e2a1f0c2b4d3".parse().expect("must parse");
        assert_eq!(id.to_string(), "65a1f0c2b4d3e2a1f0c2b4d3");
    }

    #[test]
    fn post_id_rejects_malformed_input() {
        for raw in ["", "123", "not-an-object-id", "65a1f0c2b4d3e2a1f0c2b4dz"] {
            let err = raw.parse::<PostId>().expect_err("must be rejected");
            assert!(matches!(err, DomainError::InvalidIdentifier(ref s) if s == raw));
        }
    }

    #[test]
    fn create_request_trims_title_and_author_but_keeps_content() {
        let body = format!("  {}  ", content(20));
        let req = CreatePostRequest {
            title: "  Hello World  ".to_string(),
            content: body.clone(),
            author: " Ann ".to_string(),
        };

        let validated = req.validate().expect("must validate");
        assert_eq!(validated.title, "Hello World");
        assert_eq!(validated.content, body);
        assert_eq!(validated.author, "Ann");
    }

    #[test]
    fn create_request_reports_every_violated_field() {
        let req = CreatePostRequest {
            title: "abc".to_string(),
            content: content(19),
            author: "   ".to_string(),
        };

        let fields = violated_fields(req.validate().expect_err("must fail"));
        assert_eq!(fields, vec!["title", "content", "author"]);
    }

    #[test]
    fn content_boundary_is_twenty_chars() {
        let short = CreatePostRequest {
            title: "Hello World".to_string(),
            content: content(19),
            author: "Ann".to_string(),
        };
        assert_eq!(
            violated_fields(short.validate().expect_err("19 chars must fail")),
            vec!["content"]
        );

        let exact = CreatePostRequest {
            title: "Hello World".to_string(),
            content: content(20),
            author: "Ann".to_string(),
        };
        exact.validate().expect("20 chars must pass");
    }

    #[test]
    fn title_length_counts_chars_not_bytes() {
        let req = CreatePostRequest {
            title: "ßßßßß".to_string(),
            content: content(20),
            author: "Ann".to_string(),
        };
        req.validate().expect("five multibyte chars must pass");
    }

    #[test]
    fn update_request_without_fields_is_empty_update() {
        let err = UpdatePostRequest::default()
            .validate()
            .expect_err("must fail");
        assert!(matches!(err, DomainError::EmptyUpdate));
    }

    #[test]
    fn update_request_validates_only_present_fields() {
        let req = UpdatePostRequest {
            title: Some("  Updated  ".to_string()),
            ..Default::default()
        };
        let validated = req.validate().expect("must validate");
        assert_eq!(validated.title.as_deref(), Some("Updated"));
        assert!(validated.content.is_none());
        assert!(validated.author.is_none());

        let bad = UpdatePostRequest {
            content: Some("too short".to_string()),
            author: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(
            violated_fields(bad.validate().expect_err("must fail")),
            vec!["content", "author"]
        );
    }

    #[test]
    fn post_new_rejects_updated_before_created() {
        let updated_at = Utc::now();
        let created_at = updated_at + Duration::seconds(1);

        let err = Post::new(
            PostId::generate(),
            "Title",
            content(20),
            "Ann",
            created_at,
            updated_at,
        )
        .expect_err("updatedAt < createdAt must fail");
        assert_eq!(violated_fields(err), vec!["updatedAt"]);
    }

    #[test]
    fn next_revision_time_is_strictly_later() {
        let future = now() + Duration::seconds(5);
        assert!(next_revision_time(future) > future);

        let past = now() - Duration::seconds(5);
        assert!(next_revision_time(past) > past);
    }

    #[test]
    fn advance_revision_time_never_goes_back() {
        let stored = now();
        let stale = stored - Duration::milliseconds(20);
        assert_eq!(
            advance_revision_time(stale, stored),
            stored + Duration::milliseconds(1)
        );

        let fresh = stored + Duration::milliseconds(20);
        assert_eq!(advance_revision_time(fresh, stored), fresh);
    }

    fn violated_fields(err: DomainError) -> Vec<&'static str> {
        match err {
            DomainError::InvalidFields(violations) => {
                violations.into_iter().map(|v| v.field).collect()
            }
            other => panic!("expected DomainError::InvalidFields, got {other:?}"),
        }
    }
}
