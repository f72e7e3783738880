//! Domain entities mirrored from persistent storage.

use serde::Serialize;
use time::OffsetDateTime;

pub type PostId = i64;
pub type UserId = i64;
pub type TagId = i64;

/// One blog post as stored, including the denormalized author name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRecord {
    pub id: PostId,
    pub owner_id: UserId,
    pub title: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
    pub view_count: u64,
    pub author_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagRecord {
    pub id: TagId,
    pub name: String,
}
