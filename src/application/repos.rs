//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{PostId, PostRecord, TagId, TagRecord};
use crate::domain::posts::{PostDraft, PostEdit};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity {
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// `Ok(None)` when no post has this id.
    async fn find_by_id(&self, id: PostId) -> Result<Option<PostRecord>, RepoError>;

    /// Newest first.
    async fn list_posts(&self, limit: u32, offset: u64) -> Result<Vec<PostRecord>, RepoError>;

    /// Case-insensitive substring match over title and content, newest first.
    async fn search_posts(&self, keyword: &str) -> Result<Vec<PostRecord>, RepoError>;

    /// Newest first.
    async fn list_posts_by_tag(&self, tag_id: TagId) -> Result<Vec<PostRecord>, RepoError>;

    async fn list_most_viewed(&self, limit: u32) -> Result<Vec<PostRecord>, RepoError>;

    async fn count_posts(&self) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    /// Store a new post; the returned record carries the assigned id and timestamps.
    async fn create_post(&self, draft: &PostDraft) -> Result<PostRecord, RepoError>;

    /// `Ok(false)` when no row was updated.
    async fn update_post(&self, edit: &PostEdit) -> Result<bool, RepoError>;

    /// Delete the post with its tag links and comments in one transaction.
    async fn delete_post(&self, id: PostId) -> Result<bool, RepoError>;

    async fn increment_view_count(&self, id: PostId) -> Result<(), RepoError>;
}

#[async_trait]
pub trait TagsRepo: Send + Sync {
    async fn find_by_name(&self, name: &str) -> Result<Option<TagRecord>, RepoError>;

    async fn create_tag(&self, name: &str) -> Result<TagRecord, RepoError>;

    /// Linking a tag that is already attached is not an error.
    async fn attach_tag(&self, post_id: PostId, tag_id: TagId) -> Result<(), RepoError>;
}
