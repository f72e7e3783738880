use async_trait::async_trait;

use crate::application::repos::{RepoError, TagsRepo};
use crate::domain::entities::{PostId, TagId, TagRecord};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct TagRow {
    id: i64,
    name: String,
}

impl From<TagRow> for TagRecord {
    fn from(row: TagRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

#[async_trait]
impl TagsRepo for PostgresRepositories {
    async fn find_by_name(&self, name: &str) -> Result<Option<TagRecord>, RepoError> {
        let row = sqlx::query_as::<_, TagRow>("SELECT id, name FROM tags WHERE name = $1")
            .bind(name)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(TagRecord::from))
    }

    async fn create_tag(&self, name: &str) -> Result<TagRecord, RepoError> {
        let row =
            sqlx::query_as::<_, TagRow>("INSERT INTO tags (name) VALUES ($1) RETURNING id, name")
                .bind(name)
                .fetch_one(self.pool())
                .await
                .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn attach_tag(&self, post_id: PostId, tag_id: TagId) -> Result<(), RepoError> {
        sqlx::query(
            "INSERT INTO post_tags (post_id, tag_id) VALUES ($1, $2) \
             ON CONFLICT (post_id, tag_id) DO NOTHING",
        )
        .bind(post_id)
        .bind(tag_id)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }
}
