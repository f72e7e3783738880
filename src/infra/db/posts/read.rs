use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};

use crate::application::repos::{PostsRepo, RepoError};
use crate::domain::entities::{PostId, PostRecord, TagId};

use super::super::{POST_COLUMNS, POST_FROM, PostgresRepositories};
use super::types::{PostRow, into_records};
use crate::infra::db::map_sqlx_error;

impl PostgresRepositories {
    fn select_posts<'q>() -> QueryBuilder<'q, Postgres> {
        QueryBuilder::new(format!("SELECT {POST_COLUMNS} {POST_FROM} "))
    }

    async fn fetch_posts(
        &self,
        mut qb: QueryBuilder<'_, Postgres>,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let rows = qb
            .build_query_as::<PostRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        into_records(rows)
    }
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn find_by_id(&self, id: PostId) -> Result<Option<PostRecord>, RepoError> {
        let mut qb = Self::select_posts();
        qb.push(" WHERE p.id = ");
        qb.push_bind(id);

        let row = qb
            .build_query_as::<PostRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.map(PostRecord::try_from).transpose()
    }

    async fn list_posts(&self, limit: u32, offset: u64) -> Result<Vec<PostRecord>, RepoError> {
        let offset = i64::try_from(offset)
            .map_err(|_| RepoError::InvalidInput {
                message: format!("offset {offset} exceeds supported range"),
            })?;

        let mut qb = Self::select_posts();
        qb.push(" ORDER BY p.created_at DESC NULLS LAST, p.id DESC LIMIT ");
        qb.push_bind(i64::from(limit));
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        self.fetch_posts(qb).await
    }

    async fn search_posts(&self, keyword: &str) -> Result<Vec<PostRecord>, RepoError> {
        let pattern = format!("%{}%", keyword.to_lowercase());

        let mut qb = Self::select_posts();
        qb.push(" WHERE LOWER(p.title) LIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR LOWER(p.content) LIKE ");
        qb.push_bind(pattern);
        qb.push(" ORDER BY p.created_at DESC NULLS LAST, p.id DESC");

        self.fetch_posts(qb).await
    }

    async fn list_posts_by_tag(&self, tag_id: TagId) -> Result<Vec<PostRecord>, RepoError> {
        let mut qb = Self::select_posts();
        qb.push(" INNER JOIN post_tags pt ON pt.post_id = p.id WHERE pt.tag_id = ");
        qb.push_bind(tag_id);
        qb.push(" ORDER BY p.created_at DESC NULLS LAST, p.id DESC");

        self.fetch_posts(qb).await
    }

    async fn list_most_viewed(&self, limit: u32) -> Result<Vec<PostRecord>, RepoError> {
        let mut qb = Self::select_posts();
        qb.push(" ORDER BY p.view_count DESC, p.id DESC LIMIT ");
        qb.push_bind(i64::from(limit));

        self.fetch_posts(qb).await
    }

    async fn count_posts(&self) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Self::convert_count(count)
    }
}
