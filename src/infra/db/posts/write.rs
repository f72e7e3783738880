use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};

use crate::application::repos::{PostsWriteRepo, RepoError};
use crate::domain::entities::{PostId, PostRecord};
use crate::domain::posts::{PostDraft, PostEdit};

use super::super::{POST_COLUMNS, POST_FROM, PostgresRepositories};
use super::types::PostRow;
use crate::infra::db::map_sqlx_error;

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn create_post(&self, draft: &PostDraft) -> Result<PostRecord, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "WITH inserted AS ( \
             INSERT INTO posts (user_id, title, content, created_at, updated_at) \
             VALUES (",
        );
        qb.push_bind(draft.owner_id());
        qb.push(", ");
        qb.push_bind(draft.title());
        qb.push(", ");
        qb.push_bind(draft.content());
        qb.push(", CURRENT_TIMESTAMP, CURRENT_TIMESTAMP) RETURNING *) ");
        qb.push(format!(
            "SELECT {} {} ",
            POST_COLUMNS,
            POST_FROM.replacen("posts p", "inserted p", 1)
        ));

        let row = qb
            .build_query_as::<PostRow>()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        PostRecord::try_from(row)
    }

    async fn update_post(&self, edit: &PostEdit) -> Result<bool, RepoError> {
        let result = sqlx::query(
            "UPDATE posts SET title = $1, content = $2, updated_at = CURRENT_TIMESTAMP \
             WHERE id = $3",
        )
        .bind(edit.title())
        .bind(edit.content())
        .bind(edit.id())
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_post(&self, id: PostId) -> Result<bool, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        sqlx::query("DELETE FROM post_tags WHERE post_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        sqlx::query("DELETE FROM comments WHERE post_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn increment_view_count(&self, id: PostId) -> Result<(), RepoError> {
        sqlx::query("UPDATE posts SET view_count = view_count + 1 WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }
}
