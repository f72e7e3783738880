use time::OffsetDateTime;

use crate::application::repos::RepoError;
use crate::domain::entities::PostRecord;

#[derive(sqlx::FromRow)]
pub(crate) struct PostRow {
    pub(crate) id: i64,
    pub(crate) user_id: i64,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) created_at: Option<OffsetDateTime>,
    pub(crate) updated_at: Option<OffsetDateTime>,
    pub(crate) view_count: i64,
    pub(crate) author_name: Option<String>,
}

impl TryFrom<PostRow> for PostRecord {
    type Error = RepoError;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        let view_count = u64::try_from(row.view_count).map_err(|_| {
            RepoError::integrity(format!(
                "post {} has negative view count {}",
                row.id, row.view_count
            ))
        })?;

        Ok(Self {
            id: row.id,
            owner_id: row.user_id,
            title: row.title,
            content: row.content,
            created_at: row.created_at,
            updated_at: row.updated_at,
            view_count,
            author_name: row.author_name,
        })
    }
}

pub(crate) fn into_records(rows: Vec<PostRow>) -> Result<Vec<PostRecord>, RepoError> {
    rows.into_iter().map(PostRecord::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(view_count: i64) -> PostRow {
        PostRow {
            id: 5,
            user_id: 2,
            title: "Title".to_string(),
            content: "Body".to_string(),
            created_at: None,
            updated_at: None,
            view_count,
            author_name: Some("bob".to_string()),
        }
    }

    #[test]
    fn converts_row_to_record() {
        let record = PostRecord::try_from(row(12)).expect("valid row");
        assert_eq!(record.id, 5);
        assert_eq!(record.owner_id, 2);
        assert_eq!(record.view_count, 12);
        assert_eq!(record.author_name.as_deref(), Some("bob"));
    }

    #[test]
    fn negative_view_count_is_an_integrity_error() {
        let err = PostRecord::try_from(row(-1)).expect_err("negative count");
        assert!(matches!(err, RepoError::Integrity { .. }));
    }
}
