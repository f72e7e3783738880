//! Validated inputs for creating and editing posts.

use std::collections::BTreeSet;

use crate::domain::entities::{PostId, UserId};
use crate::domain::error::DomainError;

/// A post that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    owner_id: UserId,
    title: String,
    content: String,
}

impl PostDraft {
    pub fn new(
        owner_id: UserId,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let title = title.into();
        ensure_non_empty(&title, "title")?;
        Ok(Self {
            owner_id,
            title,
            content: content.into(),
        })
    }

    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// New title and content for an existing post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostEdit {
    id: PostId,
    title: String,
    content: String,
}

impl PostEdit {
    pub fn new(
        id: PostId,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let title = title.into();
        ensure_non_empty(&title, "title")?;
        Ok(Self {
            id,
            title,
            content: content.into(),
        })
    }

    pub fn id(&self) -> PostId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Trim tag names, drop blank ones and keep the first occurrence of each.
pub fn normalize_tag_names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = BTreeSet::new();
    let mut normalized = Vec::new();
    for name in names {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_string()) {
            normalized.push(trimmed.to_string());
        }
    }
    normalized
}

fn ensure_non_empty(value: &str, field: &'static str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(field, "must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_rejects_blank_title() {
        let err = PostDraft::new(1, "   ", "body").expect_err("blank title");
        assert!(matches!(
            err,
            DomainError::Validation { field: "title", .. }
        ));
    }

    #[test]
    fn edit_keeps_content_verbatim() {
        let edit = PostEdit::new(7, "Title", "  spaced body  ").expect("valid edit");
        assert_eq!(edit.id(), 7);
        assert_eq!(edit.content(), "  spaced body  ");
    }

    #[test]
    fn empty_content_is_allowed() {
        let draft = PostDraft::new(3, "Only a title", "").expect("valid draft");
        assert_eq!(draft.owner_id(), 3);
        assert_eq!(draft.content(), "");
    }

    #[test]
    fn tag_names_are_trimmed_and_deduplicated() {
        let names = normalize_tag_names(["rust", " rust ", "", "  ", "async", "Rust"]);
        assert_eq!(names, vec!["rust", "async", "Rust"]);
    }
}
