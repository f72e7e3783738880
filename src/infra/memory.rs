//! In-process repository implementation.
//!
//! Mirrors the Postgres adapter's ordering and cascade rules so services can
//! be exercised without a database.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{PostsRepo, PostsWriteRepo, RepoError, TagsRepo};
use crate::cache::mutex_lock;
use crate::domain::entities::{PostId, PostRecord, TagId, TagRecord, UserId};
use crate::domain::posts::{PostDraft, PostEdit};
use crate::domain::sort::PostSortKey;

const SOURCE: &str = "infra::memory";

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<UserId, String>,
    posts: BTreeMap<PostId, PostRecord>,
    tags: BTreeMap<TagId, TagRecord>,
    post_tags: BTreeSet<(PostId, TagId)>,
    comments: BTreeMap<PostId, usize>,
    next_post_id: PostId,
    next_tag_id: TagId,
}

impl MemoryState {
    fn with_author(&self, mut post: PostRecord) -> PostRecord {
        post.author_name = self.users.get(&post.owner_id).cloned();
        post
    }

    fn newest_first(&self, posts: impl Iterator<Item = PostRecord>) -> Vec<PostRecord> {
        let mut posts: Vec<PostRecord> = posts.map(|post| self.with_author(post)).collect();
        // Storage order: newest first, then highest id. Ids are unique so the
        // unstable sort is deterministic here.
        posts.sort_unstable_by(|a, b| {
            PostSortKey::Date
                .compare(a, b)
                .then_with(|| b.id.cmp(&a.id))
        });
        posts
    }
}

#[derive(Debug, Default)]
pub struct InMemoryRepositories {
    state: Mutex<MemoryState>,
    loads: AtomicU64,
}

impl InMemoryRepositories {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user so their name is joined onto their posts.
    pub fn add_user(&self, id: UserId, username: impl Into<String>) {
        let mut state = mutex_lock(&self.state, SOURCE, "add_user");
        state.users.insert(id, username.into());
    }

    /// Store `post` as-is, keeping its id and timestamps.
    pub fn insert_post(&self, post: PostRecord) {
        let mut state = mutex_lock(&self.state, SOURCE, "insert_post");
        state.next_post_id = state.next_post_id.max(post.id);
        state.posts.insert(post.id, post);
    }

    /// Record a comment on `post_id`; comments are removed with their post.
    pub fn add_comment(&self, post_id: PostId) {
        let mut state = mutex_lock(&self.state, SOURCE, "add_comment");
        *state.comments.entry(post_id).or_default() += 1;
    }

    pub fn comment_count(&self, post_id: PostId) -> usize {
        let state = mutex_lock(&self.state, SOURCE, "comment_count");
        state.comments.get(&post_id).copied().unwrap_or(0)
    }

    pub fn tag_names_for(&self, post_id: PostId) -> Vec<String> {
        let state = mutex_lock(&self.state, SOURCE, "tag_names_for");
        state
            .post_tags
            .iter()
            .filter(|(post, _)| *post == post_id)
            .filter_map(|(_, tag_id)| state.tags.get(tag_id))
            .map(|tag| tag.name.clone())
            .collect()
    }

    /// Number of single-post loads served so far.
    pub fn load_count(&self) -> u64 {
        self.loads.load(Ordering::SeqCst)
    }

    /// Storage-side view count, bypassing any cache.
    pub fn stored_view_count(&self, id: PostId) -> Option<u64> {
        let state = mutex_lock(&self.state, SOURCE, "stored_view_count");
        state.posts.get(&id).map(|post| post.view_count)
    }
}

#[async_trait]
impl PostsRepo for InMemoryRepositories {
    async fn find_by_id(&self, id: PostId) -> Result<Option<PostRecord>, RepoError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let state = mutex_lock(&self.state, SOURCE, "find_by_id");
        Ok(state.posts.get(&id).cloned().map(|post| state.with_author(post)))
    }

    async fn list_posts(&self, limit: u32, offset: u64) -> Result<Vec<PostRecord>, RepoError> {
        let state = mutex_lock(&self.state, SOURCE, "list_posts");
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        Ok(state
            .newest_first(state.posts.values().cloned())
            .into_iter()
            .skip(offset)
            .take(limit as usize)
            .collect())
    }

    async fn search_posts(&self, keyword: &str) -> Result<Vec<PostRecord>, RepoError> {
        let needle = keyword.to_lowercase();
        let state = mutex_lock(&self.state, SOURCE, "search_posts");
        let matches = state.posts.values().filter(|post| {
            post.title.to_lowercase().contains(&needle)
                || post.content.to_lowercase().contains(&needle)
        });
        Ok(state.newest_first(matches.cloned()))
    }

    async fn list_posts_by_tag(&self, tag_id: TagId) -> Result<Vec<PostRecord>, RepoError> {
        let state = mutex_lock(&self.state, SOURCE, "list_posts_by_tag");
        let tagged = state
            .post_tags
            .iter()
            .filter(|(_, tag)| *tag == tag_id)
            .filter_map(|(post_id, _)| state.posts.get(post_id));
        Ok(state.newest_first(tagged.cloned()))
    }

    async fn list_most_viewed(&self, limit: u32) -> Result<Vec<PostRecord>, RepoError> {
        let state = mutex_lock(&self.state, SOURCE, "list_most_viewed");
        let mut posts: Vec<PostRecord> = state
            .posts
            .values()
            .cloned()
            .map(|post| state.with_author(post))
            .collect();
        posts.sort_unstable_by(|a, b| {
            PostSortKey::Views
                .compare(a, b)
                .then_with(|| b.id.cmp(&a.id))
        });
        posts.truncate(limit as usize);
        Ok(posts)
    }

    async fn count_posts(&self) -> Result<u64, RepoError> {
        let state = mutex_lock(&self.state, SOURCE, "count_posts");
        Ok(state.posts.len() as u64)
    }
}

#[async_trait]
impl PostsWriteRepo for InMemoryRepositories {
    async fn create_post(&self, draft: &PostDraft) -> Result<PostRecord, RepoError> {
        let mut state = mutex_lock(&self.state, SOURCE, "create_post");
        state.next_post_id += 1;
        let now = OffsetDateTime::now_utc();
        let post = PostRecord {
            id: state.next_post_id,
            owner_id: draft.owner_id(),
            title: draft.title().to_string(),
            content: draft.content().to_string(),
            created_at: Some(now),
            updated_at: Some(now),
            view_count: 0,
            author_name: None,
        };
        state.posts.insert(post.id, post.clone());
        Ok(state.with_author(post))
    }

    async fn update_post(&self, edit: &PostEdit) -> Result<bool, RepoError> {
        let mut state = mutex_lock(&self.state, SOURCE, "update_post");
        match state.posts.get_mut(&edit.id()) {
            Some(post) => {
                post.title = edit.title().to_string();
                post.content = edit.content().to_string();
                post.updated_at = Some(OffsetDateTime::now_utc());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_post(&self, id: PostId) -> Result<bool, RepoError> {
        let mut state = mutex_lock(&self.state, SOURCE, "delete_post");
        state.post_tags.retain(|(post_id, _)| *post_id != id);
        state.comments.remove(&id);
        Ok(state.posts.remove(&id).is_some())
    }

    async fn increment_view_count(&self, id: PostId) -> Result<(), RepoError> {
        let mut state = mutex_lock(&self.state, SOURCE, "increment_view_count");
        if let Some(post) = state.posts.get_mut(&id) {
            post.view_count = post.view_count.saturating_add(1);
        }
        Ok(())
    }
}

#[async_trait]
impl TagsRepo for InMemoryRepositories {
    async fn find_by_name(&self, name: &str) -> Result<Option<TagRecord>, RepoError> {
        let state = mutex_lock(&self.state, SOURCE, "find_tag_by_name");
        Ok(state.tags.values().find(|tag| tag.name == name).cloned())
    }

    async fn create_tag(&self, name: &str) -> Result<TagRecord, RepoError> {
        let mut state = mutex_lock(&self.state, SOURCE, "create_tag");
        if state.tags.values().any(|tag| tag.name == name) {
            return Err(RepoError::Duplicate {
                constraint: "tags_name_key".to_string(),
            });
        }
        state.next_tag_id += 1;
        let tag = TagRecord {
            id: state.next_tag_id,
            name: name.to_string(),
        };
        state.tags.insert(tag.id, tag.clone());
        Ok(tag)
    }

    async fn attach_tag(&self, post_id: PostId, tag_id: TagId) -> Result<(), RepoError> {
        let mut state = mutex_lock(&self.state, SOURCE, "attach_tag");
        if !state.posts.contains_key(&post_id) || !state.tags.contains_key(&tag_id) {
            return Err(RepoError::InvalidInput {
                message: format!("cannot link post {post_id} to tag {tag_id}"),
            });
        }
        state.post_tags.insert((post_id, tag_id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn seeded(id: PostId, title: &str, created_at: Option<OffsetDateTime>) -> PostRecord {
        PostRecord {
            id,
            owner_id: 1,
            title: title.to_string(),
            content: format!("{title} body"),
            created_at,
            updated_at: created_at,
            view_count: 0,
            author_name: None,
        }
    }

    #[tokio::test]
    async fn list_posts_is_newest_first_with_offset() {
        let repo = InMemoryRepositories::new();
        repo.insert_post(seeded(1, "old", Some(datetime!(2024-01-01 0:00 UTC))));
        repo.insert_post(seeded(2, "new", Some(datetime!(2024-03-01 0:00 UTC))));
        repo.insert_post(seeded(3, "mid", Some(datetime!(2024-02-01 0:00 UTC))));

        let first = repo.list_posts(2, 0).await.expect("list");
        let ids: Vec<PostId> = first.iter().map(|post| post.id).collect();
        assert_eq!(ids, vec![2, 3]);

        let second = repo.list_posts(2, 2).await.expect("list");
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].id, 1);
    }

    #[tokio::test]
    async fn author_names_are_joined() {
        let repo = InMemoryRepositories::new();
        repo.add_user(1, "alice");
        let draft = PostDraft::new(1, "Hello", "World").expect("draft");
        let created = repo.create_post(&draft).await.expect("create");
        assert_eq!(created.author_name.as_deref(), Some("alice"));
        assert_eq!(created.view_count, 0);
        assert!(created.created_at.is_some());
    }

    #[tokio::test]
    async fn inserted_ids_are_not_reused() {
        let repo = InMemoryRepositories::new();
        repo.insert_post(seeded(10, "seed", None));
        let draft = PostDraft::new(1, "Next", "").expect("draft");
        let created = repo.create_post(&draft).await.expect("create");
        assert_eq!(created.id, 11);
    }

    #[tokio::test]
    async fn delete_cascades_tags_and_comments() {
        let repo = InMemoryRepositories::new();
        repo.insert_post(seeded(1, "doomed", None));
        let tag = repo.create_tag("rust").await.expect("tag");
        repo.attach_tag(1, tag.id).await.expect("attach");
        repo.add_comment(1);

        assert!(repo.delete_post(1).await.expect("delete"));
        assert!(repo.tag_names_for(1).is_empty());
        assert_eq!(repo.comment_count(1), 0);
        assert!(!repo.delete_post(1).await.expect("second delete"));
    }

    #[tokio::test]
    async fn most_viewed_breaks_ties_by_highest_id() {
        let repo = InMemoryRepositories::new();
        for (id, views) in [(1, 4), (2, 7), (3, 4), (4, 7), (5, 1)] {
            let mut post = seeded(id, "post", None);
            post.view_count = views;
            repo.insert_post(post);
        }

        let posts = repo.list_most_viewed(4).await.expect("most viewed");
        let ids: Vec<PostId> = posts.iter().map(|post| post.id).collect();
        assert_eq!(ids, vec![4, 2, 3, 1]);
    }

    #[tokio::test]
    async fn duplicate_tag_names_are_rejected() {
        let repo = InMemoryRepositories::new();
        repo.create_tag("rust").await.expect("first");
        let err = repo.create_tag("rust").await.expect_err("duplicate");
        assert!(matches!(err, RepoError::Duplicate { .. }));
    }
}
