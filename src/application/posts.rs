//! Post access service: read-through caching of single posts, invalidation on
//! writes, and the uncached listing, search and sorting paths.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use tracing::{debug, info, instrument};

use crate::application::pagination::PageRequest;
use crate::application::repos::{PostsRepo, PostsWriteRepo, RepoError, TagsRepo};
use crate::cache::{
    CacheConfig, CacheCounters, CacheStats, Clock, METRIC_CACHE_ENTRIES, METRIC_CACHE_HIT,
    METRIC_CACHE_INVALIDATE, METRIC_CACHE_MISS, METRIC_SORT_MS, PostCache, SystemClock,
    mutex_lock,
};
use crate::domain::entities::{PostId, PostRecord, TagRecord};
use crate::domain::posts::{PostDraft, PostEdit, normalize_tag_names};
use crate::domain::sort::{PostSortKey, sort_posts};

const SOURCE: &str = "application::posts";

/// Cache entries and the counters describing them, always locked together.
struct CachedPosts {
    store: PostCache,
    counters: CacheCounters,
    /// Bumped on every invalidation; a load that started under an older
    /// generation must not be stored.
    generation: u64,
}

impl CachedPosts {
    fn record_size(&self) {
        gauge!(METRIC_CACHE_ENTRIES).set(self.store.size() as f64);
    }

    fn invalidate(&mut self, id: PostId) {
        self.generation = self.generation.wrapping_add(1);
        if self.store.remove(id).is_some() {
            counter!(METRIC_CACHE_INVALIDATE).increment(1);
            debug!(post_id = id, "invalidated cached post");
        }
        self.record_size();
    }
}

/// Single entry point for reading and mutating posts.
///
/// Clones share the same cache.
#[derive(Clone)]
pub struct PostService {
    reader: Arc<dyn PostsRepo>,
    writer: Arc<dyn PostsWriteRepo>,
    tags: Arc<dyn TagsRepo>,
    cache: Arc<Mutex<CachedPosts>>,
}

impl PostService {
    pub fn new(
        reader: Arc<dyn PostsRepo>,
        writer: Arc<dyn PostsWriteRepo>,
        tags: Arc<dyn TagsRepo>,
        config: &CacheConfig,
    ) -> Self {
        Self::with_clock(reader, writer, tags, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        reader: Arc<dyn PostsRepo>,
        writer: Arc<dyn PostsWriteRepo>,
        tags: Arc<dyn TagsRepo>,
        config: &CacheConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cached = CachedPosts {
            store: PostCache::with_clock(config, clock),
            counters: CacheCounters::default(),
            generation: 0,
        };
        Self {
            reader,
            writer,
            tags,
            cache: Arc::new(Mutex::new(cached)),
        }
    }

    fn lock_cache(&self, op: &'static str) -> MutexGuard<'_, CachedPosts> {
        mutex_lock(&self.cache, SOURCE, op)
    }

    /// Look a post up by id, serving it from the cache while it is fresh.
    ///
    /// A miss is counted once storage has answered, in the same critical
    /// section that stores the loaded post. A load that raced with an update
    /// or delete is returned but not stored.
    #[instrument(skip(self))]
    pub async fn get_post(&self, id: PostId) -> Result<Option<PostRecord>, RepoError> {
        let generation = {
            let mut cached = self.lock_cache("get_post.lookup");
            if let Some(post) = cached.store.get(id).cloned() {
                cached.counters.hits += 1;
                counter!(METRIC_CACHE_HIT).increment(1);
                debug!(post_id = id, "post cache hit");
                return Ok(Some(post));
            }
            cached.generation
        };

        let loaded = self.reader.find_by_id(id).await;

        let mut cached = self.lock_cache("get_post.fill");
        cached.counters.misses += 1;
        counter!(METRIC_CACHE_MISS).increment(1);
        debug!(post_id = id, "post cache miss");

        let post = loaded?;
        match post.as_ref() {
            Some(post) if cached.generation == generation => {
                cached.store.put(id, post.clone());
            }
            Some(_) => {
                debug!(post_id = id, "skipped caching a post invalidated during load");
            }
            // Gone from storage: drop any expired copy so a view cannot revive it.
            None => {
                cached.store.remove(id);
            }
        }
        cached.record_size();
        Ok(post)
    }

    /// Store a new post and attach its tags, creating unknown tags on the way.
    pub async fn create_post<I, S>(
        &self,
        draft: &PostDraft,
        tag_names: I,
    ) -> Result<PostRecord, RepoError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tag_names = normalize_tag_names(tag_names);
        let post = self.writer.create_post(draft).await?;

        for name in &tag_names {
            let tag = self.find_or_create_tag(name).await?;
            self.tags.attach_tag(post.id, tag.id).await?;
        }

        info!(
            post_id = post.id,
            tag_count = tag_names.len(),
            "created post"
        );
        Ok(post)
    }

    async fn find_or_create_tag(&self, name: &str) -> Result<TagRecord, RepoError> {
        if let Some(tag) = self.tags.find_by_name(name).await? {
            return Ok(tag);
        }
        match self.tags.create_tag(name).await {
            Ok(tag) => Ok(tag),
            // Created concurrently between the lookup and the insert.
            Err(RepoError::Duplicate { .. }) => self
                .tags
                .find_by_name(name)
                .await?
                .ok_or(RepoError::NotFound),
            Err(err) => Err(err),
        }
    }

    /// Update title and content. The cached copy is dropped, not refreshed.
    pub async fn update_post(&self, edit: &PostEdit) -> Result<bool, RepoError> {
        let updated = self.writer.update_post(edit).await?;
        if updated {
            self.lock_cache("update_post").invalidate(edit.id());
            info!(post_id = edit.id(), "updated post");
        }
        Ok(updated)
    }

    pub async fn delete_post(&self, id: PostId) -> Result<bool, RepoError> {
        let deleted = self.writer.delete_post(id).await?;
        if deleted {
            self.lock_cache("delete_post").invalidate(id);
            info!(post_id = id, "deleted post");
        }
        Ok(deleted)
    }

    /// Count a view in storage and mirror it into the cached copy, if any.
    ///
    /// The cached count is bumped without re-reading storage and its TTL
    /// window restarts. Posts that are not cached are not loaded.
    pub async fn increment_view_count(&self, id: PostId) -> Result<(), RepoError> {
        self.writer.increment_view_count(id).await?;

        let mut cached = self.lock_cache("increment_view_count");
        if let Some(mut post) = cached.store.peek(id).cloned() {
            post.view_count = post.view_count.saturating_add(1);
            let view_count = post.view_count;
            cached.store.touch(id, post);
            debug!(post_id = id, view_count, "refreshed cached view count");
        }
        Ok(())
    }

    /// One page of posts, newest first. `page` is 1-based.
    pub async fn get_posts_page(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let request = PageRequest::new(page, page_size);
        self.reader
            .list_posts(request.limit(), request.offset())
            .await
    }

    pub async fn search_posts(&self, keyword: &str) -> Result<Vec<PostRecord>, RepoError> {
        let started = Instant::now();
        let results = self.reader.search_posts(keyword).await?;
        info!(
            keyword,
            results = results.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "searched posts"
        );
        Ok(results)
    }

    /// Posts carrying the named tag; an unknown tag yields an empty list.
    pub async fn get_posts_by_tag(&self, tag_name: &str) -> Result<Vec<PostRecord>, RepoError> {
        match self.tags.find_by_name(tag_name.trim()).await? {
            Some(tag) => self.reader.list_posts_by_tag(tag.id).await,
            None => Ok(Vec::new()),
        }
    }

    pub async fn get_most_viewed_posts(&self, limit: u32) -> Result<Vec<PostRecord>, RepoError> {
        self.reader.list_most_viewed(limit).await
    }

    pub async fn get_total_post_count(&self) -> Result<u64, RepoError> {
        self.reader.count_posts().await
    }

    /// The newest `limit` posts, reordered by `sort_key`.
    pub async fn get_sorted_posts(
        &self,
        limit: u32,
        sort_key: PostSortKey,
    ) -> Result<Vec<PostRecord>, RepoError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut posts = self.reader.list_posts(limit, 0).await?;

        let started = Instant::now();
        sort_posts(&mut posts, sort_key);
        let elapsed = started.elapsed();
        histogram!(METRIC_SORT_MS).record(elapsed.as_secs_f64() * 1_000.0);

        info!(
            count = posts.len(),
            sort_key = %sort_key,
            elapsed_ms = elapsed.as_millis() as u64,
            "sorted posts"
        );
        Ok(posts)
    }

    pub fn get_cache_stats(&self) -> CacheStats {
        let cached = self.lock_cache("get_cache_stats");
        CacheStats::new(cached.store.size(), cached.counters)
    }

    /// Empty the cache. Hit and miss counters are kept.
    pub fn clear_cache(&self) {
        let mut cached = self.lock_cache("clear_cache");
        cached.generation = cached.generation.wrapping_add(1);
        cached.store.clear();
        cached.record_size();
        info!("post cache cleared");
    }

    /// Drop expired entries now instead of waiting for them to be overwritten.
    pub fn purge_expired_cache(&self) -> usize {
        let mut cached = self.lock_cache("purge_expired_cache");
        let purged = cached.store.purge_expired();
        cached.record_size();
        if purged > 0 {
            debug!(purged, "purged expired cached posts");
        }
        purged
    }
}
