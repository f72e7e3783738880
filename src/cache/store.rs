//! Post cache storage with lazy TTL expiry.
//!
//! Entries are never swept in the background: an entry older than the TTL is
//! reported as absent by [`PostCache::get`] and stays in the map until it is
//! overwritten, removed, cleared, or dropped by [`PostCache::purge_expired`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::domain::entities::{PostId, PostRecord};

use super::clock::{Clock, SystemClock};
use super::config::CacheConfig;

#[derive(Debug, Clone)]
struct CacheEntry {
    post: PostRecord,
    stored_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.stored_at) < ttl
    }
}

/// Map from post id to the post and the instant it was stored.
///
/// Not synchronised; the owner decides how it is shared.
pub struct PostCache {
    entries: HashMap<PostId, CacheEntry>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl PostCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            ttl: config.post_ttl(),
            clock,
        }
    }

    /// The cached post, unless it is missing or older than the TTL.
    pub fn get(&self, id: PostId) -> Option<&PostRecord> {
        let now = self.clock.now();
        self.entries
            .get(&id)
            .filter(|entry| entry.is_fresh(now, self.ttl))
            .map(|entry| &entry.post)
    }

    /// The stored post whether or not it has expired.
    pub fn peek(&self, id: PostId) -> Option<&PostRecord> {
        self.entries.get(&id).map(|entry| &entry.post)
    }

    pub fn contains(&self, id: PostId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn put(&mut self, id: PostId, post: PostRecord) {
        let stored_at = self.clock.now();
        self.entries.insert(id, CacheEntry { post, stored_at });
    }

    /// Replace the post stored under `id` and restart its TTL window.
    ///
    /// Returns `false` without inserting when `id` is not cached.
    pub fn touch(&mut self, id: PostId, post: PostRecord) -> bool {
        let now = self.clock.now();
        match self.entries.get_mut(&id) {
            Some(entry) => {
                entry.post = post;
                entry.stored_at = now;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: PostId) -> Option<PostRecord> {
        self.entries.remove(&id).map(|entry| entry.post)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of stored entries, expired ones included.
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every expired entry and return how many were removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now();
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_fresh(now, ttl));
        before - self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;
    use crate::cache::clock::ManualClock;

    const TTL: Duration = Duration::from_millis(300_000);

    fn sample_post(id: PostId) -> PostRecord {
        PostRecord {
            id,
            owner_id: 1,
            title: format!("Post {id}"),
            content: "body".to_string(),
            created_at: Some(OffsetDateTime::now_utc()),
            updated_at: Some(OffsetDateTime::now_utc()),
            view_count: 0,
            author_name: Some("alice".to_string()),
        }
    }

    fn cache_with_clock() -> (PostCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache = PostCache::with_clock(&CacheConfig::default(), clock.clone());
        (cache, clock)
    }

    #[test]
    fn put_then_get_within_ttl() {
        let (mut cache, clock) = cache_with_clock();
        assert!(cache.get(1).is_none());

        cache.put(1, sample_post(1));
        clock.advance(TTL - Duration::from_millis(1));

        assert_eq!(cache.get(1).map(|post| post.id), Some(1));
    }

    #[test]
    fn entry_expires_exactly_at_ttl() {
        let (mut cache, clock) = cache_with_clock();
        cache.put(1, sample_post(1));
        clock.advance(TTL);

        assert!(cache.get(1).is_none());
        assert!(cache.contains(1));
        assert_eq!(cache.size(), 1);
        assert!(cache.peek(1).is_some());
    }

    #[test]
    fn touch_restarts_ttl_window() {
        let (mut cache, clock) = cache_with_clock();
        cache.put(1, sample_post(1));
        clock.advance(TTL - Duration::from_millis(10));

        let mut bumped = sample_post(1);
        bumped.view_count = 1;
        assert!(cache.touch(1, bumped));

        clock.advance(Duration::from_millis(20));
        let cached = cache.get(1).expect("touched entry is fresh");
        assert_eq!(cached.view_count, 1);
    }

    #[test]
    fn touch_ignores_missing_keys() {
        let (mut cache, _clock) = cache_with_clock();
        assert!(!cache.touch(9, sample_post(9)));
        assert!(cache.is_empty());
    }

    #[test]
    fn put_overwrites_and_restamps() {
        let (mut cache, clock) = cache_with_clock();
        cache.put(1, sample_post(1));
        clock.advance(TTL);
        assert!(cache.get(1).is_none());

        cache.put(1, sample_post(1));
        assert!(cache.get(1).is_some());
        assert_eq!(cache.size(), 1);
    }

    #[test]
    fn remove_and_clear() {
        let (mut cache, _clock) = cache_with_clock();
        cache.put(1, sample_post(1));
        cache.put(2, sample_post(2));

        assert_eq!(cache.remove(1).map(|post| post.id), Some(1));
        assert!(cache.remove(1).is_none());
        assert_eq!(cache.size(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn purge_expired_keeps_fresh_entries() {
        let (mut cache, clock) = cache_with_clock();
        cache.put(1, sample_post(1));
        clock.advance(Duration::from_secs(200));
        cache.put(2, sample_post(2));
        clock.advance(Duration::from_secs(150));

        assert_eq!(cache.purge_expired(), 1);
        assert!(!cache.contains(1));
        assert!(cache.get(2).is_some());
    }
}
