//! Quire post cache
//!
//! A read-through cache of individual posts keyed by id. Entries expire
//! lazily after a configurable TTL (five minutes by default):
//!
//! ```toml
//! [cache]
//! post_ttl_ms = 300000
//! ```
//!
//! The cache is owned by [`crate::application::posts::PostService`]; nothing
//! else reads or writes it.

mod clock;
mod config;
mod lock;
mod stats;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CacheConfig, DEFAULT_POST_TTL_MS};
pub use stats::{CacheStats, HitRate};
pub use store::PostCache;

pub(crate) use lock::mutex_lock;
pub(crate) use stats::CacheCounters;

pub const METRIC_CACHE_HIT: &str = "quire_post_cache_hit_total";
pub const METRIC_CACHE_MISS: &str = "quire_post_cache_miss_total";
pub const METRIC_CACHE_INVALIDATE: &str = "quire_post_cache_invalidate_total";
pub const METRIC_CACHE_ENTRIES: &str = "quire_post_cache_entries";
pub const METRIC_SORT_MS: &str = "quire_post_sort_ms";
