//! Hit/miss bookkeeping and the statistics snapshot handed to callers.

use std::fmt;

use serde::{Serialize, Serializer};

/// Cumulative lookup outcomes. Survives [`crate::application::posts::PostService::clear_cache`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CacheCounters {
    pub(crate) hits: u64,
    pub(crate) misses: u64,
}

/// Percentage of lookups served from the cache.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct HitRate(f64);

impl HitRate {
    pub fn from_counts(hits: u64, misses: u64) -> Self {
        let total = hits + misses;
        if total == 0 {
            return Self(0.0);
        }
        Self(hits as f64 / total as f64 * 100.0)
    }
}

impl fmt::Display for HitRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}%", self.0)
    }
}

impl Serialize for HitRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Point-in-time view of the post cache.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: HitRate,
}

impl CacheStats {
    pub(crate) fn new(size: usize, counters: CacheCounters) -> Self {
        Self {
            size,
            hits: counters.hits,
            misses: counters.misses,
            hit_rate: HitRate::from_counts(counters.hits, counters.misses),
        }
    }

    pub fn requests(&self) -> u64 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "size={} hits={} misses={} hit_rate={}",
            self.size, self.hits, self.misses, self.hit_rate
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_requests_reports_zero() {
        let stats = CacheStats::new(0, CacheCounters::default());
        assert_eq!(stats.hit_rate.to_string(), "0.00%");
        assert_eq!(stats.requests(), 0);
    }

    #[test]
    fn hit_rate_uses_two_decimals() {
        assert_eq!(HitRate::from_counts(1, 2).to_string(), "33.33%");
        assert_eq!(HitRate::from_counts(2, 1).to_string(), "66.67%");
        assert_eq!(HitRate::from_counts(3, 0).to_string(), "100.00%");
    }

    #[test]
    fn serializes_hit_rate_as_text() {
        let stats = CacheStats::new(
            4,
            CacheCounters {
                hits: 3,
                misses: 1,
            },
        );
        let json = serde_json::to_value(stats).expect("stats serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "size": 4,
                "hits": 3,
                "misses": 1,
                "hit_rate": "75.00%"
            })
        );
    }
}
