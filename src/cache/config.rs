//! Post cache configuration.
//!
//! Built from the validated `[cache]` settings.

use std::time::Duration;

/// Five minutes.
pub const DEFAULT_POST_TTL_MS: u64 = 300_000;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long a cached post stays valid after it was stored or touched.
    pub post_ttl_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            post_ttl_ms: DEFAULT_POST_TTL_MS,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            post_ttl_ms: settings.post_ttl.as_millis().try_into().unwrap_or(u64::MAX),
        }
    }
}

impl CacheConfig {
    pub fn post_ttl(&self) -> Duration {
        Duration::from_millis(self.post_ttl_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ttl_is_five_minutes() {
        let config = CacheConfig::default();
        assert_eq!(config.post_ttl_ms, 300_000);
        assert_eq!(config.post_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn converts_from_settings() {
        let settings = crate::config::CacheSettings {
            post_ttl: Duration::from_millis(1_500),
        };
        assert_eq!(CacheConfig::from(&settings).post_ttl_ms, 1_500);
    }
}
