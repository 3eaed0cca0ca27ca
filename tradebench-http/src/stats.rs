//! Per-category latency accounting
//!
//! Wall-clock time of every request a client makes, bucketed by category.
//! Feeds score weighting that rewards low latency; reading a snapshot never
//! blocks request traffic.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Category a request is accounted under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestCategory {
    /// Top page and static assets
    StaticGet,
    /// JSON API reads
    ApiGet,
    /// POST / DELETE mutations
    ApiWrite,
}

#[derive(Debug, Default)]
struct CategoryStat {
    total_nanos: AtomicU64,
    count: AtomicU64,
}

impl CategoryStat {
    fn record(&self, elapsed: Duration) {
        self.total_nanos
            .fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> CategorySnapshot {
        let count = self.count.load(Ordering::Relaxed);
        let total = Duration::from_nanos(self.total_nanos.load(Ordering::Relaxed));
        CategorySnapshot { count, total }
    }
}

/// Concurrent latency counters for one client
#[derive(Debug, Default)]
pub struct ElapsedStats {
    static_get: CategoryStat,
    api_get: CategoryStat,
    api_write: CategoryStat,
}

/// Point-in-time view of one category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategorySnapshot {
    pub count: u64,
    pub total: Duration,
}

impl CategorySnapshot {
    pub fn mean(&self) -> Duration {
        if self.count == 0 {
            Duration::ZERO
        } else {
            self.total / self.count as u32
        }
    }
}

/// Point-in-time view of all categories
#[derive(Debug, Clone, Copy)]
pub struct ElapsedSnapshot {
    pub static_get: CategorySnapshot,
    pub api_get: CategorySnapshot,
    pub api_write: CategorySnapshot,
}

impl ElapsedStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, category: RequestCategory, elapsed: Duration) {
        match category {
            RequestCategory::StaticGet => self.static_get.record(elapsed),
            RequestCategory::ApiGet => self.api_get.record(elapsed),
            RequestCategory::ApiWrite => self.api_write.record(elapsed),
        }
    }

    pub fn snapshot(&self) -> ElapsedSnapshot {
        ElapsedSnapshot {
            static_get: self.static_get.snapshot(),
            api_get: self.api_get.snapshot(),
            api_write: self.api_write.snapshot(),
        }
    }

    /// Total requests across all categories
    pub fn request_count(&self) -> u64 {
        let s = self.snapshot();
        s.static_get.count + s.api_get.count + s.api_write.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_by_category() {
        let stats = ElapsedStats::new();
        stats.record(RequestCategory::ApiGet, Duration::from_millis(10));
        stats.record(RequestCategory::ApiGet, Duration::from_millis(30));
        stats.record(RequestCategory::ApiWrite, Duration::from_millis(5));

        let snap = stats.snapshot();
        assert_eq!(snap.api_get.count, 2);
        assert_eq!(snap.api_get.mean(), Duration::from_millis(20));
        assert_eq!(snap.api_write.count, 1);
        assert_eq!(snap.static_get.count, 0);
        assert_eq!(snap.static_get.mean(), Duration::ZERO);
        assert_eq!(stats.request_count(), 3);
    }
}
