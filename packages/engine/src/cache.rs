//! TTL-gated cache over the upstream feed.
//!
//! Holds the last successfully fetched payload and its fetch time, and
//! is the only component that talks to the transport. The TTL bounds
//! the upstream request rate: within a window the cached payload is
//! served without a fetch, no matter how often callers ask. When a
//! fetch fails, any cached payload, however stale, is preferred over
//! surfacing the error.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use citizen_watch_feed::{FeedError, IncidentFeed};
use citizen_watch_incident_models::{LatLon, RawIncident};

/// The last successful fetch. Replaced wholesale, never patched.
struct CacheEntry {
    fetched_at: DateTime<Utc>,
    payload: Arc<[RawIncident]>,
}

/// Fetch-or-serve-cached front for the upstream feed.
///
/// Owned by a single caller (the poller); all mutation happens through
/// `&mut self`, so there is never more than one fetch in flight.
pub struct FeedCache {
    feed: Arc<dyn IncidentFeed>,
    center: LatLon,
    radius_km: f64,
    limit: u32,
    ttl: TimeDelta,
    entry: Option<CacheEntry>,
}

impl FeedCache {
    /// Creates an empty cache fetching through `feed` with fixed query
    /// parameters.
    #[must_use]
    pub fn new(
        feed: Arc<dyn IncidentFeed>,
        center: LatLon,
        radius_km: f64,
        limit: u32,
        ttl: std::time::Duration,
    ) -> Self {
        Self {
            feed,
            center,
            radius_km,
            limit,
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            entry: None,
        }
    }

    /// Returns the current payload, fetching when no entry exists or
    /// the TTL has elapsed.
    ///
    /// At most one outbound fetch per call. A failed fetch leaves the
    /// existing entry (and its `fetched_at`) untouched, so the next
    /// call retries the transport immediately instead of waiting out
    /// another TTL window.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] only when no cached payload exists and the
    /// fetch also fails.
    pub async fn get(&mut self, now: DateTime<Utc>) -> Result<Arc<[RawIncident]>, FeedError> {
        if let Some(entry) = &self.entry
            && now.signed_duration_since(entry.fetched_at) < self.ttl
        {
            log::debug!(
                "Serving cached payload of {} incidents from {}",
                entry.payload.len(),
                entry.fetched_at
            );
            return Ok(Arc::clone(&entry.payload));
        }

        match self.feed.fetch(self.center, self.radius_km, self.limit).await {
            Ok(incidents) => {
                log::debug!("Fetched {} incidents", incidents.len());
                let payload: Arc<[RawIncident]> = incidents.into();
                self.entry = Some(CacheEntry {
                    fetched_at: now,
                    payload: Arc::clone(&payload),
                });
                Ok(payload)
            }
            Err(e) => match &self.entry {
                Some(entry) => {
                    log::warn!(
                        "Fetch failed, serving stale payload from {}: {e}",
                        entry.fetched_at
                    );
                    Ok(Arc::clone(&entry.payload))
                }
                None => Err(e),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use std::time::Duration;

    use super::*;
    use crate::testing::{NYC, ScriptedFeed, fetch_failure, incident};

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn cache(feed: Arc<ScriptedFeed>, ttl_secs: u64) -> FeedCache {
        FeedCache::new(feed, NYC, 5.0, 50, Duration::from_secs(ttl_secs))
    }

    #[tokio::test]
    async fn serves_cached_payload_within_ttl() {
        let feed = Arc::new(ScriptedFeed::new([Ok(vec![incident("a")])]));
        let mut cache = cache(Arc::clone(&feed), 60);

        let first = cache.get(t0()).await.unwrap();
        let second = cache.get(t0() + TimeDelta::seconds(30)).await.unwrap();

        assert_eq!(feed.fetch_count(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn refetches_once_ttl_elapses() {
        let feed = Arc::new(ScriptedFeed::new([
            Ok(vec![incident("a")]),
            Ok(vec![incident("a"), incident("b")]),
        ]));
        let mut cache = cache(Arc::clone(&feed), 60);

        let first = cache.get(t0()).await.unwrap();
        assert_eq!(first.len(), 1);

        // Exactly at the TTL boundary the entry counts as stale.
        let second = cache.get(t0() + TimeDelta::seconds(60)).await.unwrap();
        assert_eq!(feed.fetch_count(), 2);
        assert_eq!(second.len(), 2);
    }

    #[tokio::test]
    async fn serves_stale_payload_when_fetch_fails() {
        let feed = Arc::new(ScriptedFeed::new([
            Ok(vec![incident("a")]),
            Err(fetch_failure()),
        ]));
        let mut cache = cache(Arc::clone(&feed), 60);

        let first = cache.get(t0()).await.unwrap();
        let second = cache.get(t0() + TimeDelta::seconds(61)).await.unwrap();

        assert_eq!(feed.fetch_count(), 2);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn propagates_error_when_nothing_is_cached() {
        let feed = Arc::new(ScriptedFeed::new([Err(fetch_failure())]));
        let mut cache = cache(Arc::clone(&feed), 60);

        assert!(cache.get(t0()).await.is_err());
    }

    #[tokio::test]
    async fn failed_fetch_does_not_extend_the_ttl() {
        let feed = Arc::new(ScriptedFeed::new([
            Ok(vec![incident("a")]),
            Err(fetch_failure()),
            Ok(vec![incident("b")]),
        ]));
        let mut cache = cache(Arc::clone(&feed), 60);

        cache.get(t0()).await.unwrap();
        cache.get(t0() + TimeDelta::seconds(61)).await.unwrap();

        // Still stale, so the transport is tried again right away.
        let third = cache.get(t0() + TimeDelta::seconds(62)).await.unwrap();
        assert_eq!(feed.fetch_count(), 3);
        assert_eq!(third[0].key, "b");
    }

    #[tokio::test]
    async fn scenario_ttl_sixty_seconds() {
        // t=0 fetch, t=30 cached, t=61 fetch again.
        let feed = Arc::new(ScriptedFeed::new([
            Ok(vec![incident("a")]),
            Ok(vec![incident("a")]),
        ]));
        let mut cache = cache(Arc::clone(&feed), 60);

        cache.get(t0()).await.unwrap();
        assert_eq!(feed.fetch_count(), 1);
        cache.get(t0() + TimeDelta::seconds(30)).await.unwrap();
        assert_eq!(feed.fetch_count(), 1);
        cache.get(t0() + TimeDelta::seconds(61)).await.unwrap();
        assert_eq!(feed.fetch_count(), 2);
    }
}
