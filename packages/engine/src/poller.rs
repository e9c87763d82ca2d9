//! Timer-driven polling loop.
//!
//! One poller instance services one configured region. The loop owns
//! the cache and the reconciler outright, so the single-writer
//! discipline on both holds by construction: all fetches and
//! reconciliations happen inside the tick, strictly one at a time.
//! Readers get an immutable published snapshot through a watch channel
//! and never touch live state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use citizen_watch_feed::IncidentFeed;
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::PollerConfig;
use crate::cache::FeedCache;
use crate::classify::ClassifiedIncident;
use crate::reconcile::{ChangeSet, Reconciler};

/// The immutable value published after each successful tick.
///
/// Before the first successful tick, readers see the default snapshot:
/// no incidents, no changes, no timestamp. An empty state, not an
/// error state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TickSnapshot {
    /// When this snapshot was taken; `None` only for the initial empty
    /// snapshot.
    pub at: Option<DateTime<Utc>>,
    /// Every currently active incident, classified as of `at`.
    pub incidents: Vec<ClassifiedIncident>,
    /// What changed relative to the previous successful tick.
    pub changes: ChangeSet,
}

/// Drives fetch → classify → reconcile → publish on a fixed wall-clock
/// interval.
pub struct FeedPoller {
    config: PollerConfig,
    cache: FeedCache,
    reconciler: Reconciler,
    snapshot_tx: watch::Sender<Arc<TickSnapshot>>,
}

impl FeedPoller {
    /// Creates a poller and the receiver handing out published
    /// snapshots. The receiver can be cloned freely.
    #[must_use]
    pub fn new(
        feed: Arc<dyn IncidentFeed>,
        config: PollerConfig,
    ) -> (Self, watch::Receiver<Arc<TickSnapshot>>) {
        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(TickSnapshot::default()));
        let cache = FeedCache::new(
            feed,
            config.center,
            config.radius_km,
            config.limit,
            config.ttl,
        );

        (
            Self {
                config,
                cache,
                reconciler: Reconciler::new(),
                snapshot_tx,
            },
            snapshot_rx,
        )
    }

    /// Runs until `shutdown` flips to `true` or its sender is dropped.
    ///
    /// The first tick fires immediately, so presentation is never empty
    /// for a full interval on cold start. Ticks are strictly
    /// sequential; a tick that overruns the interval delays the next
    /// one rather than overlapping it, and cancellation takes effect
    /// between ticks, never mid-pipeline.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        log::info!(
            "Polling incidents every {:?} around ({:.4}, {:.4}), radius {} km",
            self.config.interval,
            self.config.center.lat,
            self.config.center.lon,
            self.config.radius_km
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => self.tick().await,
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        log::info!("Feed poller stopping");
                        break;
                    }
                }
            }
        }
    }

    /// One pass of the pipeline. A fetch failure with nothing cached
    /// skips the tick entirely: the previous snapshot, and therefore
    /// the presentation state, stays untouched.
    async fn tick(&mut self) {
        let now = Utc::now();

        let payload = match self.cache.get(now).await {
            Ok(payload) => payload,
            Err(e) => {
                log::error!("Skipping poll tick, fetch failed: {e}");
                return;
            }
        };

        let incidents: Vec<ClassifiedIncident> = payload
            .iter()
            .map(|incident| ClassifiedIncident::new(incident.clone(), self.config.center, now))
            .collect();
        let changes = self.reconciler.reconcile(&payload);

        log::info!(
            "Tick: {} active incidents ({} created, {} updated, {} removed)",
            incidents.len(),
            changes.created.len(),
            changes.updated.len(),
            changes.removed.len()
        );

        // Published even when the changeset is empty: readers still
        // want the re-classified ages.
        self.snapshot_tx.send_replace(Arc::new(TickSnapshot {
            at: Some(now),
            incidents,
            changes,
        }));
    }
}
