//! Read-time recency classification.
//!
//! Age, tier, and color are functions of "now", so they are recomputed
//! every time an incident is read instead of being cached at fetch
//! time. The tier boundary table itself lives with the taxonomy in
//! [`RecencyTier`].

use chrono::{DateTime, Utc};
use citizen_watch_incident_models::RecencyTier;
use serde::Serialize;

/// Derived, time-dependent display attributes for one incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Recency {
    /// Whole minutes since the incident was created, clamped at zero
    /// for timestamps in the future (clock skew).
    pub age_minutes: i64,
    /// Age bucket.
    pub tier: RecencyTier,
    /// RGBA display color for the tier.
    pub color: &'static str,
}

impl Recency {
    /// Classifies an incident created at `created_at` as seen from
    /// `now`. Pure; any finite timestamp pair produces a result.
    #[must_use]
    pub fn classify(created_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let age_minutes = now.signed_duration_since(created_at).num_minutes().max(0);
        let tier = RecencyTier::for_age_minutes(age_minutes);
        Self {
            age_minutes,
            tier,
            color: tier.color(),
        }
    }

    /// Short human-readable age, e.g. `"12m ago"`.
    #[must_use]
    pub fn age_label(self) -> String {
        format_age(self.age_minutes)
    }
}

/// Formats an age in minutes as `"just now"` / `"Nm ago"` / `"Nh ago"`
/// / `"Nd ago"`.
#[must_use]
pub fn format_age(minutes: i64) -> String {
    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{minutes}m ago")
    } else if minutes < 1440 {
        format!("{}h ago", minutes / 60)
    } else {
        format!("{}d ago", minutes / 1440)
    }
}
