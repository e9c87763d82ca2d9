//! Citizen trending-incident API client.
//!
//! The API is the same endpoint the citizen.com explore page uses. It
//! filters by a lat/lon bounding box and requires browser-looking
//! `User-Agent`/`Referer` headers. Incidents come back nested under a
//! top-level `results` array.

use std::time::Duration;

use async_trait::async_trait;
use citizen_watch_incident_models::{LatLon, RawIncident};

use crate::bbox::bounding_box;
use crate::{FeedError, IncidentFeed, retry};

/// Trending incidents endpoint.
pub const API_BASE_URL: &str = "https://citizen.com/api/incident/trending";

/// The API rejects non-browser user agents.
const API_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Total per-request timeout. Bounds how long a single poll tick can
/// stall on a slow upstream before it resolves to a [`FeedError`].
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Production [`IncidentFeed`] implementation backed by the Citizen
/// trending API.
pub struct CitizenFeed {
    client: reqwest::Client,
    base_url: String,
}

impl CitizenFeed {
    /// Creates a client against the public API endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] if the HTTP client cannot be constructed.
    pub fn new() -> Result<Self, FeedError> {
        Self::with_base_url(API_BASE_URL)
    }

    /// Creates a client against an alternate endpoint (test servers).
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] if the HTTP client cannot be constructed.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl IncidentFeed for CitizenFeed {
    async fn fetch(
        &self,
        center: LatLon,
        radius_km: f64,
        limit: u32,
    ) -> Result<Vec<RawIncident>, FeedError> {
        let bbox = bounding_box(center, radius_km);
        let params = [
            ("lowerLatitude", bbox.lower_lat.to_string()),
            ("lowerLongitude", bbox.lower_lon.to_string()),
            ("upperLatitude", bbox.upper_lat.to_string()),
            ("upperLongitude", bbox.upper_lon.to_string()),
            ("fullResponse", "true".to_string()),
            ("limit", limit.to_string()),
        ];

        let mut body = retry::send_json(|| {
            self.client
                .get(&self.base_url)
                .query(&params)
                .header(reqwest::header::ACCEPT, "*/*")
                .header(reqwest::header::REFERER, "https://citizen.com/explore")
                .header(reqwest::header::USER_AGENT, API_USER_AGENT)
        })
        .await?;

        let results = body
            .get_mut("results")
            .map(serde_json::Value::take)
            .ok_or_else(|| FeedError::UnexpectedResponse {
                message: "missing 'results' field".to_string(),
            })?;
        let serde_json::Value::Array(results) = results else {
            return Err(FeedError::UnexpectedResponse {
                message: "'results' is not an array".to_string(),
            });
        };

        // Individual records missing required fields are dropped rather
        // than failing the whole payload.
        let incidents = results
            .into_iter()
            .filter_map(|record| match serde_json::from_value::<RawIncident>(record) {
                Ok(incident) => Some(incident),
                Err(e) => {
                    log::debug!("Skipping malformed incident record: {e}");
                    None
                }
            })
            .collect();

        Ok(incidents)
    }
}
