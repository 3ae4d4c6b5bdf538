//! VesselFinder API client.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use reqwest::Url;
use tracing::{debug, info, warn};

use super::types::{VesselData, VesselError};
use crate::cache::{Clock, SystemClock};
use crate::provider::AsyncHttpClient;

pub const DEFAULT_ENDPOINT: &str = "https://api.vesselfinder.com/vessels";

/// Request timeout for the vessel API.
pub const VESSEL_API_TIMEOUT: Duration = Duration::from_secs(10);

/// How long a successful report is reused before the API is asked again.
pub const DEFAULT_CACHE_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, Clone)]
struct LastGood {
    fetched_at: Instant,
    updated: DateTime<Utc>,
    data: VesselData,
}

/// Client for one tracked vessel.
pub struct VesselClient<C> {
    http: Arc<C>,
    endpoint: String,
    api_key: String,
    mmsi: String,
    cache_timeout: Duration,
    clock: Arc<dyn Clock>,
    last_good: Mutex<Option<LastGood>>,
    /// Held while a refresh is in flight so concurrent callers share it.
    refresh: tokio::sync::Mutex<()>,
}

impl<C: AsyncHttpClient> VesselClient<C> {
    pub fn new(http: Arc<C>, api_key: impl Into<String>, mmsi: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.into(),
            mmsi: mmsi.into(),
            cache_timeout: DEFAULT_CACHE_TIMEOUT,
            clock: Arc::new(SystemClock),
            last_good: Mutex::new(None),
            refresh: tokio::sync::Mutex::new(()),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_cache_timeout(mut self, timeout: Duration) -> Self {
        self.cache_timeout = timeout;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn mmsi(&self) -> &str {
        &self.mmsi
    }

    pub fn cache_timeout(&self) -> Duration {
        self.cache_timeout
    }

    /// Asks the API for the latest report and remembers it on success.
    pub async fn fetch(&self) -> Result<VesselData, VesselError> {
        if self.api_key.trim().is_empty() {
            return Err(VesselError::MissingApiKey);
        }

        let url = Url::parse_with_params(
            &self.endpoint,
            [("userkey", self.api_key.as_str()), ("mmsi", self.mmsi.as_str())],
        )
        .map_err(|e| VesselError::Parse(format!("invalid endpoint: {e}")))?;

        info!(mmsi = %self.mmsi, "Fetching vessel data");
        let body = self.http.get(url.as_str()).await.map_err(|e| {
            warn!(mmsi = %self.mmsi, error = %e, "Vessel API request failed");
            VesselError::from(e)
        })?;

        let data = VesselData::from_api_response(&body, &self.mmsi).map_err(|e| {
            warn!(mmsi = %self.mmsi, error = %e, "Vessel API response rejected");
            e
        })?;

        info!(mmsi = %self.mmsi, name = %data.name, "Vessel data updated");
        *self.last_good.lock() = Some(LastGood {
            fetched_at: self.clock.now(),
            updated: Utc::now(),
            data: data.clone(),
        });
        Ok(data)
    }

    /// The last good report if it is younger than the cache timeout.
    pub fn cached(&self) -> Option<VesselData> {
        let guard = self.last_good.lock();
        let last = guard.as_ref()?;
        let age = self.clock.now().saturating_duration_since(last.fetched_at);
        (age < self.cache_timeout).then(|| last.data.clone())
    }

    /// A fresh cached report, or a new one from the API.
    ///
    /// Only one refresh runs at a time; callers that arrive during it wait
    /// and reuse its report instead of calling the API again.
    pub async fn current(&self) -> Result<VesselData, VesselError> {
        if let Some(data) = self.cached() {
            debug!(mmsi = %self.mmsi, "Using cached vessel data");
            return Ok(data);
        }
        let _refresh = self.refresh.lock().await;
        if let Some(data) = self.cached() {
            debug!(mmsi = %self.mmsi, "Vessel data refreshed by another request");
            return Ok(data);
        }
        self.fetch().await
    }

    /// Wall-clock time of the last successful fetch.
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_good.lock().as_ref().map(|last| last.updated)
    }
}
