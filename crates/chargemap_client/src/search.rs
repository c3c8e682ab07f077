use std::collections::VecDeque;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use chargemap_core::{SearchContext, Station};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("station search request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("station search returned HTTP {status}")]
    Api { status: u16 },
}

/// The effective parameters the backend applied, echoed in the response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: u32,
    #[serde(default)]
    pub status_filter: Option<String>,
    pub total_found: usize,
}

/// Payload of the nearby-station search endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub stations: Vec<Station>,
    pub search_params: SearchParams,
}

/// Station proximity search, as provided by the backend.
///
/// The session model consumes the station list only; `search_params` is
/// informational.
pub trait StationSearch {
    fn nearby(
        &self,
        context: &SearchContext,
    ) -> impl Future<Output = Result<SearchResponse, SearchError>> + Send;
}

/// Configuration for the REST search client.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Base URL of the station backend
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Maximum number of stations to request per search
    pub limit: u32,
}

impl SearchConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        SearchConfig {
            base_url: base_url.into(),
            timeout_secs: 30,
            limit: 50,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }
}

/// reqwest-backed search client against
/// `GET {base}/api/stations/nearby/search`.
#[derive(Debug, Clone)]
pub struct RestStationSearch {
    http: reqwest::Client,
    base_url: String,
    limit: u32,
}

impl RestStationSearch {
    pub fn new(config: SearchConfig) -> Result<Self, SearchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(RestStationSearch {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            limit: config.limit,
        })
    }

    fn query_pairs(&self, context: &SearchContext) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("lat", context.latitude().to_string()),
            ("lon", context.longitude().to_string()),
            ("radius", context.radius_meters().to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(status) = context.status_filter() {
            pairs.push(("status", status.as_wire_str().to_string()));
        }
        pairs
    }
}

impl StationSearch for RestStationSearch {
    async fn nearby(&self, context: &SearchContext) -> Result<SearchResponse, SearchError> {
        let url = format!("{}/api/stations/nearby/search", self.base_url);
        tracing::debug!(%url, radius_meters = context.radius_meters(), "Fetching nearby stations");

        let response = self
            .http
            .get(&url)
            .query(&self.query_pairs(context))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Api {
                status: status.as_u16(),
            });
        }

        Ok(response.json::<SearchResponse>().await?)
    }
}

/// Search client serving canned responses, for tests and offline
/// development.
///
/// Responses are handed out in queue order; an exhausted queue answers with
/// HTTP 503 so callers exercise their failure path.
#[derive(Default)]
pub struct MockStationSearch {
    queue: Mutex<VecDeque<Result<SearchResponse, SearchError>>>,
    calls: Mutex<Vec<SearchContext>>,
}

impl MockStationSearch {
    pub fn new() -> Self {
        MockStationSearch::default()
    }

    pub fn enqueue(&self, response: SearchResponse) {
        self.queue.lock().unwrap().push_back(Ok(response));
    }

    pub fn enqueue_error(&self, error: SearchError) {
        self.queue.lock().unwrap().push_back(Err(error));
    }

    /// The contexts this client has been asked about, in call order.
    pub fn calls(&self) -> Vec<SearchContext> {
        self.calls.lock().unwrap().clone()
    }
}

impl StationSearch for MockStationSearch {
    async fn nearby(&self, context: &SearchContext) -> Result<SearchResponse, SearchError> {
        self.calls.lock().unwrap().push(*context);
        self.queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(SearchError::Api { status: 503 }))
    }
}
