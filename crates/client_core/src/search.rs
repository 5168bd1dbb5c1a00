//! Favorite-team lookup against the external team-search service.
//!
//! Lookups are gated on query length only; there is no timer. Every keystroke
//! at or above [`SEARCH_MIN_CHARS`] issues one request, and each request is
//! tagged with a sequence number so that only the most recently issued one can
//! populate the result list.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use async_trait::async_trait;
use reqwest::Client;
use shared::{domain::TeamSummary, protocol::TeamSearchEnvelope};
use thiserror::Error;
use tracing::{debug, warn};

pub const SEARCH_MIN_CHARS: usize = 3;

pub type TeamCandidate = TeamSummary;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("team search request failed: {0}")]
    Transport(String),
    #[error("team search returned status {status}")]
    Status { status: u16 },
    #[error("malformed team search response: {0}")]
    Decode(String),
}

#[async_trait]
pub trait TeamSearchService: Send + Sync {
    async fn search_teams(&self, query: &str) -> Result<Vec<TeamCandidate>, SearchError>;
}

pub fn meets_threshold(query: &str) -> bool {
    query.chars().count() >= SEARCH_MIN_CHARS
}

/// Team search over HTTP with provider API-key headers.
pub struct HttpTeamSearch {
    http: Client,
    endpoint: String,
    api_key: Option<String>,
    api_host: Option<String>,
}

impl HttpTeamSearch {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: endpoint.into(),
            api_key: None,
            api_host: None,
        }
    }

    pub fn with_credentials(mut self, api_key: Option<String>, api_host: Option<String>) -> Self {
        self.api_key = api_key;
        self.api_host = api_host;
        self
    }
}

#[async_trait]
impl TeamSearchService for HttpTeamSearch {
    async fn search_teams(&self, query: &str) -> Result<Vec<TeamCandidate>, SearchError> {
        let mut request = self.http.get(&self.endpoint).query(&[("search", query)]);
        if let Some(key) = &self.api_key {
            request = request.header("X-RapidAPI-Key", key);
        }
        if let Some(host) = &self.api_host {
            request = request.header("X-RapidAPI-Host", host);
        }

        let response = request
            .send()
            .await
            .map_err(|err| SearchError::Transport(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status {
                status: status.as_u16(),
            });
        }

        let envelope: TeamSearchEnvelope = response
            .json()
            .await
            .map_err(|err| SearchError::Decode(err.to_string()))?;
        Ok(envelope
            .response
            .into_iter()
            .map(|entry| TeamCandidate::from(entry.team))
            .collect())
    }
}

/// Length gate plus failure accounting in front of a [`TeamSearchService`].
pub struct SearchProvider {
    service: Arc<dyn TeamSearchService>,
    failures: AtomicU64,
}

impl SearchProvider {
    pub fn new(service: Arc<dyn TeamSearchService>) -> Self {
        Self {
            service,
            failures: AtomicU64::new(0),
        }
    }

    /// Candidates for `query`. Short queries and failed lookups both yield an
    /// empty list; failures are logged and counted, never surfaced.
    pub async fn search(&self, query: &str) -> Vec<TeamCandidate> {
        if !meets_threshold(query) {
            return Vec::new();
        }

        match self.service.search_teams(query).await {
            Ok(candidates) => {
                debug!(query, results = candidates.len(), "search: teams fetched");
                candidates
            }
            Err(err) => {
                let failures = self.failures.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(query, failures, "search: team lookup failed: {err}");
                Vec::new()
            }
        }
    }

    pub fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

/// Query text, visible candidates and the committed selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    query: String,
    results: Vec<TeamCandidate>,
    issued: u64,
    selection: Option<TeamCandidate>,
}

impl SearchState {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &[TeamCandidate] {
        &self.results
    }

    pub fn selection(&self) -> Option<&TeamCandidate> {
        self.selection.as_ref()
    }

    pub fn latest_sequence(&self) -> u64 {
        self.issued
    }

    /// Records new query text. Returns the sequence number to tag the lookup
    /// with, or `None` when the query is too short; in that case the results
    /// are cleared and any lookup still in flight is invalidated.
    pub fn input(&mut self, query: impl Into<String>) -> Option<u64> {
        self.query = query.into();
        self.issued += 1;
        if meets_threshold(&self.query) {
            Some(self.issued)
        } else {
            self.results.clear();
            None
        }
    }

    /// Applies a completed lookup if it is the latest one issued.
    pub fn complete(&mut self, sequence: u64, results: Vec<TeamCandidate>) -> bool {
        if sequence != self.issued {
            return false;
        }
        self.results = results;
        true
    }

    /// Commits `candidate` if it is one of the visible results.
    pub fn select(&mut self, candidate: &TeamCandidate) -> bool {
        if !self.results.contains(candidate) {
            return false;
        }
        self.selection = Some(candidate.clone());
        true
    }

    /// Forgets query, results and selection. The sequence keeps counting so
    /// that completions of earlier lookups are still recognised as stale.
    pub fn reset(&mut self) {
        self.query.clear();
        self.results.clear();
        self.selection = None;
        self.issued += 1;
    }
}
