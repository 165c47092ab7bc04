//! HTTP client for the Discogs catalog.
//!
//! All outbound requests share one throttle clock and retry throttling
//! responses with exponential backoff. Search endpoints return ranked
//! candidate lists; detail endpoints return full album metadata for a
//! master or release id.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use thiserror::Error;
use tracing::{debug, warn};

use super::models::{
    CandidateRecord, CatalogAlbum, RawDetailsResponse, RawSearchResponse, RecordKind,
};
use super::throttle::{BackoffPolicy, RequestThrottle, ThrottleConfig};

const DEFAULT_BASE_URL: &str = "https://api.discogs.com";
const USER_AGENT: &str = "ListOmania/1.0";
const SEARCH_PAGE_SIZE: u32 = 20;

/// Errors from catalog lookups.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog still throttling after {0} retries")]
    RateLimitExceeded(u32),

    #[error("catalog record not found: {0}")]
    NotFound(String),

    #[error("catalog unavailable: {0}")]
    Unavailable(String),

    #[error("unexpected catalog response: {0}")]
    Parse(String),
}

/// Search and detail lookups against the external album catalog.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Free-text search over master records.
    async fn search_by_text(&self, query: &str) -> Result<Vec<CandidateRecord>, CatalogError>;

    /// Structured search: masters by artist + release title, falling
    /// back to releases, then to a free-text search.
    async fn search_by_artist_and_title(
        &self,
        artist: &str,
        title: &str,
    ) -> Result<Vec<CandidateRecord>, CatalogError>;

    /// Fetch full metadata for a catalog id.
    ///
    /// Without an explicit kind the master endpoint is tried first and
    /// the release endpoint on hard failure, since some ids only
    /// resolve under one kind.
    async fn fetch_details(
        &self,
        id: &str,
        kind: Option<RecordKind>,
    ) -> Result<CatalogAlbum, CatalogError>;
}

/// Discogs-backed implementation of [`CatalogClient`].
pub struct DiscogsClient {
    client: Client,
    base_url: String,
    token: String,
    throttle: RequestThrottle,
    backoff: BackoffPolicy,
}

impl DiscogsClient {
    pub fn new(token: String, config: ThrottleConfig) -> Result<Self, CatalogError> {
        Self::with_base_url(DEFAULT_BASE_URL.to_string(), token, config)
    }

    /// Create a client against a non-default base URL (used by tests).
    pub fn with_base_url(
        base_url: String,
        token: String,
        config: ThrottleConfig,
    ) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            token,
            throttle: RequestThrottle::new(config.min_interval),
            backoff: BackoffPolicy::from_config(&config),
        })
    }

    /// Issue one GET, waiting on the shared throttle clock and retrying
    /// 429 responses per the backoff policy.
    async fn get_with_retry(&self, url: &str) -> Result<Response, CatalogError> {
        let mut retries = 0u32;
        loop {
            self.throttle.wait().await;

            let response = self
                .client
                .get(url)
                .header("Authorization", format!("Discogs token={}", self.token))
                .send()
                .await
                .map_err(|e| CatalogError::Unavailable(e.to_string()))?;

            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                retries += 1;
                if retries > self.backoff.max_retries() {
                    return Err(CatalogError::RateLimitExceeded(self.backoff.max_retries()));
                }
                let delay = self.backoff.delay_for(retries);
                warn!(
                    "Catalog throttling, waiting {}ms before retry {}/{}",
                    delay.as_millis(),
                    retries,
                    self.backoff.max_retries()
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            return Ok(response);
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<T, CatalogError> {
        let response = self.get_with_retry(url).await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(CatalogError::Unavailable(format!(
                "catalog responded with status {}",
                status
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| CatalogError::Parse(e.to_string()))
    }

    async fn search(
        &self,
        params: &[(&str, &str)],
        kind: RecordKind,
    ) -> Result<Vec<CandidateRecord>, CatalogError> {
        let query: String = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let url = format!(
            "{}/database/search?{}&type={}&per_page={}",
            self.base_url,
            query,
            kind.as_str(),
            SEARCH_PAGE_SIZE
        );

        let body: RawSearchResponse = self.get_json(&url).await?;
        Ok(body
            .results
            .into_iter()
            .map(|r| r.into_candidate(kind))
            .collect())
    }

    async fn fetch_details_of_kind(
        &self,
        id: &str,
        kind: RecordKind,
    ) -> Result<CatalogAlbum, CatalogError> {
        let endpoint = match kind {
            RecordKind::Master => "masters",
            RecordKind::Release => "releases",
        };
        let url = format!("{}/{}/{}", self.base_url, endpoint, urlencoding::encode(id));
        let body: RawDetailsResponse = self.get_json(&url).await?;
        Ok(body.into_album(kind))
    }
}

#[async_trait]
impl CatalogClient for DiscogsClient {
    async fn search_by_text(&self, query: &str) -> Result<Vec<CandidateRecord>, CatalogError> {
        debug!("Catalog free-text search: {:?}", query);
        self.search(&[("q", query)], RecordKind::Master).await
    }

    async fn search_by_artist_and_title(
        &self,
        artist: &str,
        title: &str,
    ) -> Result<Vec<CandidateRecord>, CatalogError> {
        debug!("Catalog search: {:?} - {:?}", artist, title);

        let params = [("artist", artist), ("release_title", title)];

        let masters = self.search(&params, RecordKind::Master).await?;
        if !masters.is_empty() {
            debug!("Found {} masters", masters.len());
            return Ok(masters);
        }

        let releases = self.search(&params, RecordKind::Release).await?;
        if !releases.is_empty() {
            debug!("No masters, found {} releases", releases.len());
            return Ok(releases);
        }

        debug!("No structured hits, falling back to free-text search");
        self.search_by_text(&format!("{} {}", artist, title)).await
    }

    async fn fetch_details(
        &self,
        id: &str,
        kind: Option<RecordKind>,
    ) -> Result<CatalogAlbum, CatalogError> {
        if let Some(kind) = kind {
            return self.fetch_details_of_kind(id, kind).await;
        }

        match self.fetch_details_of_kind(id, RecordKind::Master).await {
            Ok(album) => Ok(album),
            // Exhausted throttling retries won't fare better on the
            // other endpoint; everything else gets the release fallback.
            Err(CatalogError::RateLimitExceeded(n)) => Err(CatalogError::RateLimitExceeded(n)),
            Err(e) => {
                debug!("Master lookup for {} failed ({}), trying release", id, e);
                self.fetch_details_of_kind(id, RecordKind::Release).await
            }
        }
    }
}
