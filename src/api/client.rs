//! REST client for the incident-report backend and the chat endpoint.
//!
//! One `ApiClient` owns the HTTP connection pool, the endpoint bases and
//! the bearer credential for the lifetime of a session. Paths and
//! parameter names are preserved exactly for backend compatibility.

use crate::api::query::FilterSelection;
use crate::api::types::{FeedItem, FilterOptions, LocationDocument, NewsCount};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Request timeout. A hung backend request clears the loading flag via
/// this timeout instead of leaving it set indefinitely.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Static fallback for `get_all_areas` when the endpoint is unreachable.
const FALLBACK_AREAS: [&str; 5] = ["Gaza", "Lebanon", "West Bank", "Israel", "Worldwide"];

/// Errors from backend communication.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network-level error (DNS, connection, TLS, timeout) or a body
    /// that failed to decode as the expected JSON shape.
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code.
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Endpoint base and path could not be combined into a URL.
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// HTTP client bound to one authenticated session.
///
/// The bearer token is owned explicitly here and attached to every
/// authenticated request; there is no ambient token lookup.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    api_base: Url,
    chat_base: Url,
    token: SecretString,
}

impl ApiClient {
    pub fn new(api_base: Url, chat_base: Url, token: SecretString) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            http,
            api_base: ensure_trailing_slash(api_base),
            chat_base: ensure_trailing_slash(chat_base),
            token,
        })
    }

    /// Fetch one page of reports for the active filter.
    pub async fn fetch_page(
        &self,
        filters: &FilterSelection,
        page: u32,
        limit: u32,
    ) -> Result<Vec<FeedItem>, ApiError> {
        let mut params = filters.to_params();
        params.push(("page".into(), page.to_string()));
        params.push(("limit".into(), limit.to_string()));
        self.get_authed("get_news_by_filter", &params).await
    }

    /// Total report count for the active filter.
    pub async fn fetch_news_count(&self, filters: &FilterSelection) -> Result<u64, ApiError> {
        let params = filters.to_params();
        let count: NewsCount = self
            .get_authed("get_count_of_news_by_filter", &params)
            .await?;
        Ok(count.news_count)
    }

    /// Per-category aggregate counts. Opaque to the core; passed through
    /// to the view.
    pub async fn fetch_category_counts(
        &self,
        filters: &FilterSelection,
    ) -> Result<serde_json::Value, ApiError> {
        self.get_authed("get_categories_counts_by_filter", &filters.to_params())
            .await
    }

    /// Per-source aggregate counts (opaque).
    pub async fn fetch_source_counts(
        &self,
        filters: &FilterSelection,
    ) -> Result<serde_json::Value, ApiError> {
        self.get_authed("get_sources_counts_by_filter", &filters.to_params())
            .await
    }

    /// Per-location aggregate counts (opaque).
    pub async fn fetch_location_counts(
        &self,
        filters: &FilterSelection,
    ) -> Result<serde_json::Value, ApiError> {
        self.get_authed("get_locations_counts_by_filter", &filters.to_params())
            .await
    }

    /// Look up precise polygon geometry for a location id.
    ///
    /// The backend returns `[lat, lng]` pairs; the ring is
    /// coordinate-swapped to `[lng, lat]` here so downstream overlay
    /// geometry has a single convention. Returns `Ok(None)` when the
    /// first document is missing or not a polygon.
    pub async fn fetch_location_polygon(
        &self,
        location_id: &str,
    ) -> Result<Option<Vec<Vec<[f64; 2]>>>, ApiError> {
        let params = [("location_id".to_string(), location_id.to_string())];
        let documents: Vec<LocationDocument> =
            self.get_authed("get_document_by_location_id", &params).await?;

        let Some(first) = documents.into_iter().next() else {
            return Ok(None);
        };
        if first.kind.as_deref() != Some("Polygon") {
            return Ok(None);
        }
        let swapped = first
            .polygon
            .into_iter()
            .map(|ring| ring.into_iter().map(|[lat, lng]| [lng, lat]).collect())
            .collect();
        Ok(Some(swapped))
    }

    /// Fetch all enumerated filter option lists.
    ///
    /// `get_all_areas` is unauthenticated and falls back to a static
    /// list on failure; the remaining four lists are fetched
    /// concurrently with the bearer credential. A failed list degrades
    /// to empty rather than failing the whole startup.
    pub async fn fetch_filter_options(&self) -> FilterOptions {
        let areas = match self.get_public::<Vec<String>>("get_all_areas").await {
            Ok(areas) if !areas.is_empty() => areas,
            Ok(_) => FALLBACK_AREAS.iter().map(|s| s.to_string()).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch areas, using fallback list");
                FALLBACK_AREAS.iter().map(|s| s.to_string()).collect()
            }
        };

        let no_params: &[(String, String)] = &[];
        let (locations, categories, sources, types) = tokio::join!(
            self.get_authed::<Vec<String>>("get_all_locations", no_params),
            self.get_authed::<Vec<String>>("get_all_categories", no_params),
            self.get_authed::<Vec<String>>("get_all_sources", no_params),
            self.get_authed::<Vec<String>>("get_all_types", no_params),
        );

        FilterOptions {
            areas,
            locations: unwrap_list("locations", locations),
            categories: unwrap_list("categories", categories),
            sources: unwrap_list("sources", sources),
            types: unwrap_list("types", types),
        }
    }

    /// Send one chat message and return the assistant's reply text.
    pub async fn send_chat(&self, message: &str) -> Result<String, ApiError> {
        let url = self.chat_base.join("chat")?;
        let response = self
            .http
            .post(url)
            .bearer_auth(self.token.expose_secret())
            .json(&serde_json::json!({ "message": message }))
            .send()
            .await?;
        let response = check_status(response)?;

        #[derive(serde::Deserialize)]
        struct ChatReply {
            response: String,
        }
        let reply: ChatReply = response.json().await?;
        Ok(reply.response)
    }

    async fn get_authed<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<T, ApiError> {
        let url = self.api_base.join(path)?;
        let response = self
            .http
            .get(url)
            .query(params)
            .bearer_auth(self.token.expose_secret())
            .send()
            .await?;
        Ok(check_status(response)?.json().await?)
    }

    async fn get_public<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.api_base.join(path)?;
        let response = self.http.get(url).send().await?;
        Ok(check_status(response)?.json().await?)
    }
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    if !response.status().is_success() {
        return Err(ApiError::HttpStatus(response.status().as_u16()));
    }
    Ok(response)
}

fn unwrap_list(name: &str, result: Result<Vec<String>, ApiError>) -> Vec<String> {
    match result {
        Ok(list) => list,
        Err(e) => {
            tracing::warn!(list = name, error = %e, "Failed to fetch filter options");
            Vec::new()
        }
    }
}

/// `Url::join` replaces the last path segment unless the base ends with
/// a slash, so normalize once at construction.
fn ensure_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        url.set_path(&format!("{}/", url.path()));
    }
    url
}
