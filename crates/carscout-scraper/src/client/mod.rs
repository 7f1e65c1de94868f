//! HTTP client for the upstream vehicle search endpoint.

mod params;

use std::time::Duration;

use carscout_core::{AppConfig, ScrapingConfig, SearchQuery};
use reqwest::{Client, Url};
use serde_json::Value;

use crate::decode::decode_body;
use crate::error::ScraperError;
use crate::normalize::normalize_page;
use crate::pagination::PageSource;
use crate::rate_limit::retry_with_backoff;
use crate::types::{FetchedPage, RawPage};

pub use params::search_params;

/// Site the search API expects requests to come from.
const SITE_ORIGIN: &str = "https://www.carfax.com";

/// Client for one aggregation session.
///
/// Owns its own `reqwest::Client` (connection pool, timeout, `User-Agent`);
/// sessions running side by side each build their own.
///
/// Transient failures are retried with exponential backoff up to
/// `max_retries` additional attempts per page.
pub struct ListingClient {
    client: Client,
    base_url: Url,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl ListingClient {
    /// Creates a client for the search endpoint at `base_url`.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::InvalidBaseUrl`] if `base_url` does not parse.
    /// - [`ScraperError::Http`] if the underlying `reqwest::Client` cannot be
    ///   constructed.
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, ScraperError> {
        let base_url = Url::parse(base_url).map_err(|e| ScraperError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url,
            max_retries,
            backoff_base_secs,
        })
    }

    /// Builds a client from process settings and the search document's
    /// scraping group.
    ///
    /// # Errors
    ///
    /// See [`Self::new`].
    pub fn from_config(app: &AppConfig, scraping: &ScrapingConfig) -> Result<Self, ScraperError> {
        Self::new(
            &app.api_base_url,
            scraping.timeout_seconds,
            &app.user_agent,
            scraping.max_retries,
            app.retry_backoff_base_secs,
        )
    }

    /// Full request URL for `page` of `query`.
    #[must_use]
    pub fn search_url(&self, query: &SearchQuery, page: u32) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .extend_pairs(search_params(query, page));
        url
    }

    /// Fetches and decodes one page, retrying transient failures.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::RateLimited`]: HTTP 429 after all retries.
    /// - [`ScraperError::UnexpectedStatus`]: any other non-2xx status.
    /// - [`ScraperError::Http`]: network or timeout failure after all retries.
    /// - [`ScraperError::Decode`]: the body could not be turned into JSON.
    pub async fn try_fetch_page(
        &self,
        query: &SearchQuery,
        page: u32,
    ) -> Result<Value, ScraperError> {
        let url = self.search_url(query, page);
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            self.request_page_once(url.clone(), page)
        })
        .await
    }

    /// Fetches one page and normalizes its listings. Never fails: any error
    /// is logged and reported as an empty page without payload.
    pub async fn fetch_search_page(&self, query: &SearchQuery, page: u32) -> FetchedPage {
        tracing::debug!(page, make = query.make(), model = query.model(), "fetching page");

        match self.try_fetch_page(query, page).await {
            Ok(payload) => {
                let listings = normalize_page(&RawPage::from_document(&payload));
                tracing::info!(page, listings = listings.len(), "page fetched");
                FetchedPage {
                    listings,
                    payload: Some(payload),
                }
            }
            Err(e) => {
                tracing::warn!(page, error = %e, "page fetch failed, treating as end of results");
                FetchedPage::failed()
            }
        }
    }

    async fn request_page_once(&self, url: Url, page: u32) -> Result<Value, ScraperError> {
        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json, text/plain, */*")
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .header(reqwest::header::ACCEPT_ENCODING, "gzip, br")
            .header(reqwest::header::REFERER, format!("{SITE_ORIGIN}/"))
            .header(reqwest::header::ORIGIN, SITE_ORIGIN)
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .header(reqwest::header::PRAGMA, "no-cache")
            .send()
            .await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(0);
            return Err(ScraperError::RateLimited {
                host: url.host_str().unwrap_or_default().to_owned(),
                retry_after_secs,
            });
        }

        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        // Read the declared encoding before consuming the body.
        let content_encoding = response
            .headers()
            .get(reqwest::header::CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let body = response.bytes().await?;
        decode_body(content_encoding.as_deref(), &body)
            .map_err(|source| ScraperError::Decode { page, source })
    }
}

impl PageSource for ListingClient {
    fn fetch_page(
        &self,
        query: &SearchQuery,
        page: u32,
    ) -> impl std::future::Future<Output = FetchedPage> + Send {
        self.fetch_search_page(query, page)
    }
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
