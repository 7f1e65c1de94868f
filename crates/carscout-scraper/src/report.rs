//! Vehicle-history report links scraped from listing detail pages.

use std::sync::LazyLock;
use std::time::Duration;

use carscout_core::Listing;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ScraperError;

static ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<a\b([^>]*)>(.*?)</a\s*>").expect("valid regex"));
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));

/// Prefix every free history-report link shares.
const REPORT_URL_PREFIX: &str = "https://www.carfax.com/vehiclehistory/ccl/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportLink {
    pub vin: String,
    pub listing_url: String,
    pub report_url: String,
}

/// Fetches listing detail pages and pulls out their history-report link.
pub struct ReportLinkScraper {
    client: reqwest::Client,
}

impl ReportLinkScraper {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, ScraperError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    /// Report link on the page at `listing_url`, if there is one. Request and
    /// status failures are logged and yield `None`.
    pub async fn report_link(&self, listing_url: &str) -> Option<String> {
        let response = match self
            .client
            .get(listing_url)
            .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(url = listing_url, error = %e, "listing page request failed");
                return None;
            }
        };
        if !response.status().is_success() {
            tracing::warn!(
                url = listing_url,
                status = response.status().as_u16(),
                "listing page returned non-success status"
            );
            return None;
        }
        let html = match response.text().await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!(url = listing_url, error = %e, "could not read listing page");
                return None;
            }
        };

        let link = extract_report_link(&html);
        if link.is_none() {
            tracing::debug!(url = listing_url, "no report link on listing page");
        }
        link
    }

    /// Looks up report links for the first `limit` listings, one request at a
    /// time with `delay` between requests. Listings without a detail URL are
    /// skipped; only hits are returned.
    pub async fn enrich_reports(
        &self,
        listings: &[Listing],
        limit: usize,
        delay: Duration,
    ) -> Vec<ReportLink> {
        let mut links = Vec::new();
        let candidates = listings
            .iter()
            .take(limit)
            .filter(|listing| !listing.listing_url.is_empty());

        for (i, listing) in candidates.enumerate() {
            if i > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            tracing::info!(vin = %listing.vin, url = %listing.listing_url, "looking up report link");
            if let Some(report_url) = self.report_link(&listing.listing_url).await {
                links.push(ReportLink {
                    vin: listing.vin.clone(),
                    listing_url: listing.listing_url.clone(),
                    report_url,
                });
            }
        }

        tracing::info!(found = links.len(), "report link lookup finished");
        links
    }
}

/// First anchor pointing at a history report whose text mentions both
/// "view" and "report".
#[must_use]
pub fn extract_report_link(html: &str) -> Option<String> {
    ANCHOR_RE.captures_iter(html).find_map(|caps| {
        let href = extract_attr(caps.get(1)?.as_str(), "href")?.replace("&amp;", "&");
        if !href.contains(REPORT_URL_PREFIX) {
            return None;
        }
        let text = TAG_RE
            .replace_all(caps.get(2).map_or("", |m| m.as_str()), "")
            .to_lowercase();
        (text.contains("view") && text.contains("report")).then_some(href)
    })
}

fn extract_attr(tag: &str, attr: &str) -> Option<String> {
    let pattern = format!(r#"(?is)\b{}\s*=\s*["']([^"']+)["']"#, regex::escape(attr));
    let re = Regex::new(&pattern).ok()?;
    re.captures(tag)
        .and_then(|caps| caps.get(1).map(|m| m.as_str().trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_view_report_anchor() {
        let html = r#"
            <a href="/dealer">Dealer</a>
            <a class="btn" href="https://www.carfax.com/vehiclehistory/ccl/abc123?x=1&amp;y=2">
              <span>View FREE CARFAX Report</span>
            </a>
        "#;
        assert_eq!(
            extract_report_link(html).as_deref(),
            Some("https://www.carfax.com/vehiclehistory/ccl/abc123?x=1&y=2")
        );
    }

    #[test]
    fn ignores_report_anchor_without_matching_text() {
        let html = r#"<a href="https://www.carfax.com/vehiclehistory/ccl/abc">Details</a>"#;
        assert_eq!(extract_report_link(html), None);
    }

    #[test]
    fn ignores_other_hosts_with_matching_text() {
        let html = r#"<a href="https://example.com/report">View report</a>"#;
        assert_eq!(extract_report_link(html), None);
    }

    #[test]
    fn picks_first_qualifying_anchor() {
        let html = r#"
            <a href="https://www.carfax.com/vehiclehistory/ccl/first">Icon</a>
            <a href='https://www.carfax.com/vehiclehistory/ccl/second'>view report</a>
            <a href="https://www.carfax.com/vehiclehistory/ccl/third">View Report</a>
        "#;
        assert_eq!(
            extract_report_link(html).as_deref(),
            Some("https://www.carfax.com/vehiclehistory/ccl/second")
        );
    }

    #[tokio::test]
    async fn enrich_skips_listings_without_urls_and_respects_limit() {
        let scraper = ReportLinkScraper::new(1, "carscout-test/0.1").unwrap();
        let listings = vec![
            Listing {
                vin: "A".to_owned(),
                ..Listing::default()
            },
            Listing {
                vin: "B".to_owned(),
                ..Listing::default()
            },
        ];
        let links = scraper
            .enrich_reports(&listings, 5, Duration::ZERO)
            .await;
        assert!(links.is_empty());
    }
}
