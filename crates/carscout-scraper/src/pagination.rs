//! Page-by-page aggregation loop with data-driven termination.
//!
//! Pages are requested strictly one at a time starting at page 1. After each
//! page the loop stops when:
//!
//! - the page produced no listings (a failed fetch counts as empty),
//! - the upstream total-count facet says this page was the last one,
//! - the page index reached the query's `max_pages`.
//!
//! Otherwise it sleeps for the configured delay and requests the next page.

use std::future::Future;
use std::time::Duration;

use carscout_core::SearchQuery;

use crate::dedup::AggregationState;
use crate::events::{ProgressEvent, ProgressObserver, StopReason};
use crate::types::FetchedPage;

/// Anything that can produce one normalized page of results.
///
/// Implementations must not fail: transport and decode errors are reported
/// as [`FetchedPage::failed`].
pub trait PageSource {
    fn fetch_page(
        &self,
        query: &SearchQuery,
        page: u32,
    ) -> impl Future<Output = FetchedPage> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationSummary {
    /// Number of fetches issued, including the one that ended the loop.
    pub pages_fetched: u32,
    pub stop_reason: StopReason,
}

/// Drives `source` through successive pages of `query`, appending every
/// page's listings to `state`.
///
/// Does not emit [`ProgressEvent::Finished`]; the caller does once the
/// final listing count is known.
pub async fn paginate<S: PageSource>(
    source: &S,
    query: &SearchQuery,
    delay: Duration,
    state: &mut AggregationState,
    observer: &dyn ProgressObserver,
) -> PaginationSummary {
    let mut page: u32 = 1;
    let mut known_total_pages: Option<u64> = None;

    loop {
        let fetched = source.fetch_page(query, page).await;

        if fetched.listings.is_empty() {
            let stop_reason = if fetched.is_failure() {
                StopReason::FetchFailed
            } else {
                StopReason::EmptyPage
            };
            tracing::info!(page, ?stop_reason, "no listings on page, stopping");
            return PaginationSummary {
                pages_fetched: page,
                stop_reason,
            };
        }

        let total_results = fetched.total_results();
        let listings = fetched.listings.len();
        let new_unique = state.append(fetched.listings);
        observer.on_event(&ProgressEvent::PageFetched {
            page,
            listings,
            new_unique,
        });

        if let Some(total_results) = total_results {
            let total_pages = query.pages_for(total_results);
            if known_total_pages != Some(total_pages) {
                known_total_pages = Some(total_pages);
                observer.on_event(&ProgressEvent::TotalDiscovered {
                    total_results,
                    total_pages,
                });
            }
            if u64::from(page) >= total_pages {
                return PaginationSummary {
                    pages_fetched: page,
                    stop_reason: StopReason::TotalReached,
                };
            }
        }

        if page >= query.max_pages() {
            return PaginationSummary {
                pages_fetched: page,
                stop_reason: StopReason::MaxPages,
            };
        }

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        page += 1;
    }
}
