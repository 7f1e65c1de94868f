//! One end-to-end aggregation run: paginate, dedupe, optionally persist.

use std::sync::Arc;
use std::time::Duration;

use carscout_core::{Listing, SearchQuery};
use serde::Serialize;

use crate::dedup::AggregationState;
use crate::events::{ProgressEvent, ProgressObserver, StopReason, TracingObserver};
use crate::pagination::{paginate, PageSource};
use crate::persist::{JsonFileSink, ListingSink};

/// What a session produced.
#[derive(Debug, Clone, Serialize)]
pub struct AggregationOutcome {
    /// Deduplicated listings in first-seen order.
    pub listings: Vec<Listing>,
    pub pages_fetched: u32,
    pub stop_reason: StopReason,
    /// Where the listings were written, when a sink was configured and the
    /// write succeeded.
    pub persisted_to: Option<String>,
    pub persist_error: Option<String>,
}

/// Runs aggregation against a [`PageSource`].
///
/// Each call to [`run`](Self::run) starts from fresh state, so one session
/// value can be reused for several queries. Concurrent callers should build
/// one session (and one source) each.
pub struct AggregationSession<S, K = JsonFileSink> {
    source: S,
    delay: Duration,
    sink: Option<K>,
    observer: Arc<dyn ProgressObserver>,
}

impl<S: PageSource> AggregationSession<S> {
    /// A session that does not persist its results.
    pub fn new(source: S, delay: Duration) -> Self {
        Self {
            source,
            delay,
            sink: None,
            observer: Arc::new(TracingObserver),
        }
    }
}

impl<S: PageSource, K: ListingSink> AggregationSession<S, K> {
    /// Replaces the sink; results are written there after every run.
    pub fn with_sink<K2: ListingSink>(self, sink: K2) -> AggregationSession<S, K2> {
        AggregationSession {
            source: self.source,
            delay: self.delay,
            sink: Some(sink),
            observer: self.observer,
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Runs the query to completion.
    ///
    /// Never fails. An unresolvable query (blank make or model) returns an
    /// empty outcome without issuing any request; persistence errors are
    /// logged and recorded in the outcome while the listings are still
    /// returned.
    pub async fn run(&self, query: &SearchQuery) -> AggregationOutcome {
        if !query.is_resolvable() {
            tracing::warn!(
                make = query.make(),
                model = query.model(),
                "query has a blank make or model, nothing to fetch"
            );
            self.observer.on_event(&ProgressEvent::Finished {
                reason: StopReason::QueryUnresolved,
                pages_fetched: 0,
                listings: 0,
            });
            return AggregationOutcome {
                listings: Vec::new(),
                pages_fetched: 0,
                stop_reason: StopReason::QueryUnresolved,
                persisted_to: None,
                persist_error: None,
            };
        }

        tracing::info!(
            make = query.make(),
            model = query.model(),
            zip = query.zip_code(),
            max_pages = query.max_pages(),
            "starting aggregation"
        );

        let mut state = AggregationState::new();
        let summary = paginate(
            &self.source,
            query,
            self.delay,
            &mut state,
            self.observer.as_ref(),
        )
        .await;

        let raw_count = state.len();
        let listings = state.into_deduplicated();
        if raw_count != listings.len() {
            tracing::debug!(
                raw = raw_count,
                unique = listings.len(),
                "dropped duplicate listings"
            );
        }

        self.observer.on_event(&ProgressEvent::Finished {
            reason: summary.stop_reason,
            pages_fetched: summary.pages_fetched,
            listings: listings.len(),
        });

        let (persisted_to, persist_error) = match &self.sink {
            Some(sink) => match sink.persist(&listings).await {
                Ok(()) => (Some(sink.destination()), None),
                Err(e) => {
                    tracing::error!(destination = %sink.destination(), error = %e, "failed to save listings");
                    (None, Some(e.to_string()))
                }
            },
            None => (None, None),
        };

        AggregationOutcome {
            listings,
            pages_fetched: summary.pages_fetched,
            stop_reason: summary.stop_reason,
            persisted_to,
            persist_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::sync::atomic::{AtomicU32, Ordering};

    use serde_json::json;

    use super::*;
    use crate::events::RecordingObserver;
    use crate::types::FetchedPage;

    /// Pages keyed by index; anything past the list is an empty page.
    struct PagedVins {
        pages: Vec<Vec<&'static str>>,
        calls: AtomicU32,
    }

    impl PagedVins {
        fn new(pages: Vec<Vec<&'static str>>) -> Self {
            Self {
                pages,
                calls: AtomicU32::new(0),
            }
        }
    }

    impl PageSource for PagedVins {
        fn fetch_page(
            &self,
            _query: &SearchQuery,
            page: u32,
        ) -> impl Future<Output = FetchedPage> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let vins = self
                .pages
                .get(usize::try_from(page - 1).unwrap())
                .cloned()
                .unwrap_or_default();
            let result = FetchedPage {
                listings: vins
                    .into_iter()
                    .map(|vin| Listing {
                        vin: vin.to_owned(),
                        ..Listing::default()
                    })
                    .collect(),
                payload: Some(json!({ "listings": [] })),
            };
            async move { result }
        }
    }

    fn vins(listings: &[Listing]) -> Vec<&str> {
        listings.iter().map(|l| l.vin.as_str()).collect()
    }

    #[tokio::test]
    async fn aggregates_dedupes_across_pages() {
        let source = PagedVins::new(vec![vec!["V1", "V2"], vec!["V2", "V3"]]);
        let query = SearchQuery::new("honda", "civic", "85281", 50, 2, 5).unwrap();
        let session = AggregationSession::new(source, Duration::ZERO);

        let outcome = session.run(&query).await;

        assert_eq!(vins(&outcome.listings), vec!["V1", "V2", "V3"]);
        assert_eq!(outcome.pages_fetched, 3);
        assert_eq!(outcome.stop_reason, StopReason::EmptyPage);
        assert_eq!(session.source().calls.load(Ordering::SeqCst), 3);
        assert!(outcome.persisted_to.is_none());
    }

    #[tokio::test]
    async fn unresolvable_query_issues_no_requests() {
        let source = PagedVins::new(vec![vec!["V1"]]);
        let query = SearchQuery::new("honda", "  ", "85281", 50, 24, 5).unwrap();
        let observer = Arc::new(RecordingObserver::new());
        let session =
            AggregationSession::new(source, Duration::ZERO).with_observer(observer.clone());

        let outcome = session.run(&query).await;

        assert!(outcome.listings.is_empty());
        assert_eq!(outcome.stop_reason, StopReason::QueryUnresolved);
        assert_eq!(session.source().calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            observer.events(),
            vec![ProgressEvent::Finished {
                reason: StopReason::QueryUnresolved,
                pages_fetched: 0,
                listings: 0
            }]
        );
    }

    #[tokio::test]
    async fn each_run_starts_from_fresh_state() {
        let source = PagedVins::new(vec![vec!["V1", "V2"]]);
        let query = SearchQuery::new("honda", "civic", "85281", 50, 24, 1).unwrap();
        let session = AggregationSession::new(source, Duration::ZERO);

        let first = session.run(&query).await;
        let second = session.run(&query).await;

        assert_eq!(vins(&first.listings), vins(&second.listings));
        assert_eq!(second.stop_reason, StopReason::MaxPages);
    }

    #[tokio::test]
    async fn persists_through_sink_and_reports_destination() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        let source = PagedVins::new(vec![vec!["V1", "V1", "V2"]]);
        let query = SearchQuery::new("honda", "civic", "85281", 50, 24, 1).unwrap();
        let session =
            AggregationSession::new(source, Duration::ZERO).with_sink(JsonFileSink::new(&path));

        let outcome = session.run(&query).await;

        assert_eq!(outcome.persisted_to, Some(path.display().to_string()));
        let saved: Vec<Listing> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(vins(&saved), vec!["V1", "V2"]);
    }

    #[tokio::test]
    async fn persist_failure_keeps_listings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("results.json");
        let source = PagedVins::new(vec![vec!["V1"]]);
        let query = SearchQuery::new("honda", "civic", "85281", 50, 24, 1).unwrap();
        let session =
            AggregationSession::new(source, Duration::ZERO).with_sink(JsonFileSink::new(path));

        let outcome = session.run(&query).await;

        assert_eq!(vins(&outcome.listings), vec!["V1"]);
        assert!(outcome.persisted_to.is_none());
        assert!(outcome.persist_error.is_some());
    }
}
