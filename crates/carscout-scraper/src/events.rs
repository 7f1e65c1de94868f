//! Progress events emitted while an aggregation session runs.
//!
//! Embedders subscribe by passing a [`ProgressObserver`]; the default
//! [`TracingObserver`] turns events into log lines.

use std::sync::Mutex;

use serde::Serialize;

/// Why pagination stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// One of the category filters was blank; nothing was requested.
    QueryUnresolved,
    /// A page decoded fine but held no usable listings.
    EmptyPage,
    /// A page could not be fetched or decoded after all retries.
    FetchFailed,
    /// The upstream total-count facet says this was the last page.
    TotalReached,
    /// The configured page cap was hit.
    MaxPages,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    PageFetched {
        page: u32,
        listings: usize,
        /// Listings on this page whose VIN had not been seen before.
        new_unique: usize,
    },
    TotalDiscovered {
        total_results: u64,
        total_pages: u64,
    },
    Finished {
        reason: StopReason,
        pages_fetched: u32,
        listings: usize,
    },
}

pub trait ProgressObserver: Send + Sync {
    fn on_event(&self, event: &ProgressEvent);
}

/// Logs each event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ProgressObserver for TracingObserver {
    fn on_event(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::PageFetched {
                page,
                listings,
                new_unique,
            } => tracing::info!(page, listings, new_unique, "page aggregated"),
            ProgressEvent::TotalDiscovered {
                total_results,
                total_pages,
            } => tracing::info!(total_results, total_pages, "upstream total discovered"),
            ProgressEvent::Finished {
                reason,
                pages_fetched,
                listings,
            } => tracing::info!(?reason, pages_fetched, listings, "aggregation finished"),
        }
    }
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingObserver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events seen so far.
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl ProgressObserver for RecordingObserver {
    fn on_event(&self, event: &ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
