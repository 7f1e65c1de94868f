#![recursion_limit = "256"]

pub mod client;
pub mod decode;
pub mod dedup;
pub mod error;
pub mod events;
pub mod format;
pub mod normalize;
pub mod pagination;
pub mod persist;
mod rate_limit;
pub mod report;
pub mod session;
pub mod types;

pub use client::ListingClient;
pub use decode::decode_body;
pub use dedup::{dedupe_by_vin, AggregationState};
pub use error::{DecodeError, ScraperError};
pub use events::{ProgressEvent, ProgressObserver, RecordingObserver, StopReason, TracingObserver};
pub use normalize::{normalize_listing, normalize_page};
pub use pagination::{paginate, PageSource, PaginationSummary};
pub use persist::{JsonFileSink, ListingSink};
pub use report::{extract_report_link, ReportLink, ReportLinkScraper};
pub use session::{AggregationOutcome, AggregationSession};
pub use types::{FetchedPage, RawPage};
