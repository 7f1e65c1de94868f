//! Page-level shapes exchanged between the fetcher and the paginator.
//!
//! ## Observed upstream document shape
//!
//! ```text
//! {
//!   "listings": [ { "vin": "...", "currentPrice": 21500, "dealer": {..}, .. }, .. ],
//!   "facets": {
//!     "vehicleCondition": { "facets": [ { "name": "Used", "value": 30 }, .. ] },
//!     ..
//!   }
//! }
//! ```
//!
//! Listing objects vary widely in which keys they carry, so they are kept as
//! raw JSON until [`crate::normalize`] maps them. `facets` is absent on some
//! pages; when present, the `"Used"` entry carries the total result count.

use carscout_core::Listing;
use serde_json::{Map, Value};

/// Name of the facet entry that counts used-vehicle inventory.
const USED_INVENTORY_FACET: &str = "Used";

/// Borrowed view over one decoded search page.
#[derive(Debug, Clone, Copy)]
pub struct RawPage<'a> {
    pub listings: &'a [Value],
    pub facets: Option<&'a Map<String, Value>>,
}

impl<'a> RawPage<'a> {
    /// Reads `listings` and `facets` from a decoded document. Anything other
    /// than an object yields an empty page.
    #[must_use]
    pub fn from_document(document: &'a Value) -> Self {
        let listings = document
            .get("listings")
            .and_then(Value::as_array)
            .map_or(&[][..], Vec::as_slice);
        let facets = document.get("facets").and_then(Value::as_object);
        Self { listings, facets }
    }

    /// Total used-inventory count from the facet groups, if any group
    /// reports a positive one.
    #[must_use]
    pub fn total_results(&self) -> Option<u64> {
        self.facets?
            .values()
            .filter_map(|group| group.get("facets").and_then(Value::as_array))
            .flatten()
            .find(|facet| {
                facet.get("name").and_then(Value::as_str) == Some(USED_INVENTORY_FACET)
            })
            .and_then(|facet| facet.get("value"))
            .and_then(facet_count)
            .filter(|&total| total > 0)
    }
}

fn facet_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Result of fetching one page: the normalized listings plus the decoded
/// document, kept for total-count probing.
///
/// A failed fetch is `listings: []` with `payload: None`.
#[derive(Debug, Clone, Default)]
pub struct FetchedPage {
    pub listings: Vec<Listing>,
    pub payload: Option<Value>,
}

impl FetchedPage {
    #[must_use]
    pub fn failed() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.payload.is_none()
    }

    #[must_use]
    pub fn total_results(&self) -> Option<u64> {
        self.payload
            .as_ref()
            .and_then(|payload| RawPage::from_document(payload).total_results())
    }
}
