//! VIN-based deduplication and the per-session accumulator.

use std::collections::HashSet;

use carscout_core::Listing;

/// Keeps the first listing for each VIN, in original order, and drops
/// listings with an empty VIN.
#[must_use]
pub fn dedupe_by_vin<I>(listings: I) -> Vec<Listing>
where
    I: IntoIterator<Item = Listing>,
{
    let mut seen: HashSet<String> = HashSet::new();
    listings
        .into_iter()
        .filter(|listing| !listing.vin.is_empty() && seen.insert(listing.vin.clone()))
        .collect()
}

/// Listings gathered across pages for one session, in page order then
/// listing order.
#[derive(Debug, Default)]
pub struct AggregationState {
    listings: Vec<Listing>,
    seen_vins: HashSet<String>,
}

impl AggregationState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one page of listings and returns how many carried a VIN not
    /// seen on an earlier page (or earlier on this one).
    pub fn append(&mut self, page: Vec<Listing>) -> usize {
        let mut new_unique = 0;
        for listing in &page {
            if !listing.vin.is_empty() && self.seen_vins.insert(listing.vin.clone()) {
                new_unique += 1;
            }
        }
        self.listings.extend(page);
        new_unique
    }

    /// Number of listings appended, duplicates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    #[must_use]
    pub fn unique_count(&self) -> usize {
        self.seen_vins.len()
    }

    /// Consumes the state, returning one listing per VIN (first occurrence).
    #[must_use]
    pub fn into_deduplicated(self) -> Vec<Listing> {
        dedupe_by_vin(self.listings)
    }
}
