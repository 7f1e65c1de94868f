//! Normalization from raw upstream listing objects to [`Listing`].
//!
//! Field mapping is table-driven: each [`FieldRule`] names a source key path,
//! the target field, and the formatter applied to it. Every rule defaults to
//! `""` when its source is missing or `null`.

use carscout_core::{AccidentHistory, Listing, MonthlyPayment, ServiceHistory};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::format::{format_mileage, format_price, value_to_text};
use crate::types::RawPage;

/// Size suffix appended to an image base URL when no sized photo is given.
const IMAGE_FALLBACK_SUFFIX: &str = "1/344x258";

#[derive(Debug, Clone, Copy)]
enum FieldFormat {
    Text,
    Price,
    Mileage,
}

impl FieldFormat {
    fn render(self, value: Option<&Value>) -> String {
        match self {
            Self::Text => value_to_text(value),
            Self::Price => format_price(value),
            Self::Mileage => format_mileage(value),
        }
    }
}

struct FieldRule<T> {
    path: &'static [&'static str],
    format: FieldFormat,
    slot: fn(&mut T) -> &mut String,
}

impl<T> FieldRule<T> {
    const fn text(path: &'static [&'static str], slot: fn(&mut T) -> &mut String) -> Self {
        Self {
            path,
            format: FieldFormat::Text,
            slot,
        }
    }

    const fn price(path: &'static [&'static str], slot: fn(&mut T) -> &mut String) -> Self {
        Self {
            path,
            format: FieldFormat::Price,
            slot,
        }
    }

    const fn mileage(path: &'static [&'static str], slot: fn(&mut T) -> &mut String) -> Self {
        Self {
            path,
            format: FieldFormat::Mileage,
            slot,
        }
    }
}

type ListingRule = FieldRule<Listing>;
type PaymentRule = FieldRule<MonthlyPayment>;
type AccidentRule = FieldRule<AccidentHistory>;
type ServiceRule = FieldRule<ServiceHistory>;

const LISTING_FIELDS: &[ListingRule] = &[
    ListingRule::text(&["vin"], |l| &mut l.vin),
    ListingRule::text(&["year"], |l| &mut l.year),
    ListingRule::text(&["make"], |l| &mut l.make),
    ListingRule::text(&["model"], |l| &mut l.model),
    ListingRule::text(&["trim"], |l| &mut l.trim),
    ListingRule::text(&["subTrim"], |l| &mut l.sub_trim),
    ListingRule::price(&["currentPrice"], |l| &mut l.price),
    ListingRule::price(&["listPrice"], |l| &mut l.list_price),
    ListingRule::mileage(&["mileage"], |l| &mut l.mileage),
    ListingRule::text(&["dealer", "name"], |l| &mut l.dealer.name),
    ListingRule::text(&["dealer", "phone"], |l| &mut l.dealer.phone),
    ListingRule::text(&["dealer", "dealerAverageRating"], |l| &mut l.dealer.rating),
    ListingRule::text(&["dealer", "dealerReviewCount"], |l| &mut l.dealer.review_count),
    ListingRule::text(&["dealer", "city"], |l| &mut l.dealer.city),
    ListingRule::text(&["dealer", "state"], |l| &mut l.dealer.state),
    ListingRule::text(&["dealer", "zip"], |l| &mut l.dealer.zip),
    ListingRule::text(&["exteriorColor"], |l| &mut l.exterior_color),
    ListingRule::text(&["interiorColor"], |l| &mut l.interior_color),
    ListingRule::text(&["engine"], |l| &mut l.engine),
    ListingRule::text(&["displacement"], |l| &mut l.displacement),
    ListingRule::text(&["transmission"], |l| &mut l.transmission),
    ListingRule::text(&["drivetype"], |l| &mut l.drivetrain),
    ListingRule::text(&["fuel"], |l| &mut l.fuel_type),
    ListingRule::text(&["mpgCity"], |l| &mut l.mpg_city),
    ListingRule::text(&["mpgHighway"], |l| &mut l.mpg_highway),
    ListingRule::text(&["bodytype"], |l| &mut l.body_style),
    ListingRule::text(&["vehicleCondition"], |l| &mut l.vehicle_condition),
    ListingRule::text(&["stockNumber"], |l| &mut l.stock_number),
    ListingRule::text(&["vdpUrl"], |l| &mut l.listing_url),
    ListingRule::text(&["imageCount"], |l| &mut l.image_count),
    ListingRule::text(&["noAccidents"], |l| &mut l.no_accidents),
    ListingRule::text(&["serviceRecords"], |l| &mut l.service_records),
    ListingRule::text(&["firstSeen"], |l| &mut l.first_seen),
    ListingRule::text(&["distanceToDealer"], |l| &mut l.distance_to_dealer),
    ListingRule::text(&["recordType"], |l| &mut l.record_type),
    ListingRule::text(&["advantage"], |l| &mut l.advantage),
];

const MONTHLY_PAYMENT_FIELDS: &[PaymentRule] = &[
    PaymentRule::text(&["monthlyPayment"], |m| &mut m.amount),
    PaymentRule::text(&["downPaymentAmount"], |m| &mut m.down_payment),
    PaymentRule::text(&["loanAmount"], |m| &mut m.loan_amount),
    PaymentRule::text(&["interestRate"], |m| &mut m.interest_rate),
    PaymentRule::text(&["termInMonths"], |m| &mut m.term_months),
];

const ACCIDENT_HISTORY_FIELDS: &[AccidentRule] = &[
    AccidentRule::text(&["text"], |a| &mut a.text),
];

const SERVICE_HISTORY_FIELDS: &[ServiceRule] = &[
    ServiceRule::text(&["text"], |s| &mut s.text),
    ServiceRule::text(&["number"], |s| &mut s.count),
];

/// Normalizes one raw listing object, stamping `scraped_at` with the
/// current time.
///
/// Returns `None` when the object has no VIN; such records cannot be
/// deduplicated or followed up and are dropped.
#[must_use]
pub fn normalize_listing(raw: &Value) -> Option<Listing> {
    normalize_listing_at(raw, Utc::now())
}

/// Same as [`normalize_listing`] with an explicit capture time.
#[must_use]
pub fn normalize_listing_at(raw: &Value, scraped_at: DateTime<Utc>) -> Option<Listing> {
    let object = raw.as_object()?;

    let mut listing = Listing {
        scraped_at,
        ..Listing::default()
    };
    apply_rules(raw, LISTING_FIELDS, &mut listing);

    listing.vin = listing.vin.trim().to_owned();
    if listing.vin.is_empty() {
        return None;
    }

    listing.location = join_present(&[listing.dealer.city.as_str(), listing.dealer.state.as_str()], ", ");
    let state_zip = join_present(&[listing.dealer.state.as_str(), listing.dealer.zip.as_str()], " ");
    let street = value_to_text(lookup(raw, &["dealer", "address"]));
    listing.dealer.address = join_present(
        &[street.as_str(), listing.dealer.city.as_str(), state_zip.as_str()],
        ", ",
    );

    listing.image_url = select_image_url(object.get("images"));
    listing.top_options = text_list(object.get("topOptions"));

    listing.monthly_payment = present_object(object, "monthlyPaymentEstimate").map(|source| {
        let mut payment = MonthlyPayment::default();
        apply_rules(source, MONTHLY_PAYMENT_FIELDS, &mut payment);
        payment
    });

    listing.accident_history = present_object(object, "accidentHistory").map(|source| {
        let mut history = AccidentHistory {
            summary: value_list(source.get("accidentSummary")),
            ..AccidentHistory::default()
        };
        apply_rules(source, ACCIDENT_HISTORY_FIELDS, &mut history);
        history
    });

    listing.service_history = present_object(object, "serviceHistory").map(|source| {
        let mut history = ServiceHistory {
            history: value_list(source.get("history")),
            ..ServiceHistory::default()
        };
        apply_rules(source, SERVICE_HISTORY_FIELDS, &mut history);
        history
    });

    Some(listing)
}

/// Normalizes every listing on a decoded page, preserving upstream order and
/// skipping entries that are not objects or have no VIN.
#[must_use]
pub fn normalize_page(page: &RawPage<'_>) -> Vec<Listing> {
    let scraped_at = Utc::now();
    page.listings
        .iter()
        .filter_map(|raw| normalize_listing_at(raw, scraped_at))
        .collect()
}

fn apply_rules<T>(source: &Value, rules: &[FieldRule<T>], target: &mut T) {
    for rule in rules {
        *(rule.slot)(target) = rule.format.render(lookup(source, rule.path));
    }
}

fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| current.get(*key))
}

/// A nested sub-record counts as present only when it is a non-empty object.
fn present_object<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    object
        .get(key)
        .filter(|value| value.as_object().is_some_and(|o| !o.is_empty()))
}

/// Prefers the first photo's medium rendition, then large, then a sized URL
/// built from the gallery base URL.
fn select_image_url(images: Option<&Value>) -> String {
    let Some(images) = images.filter(|v| v.is_object()) else {
        return String::new();
    };

    let first_photo = images.get("firstPhoto");
    for size in ["medium", "large"] {
        let url = value_to_text(first_photo.and_then(|photo| photo.get(size)));
        if !url.is_empty() {
            return url;
        }
    }

    let base_url = value_to_text(images.get("baseUrl"));
    if base_url.is_empty() {
        String::new()
    } else {
        format!("{base_url}{IMAGE_FALLBACK_SUFFIX}")
    }
}

fn text_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| value_to_text(Some(item)))
                .filter(|text| !text.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn value_list(value: Option<&Value>) -> Vec<Value> {
    value
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn join_present(parts: &[&str], separator: &str) -> String {
    parts
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
