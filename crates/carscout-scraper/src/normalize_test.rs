use chrono::TimeZone;
use serde_json::json;

use super::*;

fn captured() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap()
}

fn full_listing_json() -> Value {
    json!({
        "vin": "1HGCV1F30LA000001",
        "year": 2020,
        "make": "Honda",
        "model": "Civic",
        "trim": "EX",
        "subTrim": "Sedan",
        "currentPrice": 21500,
        "listPrice": "22900",
        "mileage": 30100,
        "dealer": {
            "name": "Tempe Honda",
            "address": "8060 S Autoplex Loop",
            "city": "Tempe",
            "state": "AZ",
            "zip": "85284",
            "phone": "(480) 555-0100",
            "dealerAverageRating": 4.6,
            "dealerReviewCount": 812
        },
        "exteriorColor": "Blue",
        "interiorColor": "Black",
        "engine": "4 Cyl",
        "displacement": "1.5 L",
        "transmission": "Automatic",
        "drivetype": "FWD",
        "fuel": "Gasoline",
        "mpgCity": 32,
        "mpgHighway": 42,
        "bodytype": "Sedan",
        "vehicleCondition": "Used",
        "stockNumber": "H12345",
        "vdpUrl": "https://www.carfax.com/vehicle/1HGCV1F30LA000001",
        "images": {
            "firstPhoto": {"medium": "https://img.example.com/m.jpg", "large": "https://img.example.com/l.jpg"},
            "baseUrl": "https://img.example.com/base/"
        },
        "imageCount": 24,
        "topOptions": ["Sunroof", "Heated Seats", null],
        "noAccidents": true,
        "serviceRecords": 7,
        "firstSeen": "2025-02-01",
        "distanceToDealer": 3.2,
        "recordType": "DEALER",
        "advantage": false,
        "monthlyPaymentEstimate": {
            "monthlyPayment": 389,
            "downPaymentAmount": 2150,
            "loanAmount": 19350,
            "interestRate": 7.9,
            "termInMonths": 60
        },
        "accidentHistory": {
            "text": "No Accidents or Damage Reported",
            "accidentSummary": []
        },
        "serviceHistory": {
            "text": "7 Service History Records",
            "number": 7,
            "history": [{"date": "2023-05-01", "description": "Oil change"}]
        }
    })
}

// -----------------------------------------------------------------------
// normalize_listing
// -----------------------------------------------------------------------

#[test]
fn normalize_listing_maps_core_fields() {
    let listing = normalize_listing_at(&full_listing_json(), captured()).unwrap();
    assert_eq!(listing.vin, "1HGCV1F30LA000001");
    assert_eq!(listing.year, "2020");
    assert_eq!(listing.make, "Honda");
    assert_eq!(listing.model, "Civic");
    assert_eq!(listing.trim, "EX");
    assert_eq!(listing.sub_trim, "Sedan");
    assert_eq!(listing.drivetrain, "FWD");
    assert_eq!(listing.fuel_type, "Gasoline");
    assert_eq!(listing.body_style, "Sedan");
    assert_eq!(listing.mpg_city, "32");
    assert_eq!(listing.no_accidents, "true");
    assert_eq!(listing.advantage, "false");
    assert_eq!(listing.scraped_at, captured());
}

#[test]
fn normalize_listing_formats_prices_and_mileage() {
    let listing = normalize_listing_at(&full_listing_json(), captured()).unwrap();
    assert_eq!(listing.price, "$21,500");
    assert_eq!(listing.list_price, "$22900");
    assert_eq!(listing.mileage, "30,100 miles");
}

#[test]
fn normalize_listing_builds_dealer_record() {
    let listing = normalize_listing_at(&full_listing_json(), captured()).unwrap();
    assert_eq!(listing.dealer.name, "Tempe Honda");
    assert_eq!(listing.dealer.phone, "(480) 555-0100");
    assert_eq!(listing.dealer.rating, "4.6");
    assert_eq!(listing.dealer.review_count, "812");
    assert_eq!(listing.location, "Tempe, AZ");
    assert_eq!(
        listing.dealer.address,
        "8060 S Autoplex Loop, Tempe, AZ 85284"
    );
}

#[test]
fn normalize_listing_without_dealer_leaves_location_empty() {
    let listing = normalize_listing_at(&json!({"vin": "V1"}), captured()).unwrap();
    assert_eq!(listing.location, "");
    assert_eq!(listing.dealer.address, "");
}

#[test]
fn normalize_listing_drops_records_without_vin() {
    assert!(normalize_listing_at(&json!({"make": "Honda"}), captured()).is_none());
    assert!(normalize_listing_at(&json!({"vin": ""}), captured()).is_none());
    assert!(normalize_listing_at(&json!({"vin": null}), captured()).is_none());
    assert!(normalize_listing_at(&json!({"vin": "   "}), captured()).is_none());
}

#[test]
fn normalize_listing_rejects_non_objects() {
    assert!(normalize_listing_at(&json!("1HGCV1F30LA000001"), captured()).is_none());
    assert!(normalize_listing_at(&Value::Null, captured()).is_none());
}

#[test]
fn normalize_listing_defaults_missing_and_null_fields_to_empty() {
    let raw = json!({"vin": "V1", "trim": null, "currentPrice": null});
    let listing = normalize_listing_at(&raw, captured()).unwrap();
    assert_eq!(listing.trim, "");
    assert_eq!(listing.price, "");
    assert_eq!(listing.mileage, "");
    assert_eq!(listing.engine, "");
    assert_eq!(listing.image_url, "");
    assert!(listing.top_options.is_empty());
}

#[test]
fn normalize_listing_keeps_only_text_top_options() {
    let listing = normalize_listing_at(&full_listing_json(), captured()).unwrap();
    assert_eq!(listing.top_options, vec!["Sunroof", "Heated Seats"]);
}

// -----------------------------------------------------------------------
// conditional sub-records
// -----------------------------------------------------------------------

#[test]
fn normalize_listing_includes_present_sub_records() {
    let listing = normalize_listing_at(&full_listing_json(), captured()).unwrap();

    let payment = listing.monthly_payment.expect("monthly payment present");
    assert_eq!(payment.amount, "389");
    assert_eq!(payment.down_payment, "2150");
    assert_eq!(payment.interest_rate, "7.9");
    assert_eq!(payment.term_months, "60");

    let accidents = listing.accident_history.expect("accident history present");
    assert_eq!(accidents.text, "No Accidents or Damage Reported");
    assert!(accidents.summary.is_empty());

    let service = listing.service_history.expect("service history present");
    assert_eq!(service.count, "7");
    assert_eq!(service.history.len(), 1);
}

#[test]
fn normalize_listing_omits_absent_sub_records() {
    let listing = normalize_listing_at(&json!({"vin": "V1"}), captured()).unwrap();
    assert!(listing.monthly_payment.is_none());
    assert!(listing.accident_history.is_none());
    assert!(listing.service_history.is_none());
}

#[test]
fn normalize_listing_omits_empty_or_null_sub_records() {
    let raw = json!({
        "vin": "V1",
        "monthlyPaymentEstimate": {},
        "accidentHistory": null,
        "serviceHistory": "n/a"
    });
    let listing = normalize_listing_at(&raw, captured()).unwrap();
    assert!(listing.monthly_payment.is_none());
    assert!(listing.accident_history.is_none());
    assert!(listing.service_history.is_none());
}

// -----------------------------------------------------------------------
// image selection
// -----------------------------------------------------------------------

#[test]
fn image_prefers_medium_first_photo() {
    let listing = normalize_listing_at(&full_listing_json(), captured()).unwrap();
    assert_eq!(listing.image_url, "https://img.example.com/m.jpg");
}

#[test]
fn image_falls_back_to_large_first_photo() {
    let raw = json!({"vin": "V1", "images": {"firstPhoto": {"large": "https://img.example.com/l.jpg"}}});
    let listing = normalize_listing_at(&raw, captured()).unwrap();
    assert_eq!(listing.image_url, "https://img.example.com/l.jpg");
}

#[test]
fn image_falls_back_to_sized_base_url() {
    let raw = json!({"vin": "V1", "images": {"baseUrl": "https://img.example.com/base/"}});
    let listing = normalize_listing_at(&raw, captured()).unwrap();
    assert_eq!(listing.image_url, "https://img.example.com/base/1/344x258");
}

#[test]
fn image_is_empty_when_nothing_usable() {
    let raw = json!({"vin": "V1", "images": {"firstPhoto": {}}});
    assert_eq!(normalize_listing_at(&raw, captured()).unwrap().image_url, "");

    let raw = json!({"vin": "V1", "images": ["https://img.example.com/a.jpg"]});
    assert_eq!(normalize_listing_at(&raw, captured()).unwrap().image_url, "");
}

// -----------------------------------------------------------------------
// normalize_page
// -----------------------------------------------------------------------

#[test]
fn normalize_page_preserves_order_and_filters_unusable_entries() {
    let doc = json!({
        "listings": [
            {"vin": "V1"},
            {"make": "Honda"},
            "garbage",
            {"vin": "V2"}
        ]
    });
    let listings = normalize_page(&RawPage::from_document(&doc));
    let vins: Vec<_> = listings.iter().map(|l| l.vin.as_str()).collect();
    assert_eq!(vins, vec!["V1", "V2"]);
}
