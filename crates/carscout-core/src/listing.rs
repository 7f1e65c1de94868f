use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A vehicle listing normalized from one upstream search record.
///
/// Scalar fields are display text: missing upstream values become `""`,
/// never `null`. `price`, `list_price` and `mileage` are already formatted
/// (`"$25,000"`, `"45,000 miles"`). Every field defaults when absent, so
/// results files from older runs still load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Listing {
    /// Vehicle identification number; the deduplication key.
    pub vin: String,
    pub year: String,
    pub make: String,
    pub model: String,
    pub trim: String,
    pub sub_trim: String,
    pub price: String,
    pub list_price: String,
    pub mileage: String,
    /// `"City, ST"` of the selling dealer.
    pub location: String,
    pub dealer: Dealer,
    pub exterior_color: String,
    pub interior_color: String,
    pub engine: String,
    pub displacement: String,
    pub transmission: String,
    pub drivetrain: String,
    pub fuel_type: String,
    pub mpg_city: String,
    pub mpg_highway: String,
    pub body_style: String,
    pub vehicle_condition: String,
    pub stock_number: String,
    /// Detail page on the listing site; input to report-link enrichment.
    pub listing_url: String,
    pub image_url: String,
    pub image_count: String,
    pub top_options: Vec<String>,
    pub no_accidents: String,
    pub service_records: String,
    pub first_seen: String,
    pub distance_to_dealer: String,
    pub record_type: String,
    pub advantage: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub monthly_payment: Option<MonthlyPayment>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub accident_history: Option<AccidentHistory>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub service_history: Option<ServiceHistory>,
    /// When this record was normalized, not when its page was fetched.
    pub scraped_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dealer {
    pub name: String,
    /// `"street, city, ST zip"`, built from whichever parts are present.
    pub address: String,
    pub phone: String,
    pub rating: String,
    pub review_count: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonthlyPayment {
    pub amount: String,
    pub down_payment: String,
    pub loan_amount: String,
    pub interest_rate: String,
    pub term_months: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccidentHistory {
    pub text: String,
    /// Upstream accident entries, passed through untouched.
    pub summary: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceHistory {
    pub text: String,
    pub count: String,
    pub history: Vec<serde_json::Value>,
}

impl Listing {
    /// Short human-readable line used in CLI summaries.
    #[must_use]
    pub fn summary_line(&self) -> String {
        let title = [
            self.year.as_str(),
            self.make.as_str(),
            self.model.as_str(),
            self.trim.as_str(),
        ]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        let distance = if self.distance_to_dealer.is_empty() {
            "N/A"
        } else {
            self.distance_to_dealer.as_str()
        };

        format!(
            "{title} - {} - {} - {} ({distance} miles)",
            self.price, self.mileage, self.location
        )
    }
}
