//! `POST /api/search`: one aggregation session per request.

use axum::{body::Bytes, extract::State, Extension, Json};
use carscout_core::{Listing, SearchConfig, SearchQuery};
use carscout_scraper::{AggregationSession, ListingClient};
use serde::{Deserialize, Serialize};

use super::{ApiError, AppState};
use crate::middleware::RequestId;

const DEFAULT_MAKE: &str = "toyota";
const DEFAULT_MODEL: &str = "camry";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct SearchRequest {
    make: Option<String>,
    model: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SearchResponse {
    success: bool,
    car_count: usize,
    results: Vec<Listing>,
}

impl SearchRequest {
    /// Parses a request body; an empty body means "use the defaults".
    pub(super) fn from_body(body: &[u8]) -> Result<Self, serde_json::Error> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
    }

    /// Lower-cased make and model, defaulting blank or missing values.
    pub(super) fn filters(&self) -> (String, String) {
        let pick = |value: Option<&String>, default: &str| {
            value
                .map(|v| v.trim().to_lowercase())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_owned())
        };
        (
            pick(self.make.as_ref(), DEFAULT_MAKE),
            pick(self.model.as_ref(), DEFAULT_MODEL),
        )
    }

    /// Query for this request, taking location and paging from `config`.
    pub(super) fn to_query(&self, config: &SearchConfig) -> Result<SearchQuery, ApiError> {
        let (make, model) = self.filters();
        SearchQuery::new(
            make,
            model,
            config.location_config.zip_code.clone(),
            config.location_config.radius_miles,
            config.search_config.rows_per_page,
            config.search_config.max_pages,
        )
        .map_err(|e| ApiError::internal(format!("invalid search configuration: {e}")))
    }
}

pub(super) async fn search(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Bytes,
) -> Result<Json<SearchResponse>, ApiError> {
    let request = SearchRequest::from_body(&body).map_err(|e| {
        tracing::warn!(request_id = %req_id.0, error = %e, "rejecting malformed search body");
        ApiError::bad_request(format!("invalid JSON body: {e}"))
    })?;
    let query = request.to_query(&state.search)?;

    let client = ListingClient::from_config(&state.config, &state.search.scraping_config)
        .map_err(|e| {
            tracing::error!(request_id = %req_id.0, error = %e, "failed to build listing client");
            ApiError::internal(e.to_string())
        })?;

    tracing::info!(
        request_id = %req_id.0,
        make = query.make(),
        model = query.model(),
        "search requested"
    );
    let outcome = AggregationSession::new(client, state.search.scraping_config.delay())
        .run(&query)
        .await;

    Ok(Json(SearchResponse {
        success: true,
        car_count: outcome.listings.len(),
        results: outcome.listings,
    }))
}
