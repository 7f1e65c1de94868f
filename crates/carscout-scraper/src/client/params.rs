//! Query parameters for one upstream vehicle search request.

use carscout_core::SearchQuery;

/// Builds the full parameter list for `page` (1-based) of `query`.
///
/// Sort order, condition and the display knobs are fixed; only location,
/// filters and paging vary.
#[must_use]
pub fn search_params(query: &SearchQuery, page: u32) -> Vec<(&'static str, String)> {
    vec![
        ("zip", query.zip_code().to_owned()),
        ("radius", query.radius_miles().to_string()),
        ("sort", "BEST".to_owned()),
        ("certified", "false".to_owned()),
        ("vehicleCondition", "USED".to_owned()),
        ("rows", query.page_size().to_string()),
        ("mpgCombinedMin", "0".to_owned()),
        ("page", page.to_string()),
        ("dynamicRadius", "false".to_owned()),
        ("fetchImageLimit", "6".to_owned()),
        ("tpPositions", "1,2,3".to_owned()),
        ("make", query.make().to_owned()),
        ("model", query.model().to_owned()),
        ("urlInfo", query.url_slug()),
    ]
}
