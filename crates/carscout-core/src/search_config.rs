//! The search configuration document: what to search for, where, how to
//! page, and where to write results.
//!
//! The file is read with `serde_yaml`, so both `config.yaml` and the JSON
//! form (`config.json`) load. Any group or field left out takes its default.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::query::{QueryError, SearchQuery};
use crate::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub search_config: SearchSection,
    pub location_config: LocationConfig,
    pub output_config: OutputConfig,
    pub scraping_config: ScrapingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSection {
    pub make: String,
    pub model: String,
    pub max_pages: u32,
    pub rows_per_page: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub zip_code: String,
    pub city: String,
    pub state: String,
    pub radius_miles: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub save_to_json: bool,
    /// Single output file, replaced on every run.
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapingConfig {
    /// Pause between page requests, in seconds.
    pub delay_between_requests: f64,
    pub timeout_seconds: u64,
    /// Additional attempts per page after a transient failure.
    pub max_retries: u32,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            make: "Honda".to_owned(),
            model: "Civic".to_owned(),
            max_pages: 10,
            rows_per_page: 24,
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            zip_code: "85281".to_owned(),
            city: "Tempe".to_owned(),
            state: "AZ".to_owned(),
            radius_miles: 50,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            save_to_json: true,
            filename: "carfax_search_results.json".to_owned(),
        }
    }
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            delay_between_requests: 2.0,
            timeout_seconds: 10,
            max_retries: 3,
        }
    }
}

/// Longest accepted pause between page requests, in seconds.
pub const MAX_DELAY_SECS: f64 = 3600.0;

impl ScrapingConfig {
    /// The inter-request pause, clamped to `0..=MAX_DELAY_SECS`. A value that
    /// is not a number yields no pause.
    #[must_use]
    pub fn delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.delay_between_requests.clamp(0.0, MAX_DELAY_SECS))
            .unwrap_or_default()
    }
}

impl SearchConfig {
    /// Builds the [`SearchQuery`] this document describes.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] if the paging bounds are zero.
    pub fn to_query(&self) -> Result<SearchQuery, QueryError> {
        SearchQuery::new(
            self.search_config.make.clone(),
            self.search_config.model.clone(),
            self.location_config.zip_code.clone(),
            self.location_config.radius_miles,
            self.search_config.rows_per_page,
            self.search_config.max_pages,
        )
    }
}

/// Load the search configuration, falling back to [`SearchConfig::default`]
/// when the file is missing, unreadable, malformed, or invalid.
#[must_use]
pub fn load_search_config(path: &Path) -> SearchConfig {
    if !path.exists() {
        tracing::warn!(
            path = %path.display(),
            "search config not found; using default configuration"
        );
        return SearchConfig::default();
    }

    match try_load_search_config(path) {
        Ok(config) => {
            tracing::info!(path = %path.display(), "search config loaded");
            config
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "could not load search config; using default configuration"
            );
            SearchConfig::default()
        }
    }
}

/// Load and validate the search configuration without any fallback.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn try_load_search_config(path: &Path) -> Result<SearchConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SearchConfigIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let config: SearchConfig = serde_yaml::from_str(&content)?;
    validate_search_config(&config)?;
    Ok(config)
}

fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    if config.search_config.rows_per_page == 0 {
        return Err(ConfigError::Validation(
            "search_config.rows_per_page must be greater than zero".to_string(),
        ));
    }

    if config.search_config.max_pages == 0 {
        return Err(ConfigError::Validation(
            "search_config.max_pages must be at least 1".to_string(),
        ));
    }

    let delay = config.scraping_config.delay_between_requests;
    if !delay.is_finite() || delay < 0.0 {
        return Err(ConfigError::Validation(format!(
            "scraping_config.delay_between_requests must be a non-negative number, got {delay}"
        )));
    }
    if delay > MAX_DELAY_SECS {
        return Err(ConfigError::Validation(format!(
            "scraping_config.delay_between_requests must be at most {MAX_DELAY_SECS} seconds, got {delay}"
        )));
    }

    if config.output_config.save_to_json && config.output_config.filename.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output_config.filename must be set when save_to_json is enabled".to_string(),
        ));
    }

    Ok(())
}
