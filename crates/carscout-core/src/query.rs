use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fixed token the upstream search expects after the `{make}-{model}` slug.
const URL_INFO_SUFFIX: &str = "_w10920";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("page size must be greater than zero")]
    ZeroPageSize,

    #[error("max pages must be at least 1")]
    ZeroMaxPages,
}

/// One vehicle search: the two category filters, a geographic anchor, and
/// paging bounds. Built once per run and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    make: String,
    model: String,
    zip_code: String,
    radius_miles: u32,
    page_size: u32,
    max_pages: u32,
}

impl SearchQuery {
    /// # Errors
    ///
    /// Returns [`QueryError`] when `page_size` or `max_pages` is zero.
    pub fn new(
        make: impl Into<String>,
        model: impl Into<String>,
        zip_code: impl Into<String>,
        radius_miles: u32,
        page_size: u32,
        max_pages: u32,
    ) -> Result<Self, QueryError> {
        if page_size == 0 {
            return Err(QueryError::ZeroPageSize);
        }
        if max_pages == 0 {
            return Err(QueryError::ZeroMaxPages);
        }
        Ok(Self {
            make: make.into().trim().to_owned(),
            model: model.into().trim().to_owned(),
            zip_code: zip_code.into(),
            radius_miles,
            page_size,
            max_pages,
        })
    }

    #[must_use]
    pub fn make(&self) -> &str {
        &self.make
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub fn zip_code(&self) -> &str {
        &self.zip_code
    }

    #[must_use]
    pub fn radius_miles(&self) -> u32 {
        self.radius_miles
    }

    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    #[must_use]
    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    /// A query can only be sent upstream when both filters are non-empty.
    #[must_use]
    pub fn is_resolvable(&self) -> bool {
        !self.make.is_empty() && !self.model.is_empty()
    }

    /// The `urlInfo` slug, e.g. `"honda-civic_w10920"`.
    #[must_use]
    pub fn url_slug(&self) -> String {
        format!("{}-{}{URL_INFO_SUFFIX}", self.make, self.model)
    }

    /// Pages needed to cover `total_results` at this query's page size.
    #[must_use]
    pub fn pages_for(&self, total_results: u64) -> u64 {
        total_results.div_ceil(u64::from(self.page_size))
    }
}
