//! Output sinks for the deduplicated listing set.

use std::future::Future;
use std::path::{Path, PathBuf};

use carscout_core::Listing;

use crate::error::ScraperError;

pub trait ListingSink {
    /// Writes the full result set, replacing whatever the sink held before.
    fn persist(&self, listings: &[Listing]) -> impl Future<Output = Result<(), ScraperError>> + Send;

    /// Human-readable location, for logs and session outcomes.
    fn destination(&self) -> String;
}

/// Writes listings as a pretty-printed JSON array.
///
/// The document is written to a sibling `*.tmp` file first and then renamed
/// over the target, so readers never see a half-written file.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn persist_error(&self, source: std::io::Error) -> ScraperError {
        ScraperError::Persist {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl ListingSink for JsonFileSink {
    async fn persist(&self, listings: &[Listing]) -> Result<(), ScraperError> {
        let body = serde_json::to_vec_pretty(listings)?;
        let temp = self.temp_path();

        tokio::fs::write(&temp, &body)
            .await
            .map_err(|e| self.persist_error(e))?;
        if let Err(e) = tokio::fs::rename(&temp, &self.path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(self.persist_error(e));
        }

        tracing::info!(path = %self.path.display(), count = listings.len(), "listings saved");
        Ok(())
    }

    fn destination(&self) -> String {
        self.path.display().to_string()
    }
}
