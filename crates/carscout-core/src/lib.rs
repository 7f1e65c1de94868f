pub mod app_config;
pub mod config;
pub mod listing;
pub mod query;
pub mod search_config;

use thiserror::Error;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use listing::{AccidentHistory, Dealer, Listing, MonthlyPayment, ServiceHistory};
pub use query::{QueryError, SearchQuery};
pub use search_config::{
    load_search_config, try_load_search_config, LocationConfig, OutputConfig, ScrapingConfig,
    SearchConfig, SearchSection,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read search config {path}: {source}")]
    SearchConfigIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse search config: {0}")]
    SearchConfigParse(#[from] serde_yaml::Error),

    #[error("search config validation failed: {0}")]
    Validation(String),
}
