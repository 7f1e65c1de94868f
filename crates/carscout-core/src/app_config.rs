use std::net::SocketAddr;
use std::path::PathBuf;

/// Process-level settings read from `CARSCOUT_*` environment variables.
///
/// The search itself (make, model, location, paging) lives in the
/// [`crate::SearchConfig`] document pointed at by `config_path`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub config_path: PathBuf,
    pub log_level: String,
    pub bind_addr: SocketAddr,
    pub user_agent: String,
    /// Vehicle search endpoint. Overridable so tests and staging can point
    /// the client at a local mock.
    pub api_base_url: String,
    pub retry_backoff_base_secs: u64,
}
