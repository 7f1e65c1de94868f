use crate::app_config::AppConfig;
use crate::ConfigError;

pub const DEFAULT_API_BASE_URL: &str = "https://helix.carfax.com/search/v2/vehicles";

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Load process settings from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is present but cannot be parsed.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load process settings from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is present but cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build process settings using the provided env-var lookup function, so the
/// parsing rules can be tested against a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let bind_raw = or_default("CARSCOUT_BIND_ADDR", "0.0.0.0:3000");
    let bind_addr = bind_raw
        .parse::<SocketAddr>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: "CARSCOUT_BIND_ADDR".to_string(),
            reason: e.to_string(),
        })?;

    let backoff_raw = or_default("CARSCOUT_RETRY_BACKOFF_BASE_SECS", "1");
    let retry_backoff_base_secs =
        backoff_raw
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: "CARSCOUT_RETRY_BACKOFF_BASE_SECS".to_string(),
                reason: e.to_string(),
            })?;

    let api_base_url = or_default("CARSCOUT_API_BASE_URL", DEFAULT_API_BASE_URL);
    if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
        return Err(ConfigError::InvalidEnvVar {
            var: "CARSCOUT_API_BASE_URL".to_string(),
            reason: format!("\"{api_base_url}\" is not an http(s) URL"),
        });
    }

    Ok(AppConfig {
        config_path: PathBuf::from(or_default("CARSCOUT_CONFIG_PATH", "config.json")),
        log_level: or_default("CARSCOUT_LOG_LEVEL", "info"),
        bind_addr,
        user_agent: or_default("CARSCOUT_USER_AGENT", DEFAULT_USER_AGENT),
        api_base_url,
        retry_backoff_base_secs,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
