//! Service configuration from environment variables.

use std::str::FromStr;

/// Application-level constants
pub const APP_NAME: &str = "Herb";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Hosted Gemini API endpoint used when no override is configured.
pub const DEFAULT_INFERENCE_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_INFERENCE_MODEL: &str = "gemini-2.5-flash";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8787";

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the inference service.
    pub inference_base_url: String,
    /// Model identifier passed to the inference service.
    pub inference_model: String,
    /// API key for the inference service. Empty means unauthenticated
    /// (local stub / tests).
    pub api_key: String,
    /// Per-request timeout for the outbound inference call.
    pub request_timeout_secs: u64,
    /// Bounded retries for transient gateway failures.
    pub max_retries: u32,
    /// Base backoff between retries; doubles per attempt.
    pub retry_backoff_ms: u64,
    /// Address the HTTP API binds to.
    pub bind_addr: String,
}

impl Config {
    /// Read configuration from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            inference_base_url: env_or("HERB_INFERENCE_URL", DEFAULT_INFERENCE_BASE_URL),
            inference_model: env_or("HERB_INFERENCE_MODEL", DEFAULT_INFERENCE_MODEL),
            api_key: std::env::var("GOOGLE_GEMINI_API_KEY").unwrap_or_default(),
            request_timeout_secs: env_parse(
                "HERB_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            ),
            max_retries: env_parse("HERB_MAX_RETRIES", DEFAULT_MAX_RETRIES),
            retry_backoff_ms: env_parse("HERB_RETRY_BACKOFF_MS", DEFAULT_RETRY_BACKOFF_MS),
            bind_addr: env_or("HERB_BIND_ADDR", DEFAULT_BIND_ADDR),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            inference_base_url: DEFAULT_INFERENCE_BASE_URL.to_string(),
            inference_model: DEFAULT_INFERENCE_MODEL.to_string(),
            api_key: String::new(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> &'static str {
    "info,herb=debug"
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_parse<T: FromStr + Copy>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_points_at_hosted_endpoint() {
        let config = Config::default();
        assert_eq!(config.inference_base_url, DEFAULT_INFERENCE_BASE_URL);
        assert_eq!(config.inference_model, "gemini-2.5-flash");
        assert_eq!(config.request_timeout_secs, 60);
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.retry_backoff_ms, 500);
        assert!(config.api_key.is_empty());
    }

    #[test]
    fn env_or_ignores_blank_values() {
        std::env::set_var("HERB_TEST_BLANK", "   ");
        assert_eq!(env_or("HERB_TEST_BLANK", "fallback"), "fallback");
        std::env::remove_var("HERB_TEST_BLANK");
    }

    #[test]
    fn env_or_uses_set_value() {
        std::env::set_var("HERB_TEST_SET", "http://localhost:9999");
        assert_eq!(env_or("HERB_TEST_SET", "fallback"), "http://localhost:9999");
        std::env::remove_var("HERB_TEST_SET");
    }

    #[test]
    fn env_parse_falls_back_on_garbage() {
        std::env::set_var("HERB_TEST_GARBAGE", "not-a-number");
        assert_eq!(env_parse("HERB_TEST_GARBAGE", 42u64), 42);
        std::env::remove_var("HERB_TEST_GARBAGE");
    }

    #[test]
    fn env_parse_reads_valid_number() {
        std::env::set_var("HERB_TEST_NUMBER", "7");
        assert_eq!(env_parse("HERB_TEST_NUMBER", 42u64), 7);
        std::env::remove_var("HERB_TEST_NUMBER");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, env!("CARGO_PKG_VERSION"));
    }
}
