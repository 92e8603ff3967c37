use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default number of documents per request for the batched operations.
pub const DEFAULT_BATCH_SIZE: usize = 1000;
/// Default interval between task status polls.
pub const DEFAULT_TASK_POLL_MS: u64 = 50;
/// Default upper bound on how long a task wait may take.
pub const DEFAULT_TASK_TIMEOUT_MS: u64 = 5000;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for a docfeed client.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the search engine.
    pub search_url: String,
    /// Optional API key sent as a bearer token.
    pub api_key: Option<String>,
    /// Optional per-request timeout.
    pub request_timeout_secs: Option<u64>,
    /// Batch size used by callers that do not pick one explicitly.
    pub default_batch_size: usize,
    /// Delay between task status polls.
    pub task_poll_interval_ms: u64,
    /// Maximum time spent waiting for a single task.
    pub task_timeout_ms: u64,
}

impl Config {
    /// Build a configuration pointing at `search_url` with default tuning.
    pub fn new(search_url: impl Into<String>) -> Self {
        Self {
            search_url: search_url.into(),
            api_key: None,
            request_timeout_secs: None,
            default_batch_size: DEFAULT_BATCH_SIZE,
            task_poll_interval_ms: DEFAULT_TASK_POLL_MS,
            task_timeout_ms: DEFAULT_TASK_TIMEOUT_MS,
        }
    }

    /// Attach an API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into()).filter(|key: &String| !key.trim().is_empty());
        self
    }

    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let batch_size: Option<usize> = parse_optional("DOCFEED_BATCH_SIZE")?;
        let default_batch_size = batch_size.unwrap_or(DEFAULT_BATCH_SIZE);
        if default_batch_size == 0 {
            return Err(ConfigError::InvalidValue("DOCFEED_BATCH_SIZE".into()));
        }
        let poll_ms: Option<u64> = parse_optional("DOCFEED_TASK_POLL_MS")?;
        let timeout_ms: Option<u64> = parse_optional("DOCFEED_TASK_TIMEOUT_MS")?;

        Ok(Self {
            search_url: load_env("DOCFEED_URL")?,
            api_key: load_env_optional("DOCFEED_API_KEY"),
            request_timeout_secs: parse_optional("DOCFEED_TIMEOUT_SECS")?,
            default_batch_size,
            task_poll_interval_ms: poll_ms.unwrap_or(DEFAULT_TASK_POLL_MS),
            task_timeout_ms: timeout_ms.unwrap_or(DEFAULT_TASK_TIMEOUT_MS),
        })
    }

    /// Read a `.env` file when present, then load from the environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config = Self::from_env()?;
        tracing::debug!(
            url = %config.search_url,
            has_api_key = config.api_key.is_some(),
            timeout_secs = ?config.request_timeout_secs,
            batch_size = config.default_batch_size,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Request timeout as a [`Duration`], if configured.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Poll interval used by task waits.
    pub fn task_poll_interval(&self) -> Duration {
        Duration::from_millis(self.task_poll_interval_ms)
    }

    /// Upper bound used by task waits.
    pub fn task_timeout(&self) -> Duration {
        Duration::from_millis(self.task_timeout_ms)
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    load_env_optional(key).ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_optional<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_applies_defaults() {
        let config = Config::new("http://127.0.0.1:7700");
        assert_eq!(config.default_batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.task_poll_interval(), Duration::from_millis(50));
        assert!(config.api_key.is_none());
        assert!(config.request_timeout().is_none());
    }

    #[test]
    fn blank_api_key_is_dropped() {
        let config = Config::new("http://localhost").with_api_key("   ");
        assert!(config.api_key.is_none());
        let config = Config::new("http://localhost").with_api_key("masterKey");
        assert_eq!(config.api_key.as_deref(), Some("masterKey"));
    }

    #[test]
    fn parse_optional_rejects_garbage() {
        // SAFETY: the variable name is unique to this test.
        unsafe { env::set_var("DOCFEED_TEST_PARSE_GARBAGE", "ten") };
        match parse_optional::<u64>("DOCFEED_TEST_PARSE_GARBAGE") {
            Err(ConfigError::InvalidValue(key)) => assert_eq!(key, "DOCFEED_TEST_PARSE_GARBAGE"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn parse_optional_treats_blank_as_missing() {
        // SAFETY: the variable name is unique to this test.
        unsafe { env::set_var("DOCFEED_TEST_PARSE_BLANK", "  ") };
        let parsed: Option<u64> = parse_optional("DOCFEED_TEST_PARSE_BLANK").expect("blank");
        assert!(parsed.is_none());
    }
}
