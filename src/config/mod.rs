//! Configuration for the runner.
//!
//! The API credential is an explicitly passed value: it is set once when the
//! configuration is built and threaded through every component from there,
//! never read from ambient process state by the library itself.

use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use crate::errors::{RunnerError, RunnerResult};

/// Default base URL for the API.
pub const DEFAULT_BASE_URL: &str = "https://api.mistral.ai";

/// Default request timeout (10 minutes for long-running operations).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Configuration for the runner client.
#[derive(Clone)]
pub struct RunnerConfig {
    /// API key for authentication (stored securely).
    pub(crate) api_key: SecretString,
    /// Base URL for API requests.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl RunnerConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> RunnerConfigBuilder {
        RunnerConfigBuilder::new()
    }

    /// Creates a configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `MISTRAL_API_KEY` (required): API key for authentication
    /// - `MISTRAL_BASE_URL` (optional): Custom base URL
    /// - `MISTRAL_TIMEOUT` (optional): Request timeout in seconds
    pub fn from_env() -> RunnerResult<Self> {
        let api_key = std::env::var("MISTRAL_API_KEY").map_err(|_| {
            RunnerError::Configuration {
                message: "MISTRAL_API_KEY environment variable not set".to_string(),
            }
        })?;

        let mut builder = RunnerConfigBuilder::new().api_key(api_key);

        if let Ok(base_url) = std::env::var("MISTRAL_BASE_URL") {
            builder = builder.base_url(base_url);
        }

        if let Ok(timeout_str) = std::env::var("MISTRAL_TIMEOUT") {
            if let Ok(timeout_secs) = timeout_str.parse::<u64>() {
                builder = builder.timeout(Duration::from_secs(timeout_secs));
            }
        }

        builder.build()
    }

    /// Returns the API key (exposing the secret).
    pub(crate) fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

impl std::fmt::Debug for RunnerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunnerConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Builder for `RunnerConfig`.
#[derive(Default)]
pub struct RunnerConfigBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl RunnerConfigBuilder {
    /// Creates a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> RunnerResult<RunnerConfig> {
        let api_key = self.api_key.ok_or_else(|| RunnerError::Configuration {
            message: "API key is required".to_string(),
        })?;

        if api_key.is_empty() {
            return Err(RunnerError::Configuration {
                message: "API key cannot be empty".to_string(),
            });
        }

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let parsed = url::Url::parse(&base_url)?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(RunnerError::Configuration {
                message: "Base URL must start with http:// or https://".to_string(),
            });
        }

        Ok(RunnerConfig {
            api_key: SecretString::new(api_key),
            base_url,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
        })
    }
}
