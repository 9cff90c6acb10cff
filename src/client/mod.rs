//! The runner's API client.

use std::sync::Arc;
use std::time::Duration;

use crate::config::RunnerConfig;
use crate::errors::RunnerResult;
use crate::services::{
    DefaultChatService, DefaultFilesService, DefaultFineTuningService, DefaultModelsService,
};
use crate::transport::{HttpTransport, ReqwestTransport, TransportConfig};

/// The API client: configuration, transport, and the services over it.
pub struct RunnerClient {
    config: RunnerConfig,
    transport: Arc<dyn HttpTransport>,
}

impl RunnerClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: RunnerConfig) -> RunnerResult<Self> {
        let transport = ReqwestTransport::with_config(TransportConfig {
            base_url: config.base_url.clone(),
            api_key: config.api_key().to_string(),
            timeout: config.timeout,
        })?;

        Ok(Self {
            config,
            transport: Arc::new(transport),
        })
    }

    /// Creates a client over an injected transport.
    ///
    /// The seam used by tests and the `mocks` feature.
    pub fn with_transport(config: RunnerConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self { config, transport }
    }

    /// Creates a new client builder.
    pub fn builder() -> RunnerClientBuilder {
        RunnerClientBuilder::new()
    }

    /// Creates a client from an API key.
    pub fn from_api_key(api_key: impl Into<String>) -> RunnerResult<Self> {
        let config = RunnerConfig::builder().api_key(api_key).build()?;
        Self::new(config)
    }

    /// Returns the models service.
    pub fn models(&self) -> DefaultModelsService<Arc<dyn HttpTransport>> {
        DefaultModelsService::new(Arc::clone(&self.transport))
    }

    /// Returns the files service.
    pub fn files(&self) -> DefaultFilesService<Arc<dyn HttpTransport>> {
        DefaultFilesService::new(Arc::clone(&self.transport))
    }

    /// Returns the fine-tuning service.
    pub fn fine_tuning(&self) -> DefaultFineTuningService<Arc<dyn HttpTransport>> {
        DefaultFineTuningService::new(Arc::clone(&self.transport))
    }

    /// Returns the chat service.
    pub fn chat(&self) -> DefaultChatService<Arc<dyn HttpTransport>> {
        DefaultChatService::new(Arc::clone(&self.transport))
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }
}

/// Builder for the runner client.
#[derive(Default)]
pub struct RunnerClientBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl RunnerClientBuilder {
    /// Creates a new client builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the client.
    pub fn build(self) -> RunnerResult<RunnerClient> {
        let mut config_builder = RunnerConfig::builder();

        if let Some(api_key) = self.api_key {
            config_builder = config_builder.api_key(api_key);
        }

        if let Some(base_url) = self.base_url {
            config_builder = config_builder.base_url(base_url);
        }

        if let Some(timeout) = self.timeout {
            config_builder = config_builder.timeout(timeout);
        }

        RunnerClient::new(config_builder.build()?)
    }
}
