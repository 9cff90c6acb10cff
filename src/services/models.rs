//! Models service.

use async_trait::async_trait;

use crate::errors::RunnerError;
use crate::transport::HttpTransport;
use crate::types::models::{Model, ModelListResponse};

/// Models service trait.
#[async_trait]
pub trait ModelsService: Send + Sync {
    /// Lists all available models.
    async fn list(&self) -> Result<ModelListResponse, RunnerError>;

    /// Retrieves a specific model.
    async fn retrieve(&self, model_id: &str) -> Result<Model, RunnerError>;
}

/// Default implementation of the models service.
pub struct DefaultModelsService<T> {
    transport: T,
}

impl<T> DefaultModelsService<T> {
    /// Creates a new models service.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl<T> ModelsService for DefaultModelsService<T>
where
    T: HttpTransport + Send + Sync,
{
    async fn list(&self) -> Result<ModelListResponse, RunnerError> {
        let response = self.transport.get("/v1/models").await?;
        super::decode(&response)
    }

    async fn retrieve(&self, model_id: &str) -> Result<Model, RunnerError> {
        let path = format!("/v1/models/{}", model_id);
        let response = self.transport.get(&path).await?;
        super::decode(&response)
    }
}
