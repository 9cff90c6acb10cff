//! Chat completion service.

use async_trait::async_trait;

use crate::errors::RunnerError;
use crate::transport::HttpTransport;
use crate::types::chat::{ChatCompletionRequest, ChatCompletionResponse};

/// Chat service trait.
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Creates a chat completion.
    async fn create(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, RunnerError>;
}

/// Default implementation of the chat service.
pub struct DefaultChatService<T> {
    transport: T,
}

impl<T> DefaultChatService<T> {
    /// Creates a new chat service.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl<T> ChatService for DefaultChatService<T>
where
    T: HttpTransport + Send + Sync,
{
    async fn create(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, RunnerError> {
        let body = serde_json::to_vec(&request)?;
        let response = self.transport.post("/v1/chat/completions", body).await?;
        super::decode(&response)
    }
}
