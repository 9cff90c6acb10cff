//! Service implementations for the endpoints the workflow consumes.

pub mod chat;
pub mod files;
pub mod fine_tuning;
pub mod models;

pub use chat::{ChatService, DefaultChatService};
pub use files::{DefaultFilesService, FilesService};
pub use fine_tuning::{DefaultFineTuningService, FineTuningService};
pub use models::{DefaultModelsService, ModelsService};

use crate::errors::{RunnerError, RunnerResult};

/// Decodes a response body, keeping the body in the error for diagnostics.
pub(crate) fn decode<T: serde::de::DeserializeOwned>(body: &[u8]) -> RunnerResult<T> {
    serde_json::from_slice(body).map_err(|e| RunnerError::Deserialization {
        message: e.to_string(),
        body: String::from_utf8_lossy(body).to_string(),
    })
}
