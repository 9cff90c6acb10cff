//! Model listing types.

use serde::Deserialize;

/// An available model.
#[derive(Debug, Clone, Deserialize)]
pub struct Model {
    /// Model ID.
    pub id: String,
    /// Object type.
    pub object: String,
    /// Creation timestamp.
    #[serde(default)]
    pub created: Option<i64>,
    /// Owner of the model.
    #[serde(default)]
    pub owned_by: Option<String>,
}

/// Response from listing models.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelListResponse {
    /// Object type.
    pub object: String,
    /// List of models.
    pub data: Vec<Model>,
}
