//! File upload types.

use serde::{Deserialize, Serialize};

/// Purpose of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilePurpose {
    /// Fine-tuning training data.
    #[serde(rename = "fine-tune")]
    FineTune,
}

impl FilePurpose {
    /// Returns the wire value sent in the multipart form.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilePurpose::FineTune => "fine-tune",
        }
    }
}

/// File upload request.
#[derive(Debug, Clone)]
pub struct FileUploadRequest {
    /// The file content.
    pub file: Vec<u8>,
    /// The filename.
    pub filename: String,
    /// The purpose of the file.
    pub purpose: FilePurpose,
}

impl FileUploadRequest {
    /// Creates a new file upload request.
    pub fn new(file: Vec<u8>, filename: impl Into<String>, purpose: FilePurpose) -> Self {
        Self {
            file,
            filename: filename.into(),
            purpose,
        }
    }
}

/// Uploaded file information.
#[derive(Debug, Clone, Deserialize)]
pub struct FileObject {
    /// File ID.
    pub id: String,
    /// Object type.
    pub object: String,
    /// File size in bytes.
    pub bytes: u64,
    /// Creation timestamp.
    pub created_at: i64,
    /// Filename.
    pub filename: String,
    /// Number of lines in the file.
    #[serde(default)]
    pub num_lines: Option<u32>,
}
