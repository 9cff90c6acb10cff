//! Files service.

use async_trait::async_trait;

use crate::errors::RunnerError;
use crate::transport::HttpTransport;
use crate::types::files::{FileObject, FileUploadRequest};

/// Files service trait.
#[async_trait]
pub trait FilesService: Send + Sync {
    /// Uploads a file.
    async fn upload(&self, request: FileUploadRequest) -> Result<FileObject, RunnerError>;
}

/// Default implementation of the files service.
pub struct DefaultFilesService<T> {
    transport: T,
}

impl<T> DefaultFilesService<T> {
    /// Creates a new files service.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl<T> FilesService for DefaultFilesService<T>
where
    T: HttpTransport + Send + Sync,
{
    async fn upload(&self, request: FileUploadRequest) -> Result<FileObject, RunnerError> {
        let response = self
            .transport
            .post_multipart(
                "/v1/files",
                request.file,
                &request.filename,
                request.purpose.as_str(),
            )
            .await?;
        super::decode(&response)
    }
}
