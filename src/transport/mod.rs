//! HTTP transport for the runner.
//!
//! A thin authenticated request layer: builds the full URL, attaches the
//! bearer credential, logs every attempt and outcome, and maps non-2xx
//! responses onto the error taxonomy. No retries happen here.

mod http_transport;

pub use http_transport::{ReqwestTransport, TransportConfig};

use async_trait::async_trait;
use std::sync::Arc;

use crate::errors::RunnerResult;

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET request.
    Get,
    /// POST request.
    Post,
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// Trait for HTTP transport implementations.
///
/// Services are generic over this trait so tests can swap in a mock.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Performs a GET request and returns the response body.
    async fn get(&self, path: &str) -> RunnerResult<Vec<u8>>;

    /// Performs a POST request with a JSON body and returns the response body.
    async fn post(&self, path: &str, body: Vec<u8>) -> RunnerResult<Vec<u8>>;

    /// Performs a multipart file upload and returns the response body.
    async fn post_multipart(
        &self,
        path: &str,
        file: Vec<u8>,
        filename: &str,
        purpose: &str,
    ) -> RunnerResult<Vec<u8>>;
}

#[async_trait]
impl<T> HttpTransport for Arc<T>
where
    T: HttpTransport + ?Sized,
{
    async fn get(&self, path: &str) -> RunnerResult<Vec<u8>> {
        self.as_ref().get(path).await
    }

    async fn post(&self, path: &str, body: Vec<u8>) -> RunnerResult<Vec<u8>> {
        self.as_ref().post(path, body).await
    }

    async fn post_multipart(
        &self,
        path: &str,
        file: Vec<u8>,
        filename: &str,
        purpose: &str,
    ) -> RunnerResult<Vec<u8>> {
        self.as_ref().post_multipart(path, file, filename, purpose).await
    }
}
