//! Mock transport for testing.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::errors::{RunnerError, RunnerResult};
use crate::transport::{HttpTransport, Method};

/// A recorded request for verification.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method.
    pub method: Method,
    /// Request path.
    pub path: String,
    /// Request body, for JSON requests.
    pub body: Option<Vec<u8>>,
    /// Purpose form field, for multipart uploads.
    pub purpose: Option<String>,
}

/// A canned response, or a canned failure.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// A successful response with the given body.
    Body(Bytes),
    /// An HTTP-level error with the given status and message.
    Status(u16, String),
}

impl MockResponse {
    /// Creates a successful JSON response.
    pub fn json(body: impl serde::Serialize) -> Self {
        MockResponse::Body(Bytes::from(
            serde_json::to_vec(&body).unwrap_or_default(),
        ))
    }

    /// Creates an error response.
    pub fn error(status: u16, message: &str) -> Self {
        MockResponse::Status(status, message.to_string())
    }

    fn into_result(self) -> RunnerResult<Vec<u8>> {
        match self {
            MockResponse::Body(bytes) => Ok(bytes.to_vec()),
            MockResponse::Status(status, message) => Err(RunnerError::Unknown {
                status,
                message,
                body: None,
            }),
        }
    }
}

/// Mock transport returning queued responses and recording requests.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<MockResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    /// Creates a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a response to the queue.
    pub fn enqueue_response(&self, response: MockResponse) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push_back(response);
        }
    }

    /// Returns all recorded requests.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Returns the last recorded request.
    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.requests().last().cloned()
    }

    /// Returns the number of requests made.
    pub fn request_count(&self) -> usize {
        self.requests().len()
    }

    /// Returns recorded requests whose path starts with the given prefix.
    pub fn requests_to(&self, prefix: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path.starts_with(prefix))
            .collect()
    }

    fn record(&self, request: RecordedRequest) {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
    }

    fn next_response(&self) -> MockResponse {
        self.responses
            .lock()
            .ok()
            .and_then(|mut r| r.pop_front())
            .unwrap_or_else(|| MockResponse::error(500, "No mock response configured"))
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn get(&self, path: &str) -> RunnerResult<Vec<u8>> {
        self.record(RecordedRequest {
            method: Method::Get,
            path: path.to_string(),
            body: None,
            purpose: None,
        });
        self.next_response().into_result()
    }

    async fn post(&self, path: &str, body: Vec<u8>) -> RunnerResult<Vec<u8>> {
        self.record(RecordedRequest {
            method: Method::Post,
            path: path.to_string(),
            body: Some(body),
            purpose: None,
        });
        self.next_response().into_result()
    }

    async fn post_multipart(
        &self,
        path: &str,
        file: Vec<u8>,
        _filename: &str,
        purpose: &str,
    ) -> RunnerResult<Vec<u8>> {
        self.record(RecordedRequest {
            method: Method::Post,
            path: path.to_string(),
            body: Some(file),
            purpose: Some(purpose.to_string()),
        });
        self.next_response().into_result()
    }
}
