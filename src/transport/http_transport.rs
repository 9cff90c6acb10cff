//! HTTP transport implementation using reqwest.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, error};

use super::{HttpTransport, Method};
use crate::errors::{ApiErrorResponse, RunnerError, RunnerResult};

/// Configuration for `ReqwestTransport`.
pub struct TransportConfig {
    /// Base URL for the API.
    pub base_url: String,
    /// API key for authentication.
    pub api_key: String,
    /// Request timeout.
    pub timeout: Duration,
}

/// Reqwest-based HTTP transport implementation.
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ReqwestTransport {
    /// Creates a new transport with the given configuration.
    pub fn with_config(config: TransportConfig) -> RunnerResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| RunnerError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url,
            api_key: config.api_key,
        })
    }

    /// Builds a full URL from a path.
    fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.api_key)
    }

    /// Maps HTTP status codes to runner errors.
    fn map_http_error(
        &self,
        status: u16,
        body: &Bytes,
        headers: &HashMap<String, String>,
    ) -> RunnerError {
        let api_error: Option<ApiErrorResponse> = serde_json::from_slice(body).ok();

        let message = api_error
            .as_ref()
            .map(|e| e.error.message.clone())
            .unwrap_or_else(|| format!("HTTP {} error", status));

        let retry_after = Self::extract_retry_after(headers);

        match status {
            400 => RunnerError::BadRequest {
                message,
                error_type: api_error.as_ref().and_then(|e| e.error.error_type.clone()),
                param: api_error.as_ref().and_then(|e| e.error.param.clone()),
                code: api_error.as_ref().and_then(|e| e.error.code.clone()),
            },
            401 => RunnerError::Authentication { message },
            403 => RunnerError::Permission { message },
            404 => RunnerError::NotFound {
                message,
                resource: api_error.as_ref().and_then(|e| e.error.param.clone()),
            },
            422 => RunnerError::Validation { message },
            429 => RunnerError::RateLimit {
                message,
                retry_after,
            },
            500 => RunnerError::Internal {
                message,
                request_id: headers.get("x-request-id").cloned(),
            },
            502 => RunnerError::BadGateway {
                message: "Bad gateway - upstream error".to_string(),
            },
            503 => RunnerError::ServiceUnavailable {
                message,
                retry_after,
            },
            504 => RunnerError::GatewayTimeout {
                message: "Gateway timeout - request took too long".to_string(),
            },
            _ => RunnerError::Unknown {
                status,
                message,
                body: Some(String::from_utf8_lossy(body).to_string()),
            },
        }
    }

    /// Extracts retry-after duration from headers.
    fn extract_retry_after(headers: &HashMap<String, String>) -> Option<Duration> {
        headers
            .get("retry-after")
            .or_else(|| headers.get("Retry-After"))
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
    }

    /// Converts response headers to a HashMap.
    fn extract_headers(headers: &reqwest::header::HeaderMap) -> HashMap<String, String> {
        headers
            .iter()
            .filter_map(|(k, v)| {
                v.to_str()
                    .ok()
                    .map(|val| (k.as_str().to_string(), val.to_string()))
            })
            .collect()
    }

    /// Sends a request and maps the outcome, logging both.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Bytes>,
    ) -> RunnerResult<Bytes> {
        let url = self.build_url(path);
        debug!(%method, %path, "sending API request");

        let mut request = self
            .client
            .request(method.into(), &url)
            .header("Authorization", self.bearer())
            .header("Content-Type", "application/json")
            .header("Accept", "application/json");

        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await.map_err(|e| {
            error!(%method, %path, error = %e, "API request failed");
            RunnerError::from(e)
        })?;

        self.consume_response(method, path, response).await
    }

    async fn consume_response(
        &self,
        method: Method,
        path: &str,
        response: reqwest::Response,
    ) -> RunnerResult<Bytes> {
        let status = response.status().as_u16();
        let headers = Self::extract_headers(response.headers());
        let body = response.bytes().await?;

        if status >= 400 {
            error!(
                %method,
                %path,
                status,
                body = %String::from_utf8_lossy(&body),
                "API request returned an error",
            );
            return Err(self.map_http_error(status, &body, &headers));
        }

        debug!(%method, %path, status, "API request succeeded");
        Ok(body)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, path: &str) -> RunnerResult<Vec<u8>> {
        let body = self.execute(Method::Get, path, None).await?;
        Ok(body.to_vec())
    }

    async fn post(&self, path: &str, body: Vec<u8>) -> RunnerResult<Vec<u8>> {
        let body = self
            .execute(Method::Post, path, Some(Bytes::from(body)))
            .await?;
        Ok(body.to_vec())
    }

    async fn post_multipart(
        &self,
        path: &str,
        file: Vec<u8>,
        filename: &str,
        purpose: &str,
    ) -> RunnerResult<Vec<u8>> {
        let url = self.build_url(path);
        debug!(%path, filename, purpose, "uploading file");

        let file_part = reqwest::multipart::Part::bytes(file)
            .file_name(filename.to_string())
            .mime_str("application/octet-stream")
            .map_err(|e| RunnerError::Configuration {
                message: format!("Invalid MIME type: {}", e),
            })?;

        let form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("purpose", purpose.to_string());

        // Content-Type is set by the multipart encoder.
        let response = self
            .client
            .post(&url)
            .header("Authorization", self.bearer())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!(%path, error = %e, "file upload failed");
                RunnerError::from(e)
            })?;

        let body = self.consume_response(Method::Post, path, response).await?;
        Ok(body.to_vec())
    }
}
