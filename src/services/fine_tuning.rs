//! Fine-tuning jobs service.

use async_trait::async_trait;

use crate::errors::{RunnerError, RunnerResult};
use crate::transport::HttpTransport;
use crate::types::fine_tuning::{CreateJobRequest, DryRunEstimate, FineTuningJob};

/// Fine-tuning service trait.
#[async_trait]
pub trait FineTuningService: Send + Sync {
    /// Submits the request with the dry-run flag set and returns the estimate.
    async fn dry_run(&self, request: CreateJobRequest) -> Result<DryRunEstimate, RunnerError>;

    /// Creates a new fine-tuning job.
    async fn create(&self, request: CreateJobRequest) -> Result<FineTuningJob, RunnerError>;

    /// Retrieves a fine-tuning job by id.
    async fn retrieve(&self, job_id: &str) -> Result<FineTuningJob, RunnerError>;

    /// Cancels a fine-tuning job.
    async fn cancel(&self, job_id: &str) -> Result<FineTuningJob, RunnerError>;
}

/// Default implementation of the fine-tuning service.
pub struct DefaultFineTuningService<T> {
    transport: T,
}

impl<T> DefaultFineTuningService<T> {
    /// Creates a new fine-tuning service.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

impl<T> DefaultFineTuningService<T>
where
    T: HttpTransport + Send + Sync,
{
    async fn submit(&self, request: &CreateJobRequest) -> RunnerResult<Vec<u8>> {
        let body = serde_json::to_vec(request)?;
        self.transport.post("/v1/fine_tuning/jobs", body).await
    }
}

#[async_trait]
impl<T> FineTuningService for DefaultFineTuningService<T>
where
    T: HttpTransport + Send + Sync,
{
    async fn dry_run(&self, mut request: CreateJobRequest) -> Result<DryRunEstimate, RunnerError> {
        request.dry_run = Some(true);
        let response = self.submit(&request).await?;
        super::decode(&response)
    }

    async fn create(&self, mut request: CreateJobRequest) -> Result<FineTuningJob, RunnerError> {
        request.dry_run = None;
        let response = self.submit(&request).await?;
        super::decode(&response)
    }

    async fn retrieve(&self, job_id: &str) -> Result<FineTuningJob, RunnerError> {
        let path = format!("/v1/fine_tuning/jobs/{}", job_id);
        let response = self.transport.get(&path).await?;
        super::decode(&response)
    }

    async fn cancel(&self, job_id: &str) -> Result<FineTuningJob, RunnerError> {
        let path = format!("/v1/fine_tuning/jobs/{}/cancel", job_id);
        let response = self.transport.post(&path, Vec::new()).await?;
        super::decode(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{MockResponse, MockTransport};
    use crate::types::fine_tuning::Hyperparameters;
    use std::sync::Arc;

    fn request() -> CreateJobRequest {
        CreateJobRequest {
            model: "open-mistral-7b".to_string(),
            training_files: vec!["file-123".to_string()],
            hyperparameters: Hyperparameters {
                learning_rate_multiplier: 1e-5,
                batch_size: 4,
                training_steps: None,
            },
            suffix: None,
            dry_run: None,
        }
    }

    #[tokio::test]
    async fn test_dry_run_sets_flag() {
        let transport = Arc::new(MockTransport::new());
        transport.enqueue_response(MockResponse::json(serde_json::json!({
            "n_epochs": 2,
            "n_train_tokens": 50000
        })));

        let service = DefaultFineTuningService::new(Arc::clone(&transport));
        let estimate = service.dry_run(request()).await.unwrap();

        assert_eq!(estimate.n_epochs, 2.0);
        assert_eq!(estimate.n_train_tokens, 50000);

        let recorded = transport.last_request().unwrap();
        let body: serde_json::Value =
            serde_json::from_slice(recorded.body.as_ref().unwrap()).unwrap();
        assert_eq!(body["dry_run"], true);
    }

    #[tokio::test]
    async fn test_create_clears_dry_run_flag() {
        let transport = Arc::new(MockTransport::new());
        transport.enqueue_response(MockResponse::json(serde_json::json!({
            "id": "job-1",
            "status": "QUEUED"
        })));

        let service = DefaultFineTuningService::new(Arc::clone(&transport));
        let mut stale = request();
        stale.dry_run = Some(true);
        let job = service.create(stale).await.unwrap();

        assert_eq!(job.id, "job-1");

        let recorded = transport.last_request().unwrap();
        let body: serde_json::Value =
            serde_json::from_slice(recorded.body.as_ref().unwrap()).unwrap();
        assert!(body.get("dry_run").is_none());
    }

    #[tokio::test]
    async fn test_retrieve_and_cancel_paths() {
        let transport = Arc::new(MockTransport::new());
        transport.enqueue_response(MockResponse::json(serde_json::json!({
            "id": "job-1",
            "status": "RUNNING"
        })));
        transport.enqueue_response(MockResponse::json(serde_json::json!({
            "id": "job-1",
            "status": "CANCELLING"
        })));

        let service = DefaultFineTuningService::new(Arc::clone(&transport));
        let job = service.retrieve("job-1").await.unwrap();
        assert!(!job.status.is_terminal());

        service.cancel("job-1").await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].path, "/v1/fine_tuning/jobs/job-1");
        assert_eq!(requests[1].path, "/v1/fine_tuning/jobs/job-1/cancel");
    }
}
