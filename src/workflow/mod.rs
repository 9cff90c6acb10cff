//! The fine-tuning workflow orchestrator.
//!
//! A sequential protocol over the API client: check connectivity, upload the
//! validated dataset, dry-run the submission to size the job, submit for
//! real, poll to a terminal status, then smoke-test the resulting model and
//! persist its id.

use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::client::RunnerClient;
use crate::dataset;
use crate::errors::{RunnerError, RunnerResult};
use crate::services::{ChatService, FilesService, FineTuningService, ModelsService};
use crate::types::chat::{ChatCompletionRequest, Message};
use crate::types::files::{FilePurpose, FileUploadRequest};
use crate::types::fine_tuning::{CreateJobRequest, FineTuningJob, Hyperparameters, JobStatus};

/// Default base model to fine-tune.
pub const DEFAULT_BASE_MODEL: &str = "open-mistral-7b";

/// Default learning rate multiplier.
pub const DEFAULT_LEARNING_RATE_MULTIPLIER: f64 = 1e-5;

/// Default batch size.
pub const DEFAULT_BATCH_SIZE: u32 = 4;

/// Default interval between job status fetches.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Default prompt for the inference smoke test.
pub const DEFAULT_TEST_PROMPT: &str = "Hello, how are you?";

/// Default path of the persisted model-info record.
pub const DEFAULT_OUTPUT_FILE: &str = "fine_tuned_model_info.json";

/// What to train and how.
#[derive(Debug, Clone)]
pub struct TrainingPlan {
    /// Base model name.
    pub model: String,
    /// Learning rate multiplier.
    pub learning_rate_multiplier: f64,
    /// Batch size.
    pub batch_size: u32,
    /// Optional suffix for the fine-tuned model name.
    pub suffix: Option<String>,
}

impl Default for TrainingPlan {
    fn default() -> Self {
        Self {
            model: DEFAULT_BASE_MODEL.to_string(),
            learning_rate_multiplier: DEFAULT_LEARNING_RATE_MULTIPLIER,
            batch_size: DEFAULT_BATCH_SIZE,
            suffix: None,
        }
    }
}

/// Workflow behavior knobs.
#[derive(Debug, Clone)]
pub struct WorkflowOptions {
    /// The training plan.
    pub plan: TrainingPlan,
    /// Interval between job status fetches (also the error-retry delay).
    pub poll_interval: Duration,
    /// Minimum time between periodic elapsed-time log lines.
    pub verbose_interval: Duration,
    /// Optional bound on total polling wall-clock. `None` polls forever.
    pub poll_deadline: Option<Duration>,
    /// Whether to best-effort cancel the remote job when the deadline hits.
    pub cancel_on_deadline: bool,
    /// Prompt for the inference smoke test.
    pub test_prompt: String,
    /// Where to persist the fine-tuned model id.
    pub output_path: PathBuf,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            plan: TrainingPlan::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            verbose_interval: DEFAULT_POLL_INTERVAL,
            poll_deadline: None,
            cancel_on_deadline: true,
            test_prompt: DEFAULT_TEST_PROMPT.to_string(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_FILE),
        }
    }
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct WorkflowOutcome {
    /// The job in its terminal state.
    pub job: FineTuningJob,
    /// The fine-tuned model id, on success.
    pub fine_tuned_model: Option<String>,
    /// The smoke-test completion, on success.
    pub sample_completion: Option<String>,
}

impl WorkflowOutcome {
    /// True when the run produced a fine-tuned model.
    pub fn succeeded(&self) -> bool {
        self.fine_tuned_model.is_some()
    }
}

/// Computes the training step count from a dry-run estimate.
///
/// Aims for 10 epochs while capping total epoch-equivalent work at 100, then
/// converts to steps at 1000 tokens per step, never returning zero. The
/// arithmetic is a tuned heuristic; keep it as is.
pub fn compute_training_steps(n_epochs: f64, n_train_tokens: u64) -> u32 {
    let desired_epochs = (100.0 / n_epochs).min(10.0);
    let steps = (desired_epochs * n_train_tokens as f64 / 1000.0).floor();
    steps.max(1.0) as u32
}

/// Drives one fine-tuning run end to end.
pub struct FineTuneWorkflow<'a> {
    client: &'a RunnerClient,
    options: WorkflowOptions,
}

impl<'a> FineTuneWorkflow<'a> {
    /// Creates a workflow over the given client.
    pub fn new(client: &'a RunnerClient, options: WorkflowOptions) -> Self {
        Self { client, options }
    }

    /// Runs the whole workflow against the given dataset file.
    pub async fn run(&self, dataset_path: &Path) -> RunnerResult<WorkflowOutcome> {
        let report = dataset::validate_file(dataset_path)?;

        self.connectivity_check().await?;

        let file_id = self.upload_dataset(&report.path).await?;

        let mut request = self.base_request(file_id);
        let steps = self.plan_training_steps(&request).await?;
        request.hyperparameters.training_steps = Some(steps);

        let job = self.client.fine_tuning().create(request).await?;
        info!(job_id = %job.id, "fine-tuning job created");

        let job = self.poll_until_terminal(&job.id).await?;

        if job.status != JobStatus::Success {
            error!(status = ?job.status, "fine-tuning job did not succeed");
            return Ok(WorkflowOutcome {
                job,
                fine_tuned_model: None,
                sample_completion: None,
            });
        }

        let model_id = job.fine_tuned_model.clone().ok_or_else(|| {
            RunnerError::NotFound {
                message: "job succeeded but no fine-tuned model id was returned".to_string(),
                resource: Some("fine_tuned_model".to_string()),
            }
        })?;
        info!(model = %model_id, "fine-tuning job completed successfully");

        let sample = self.smoke_test(&model_id).await?;
        self.persist_artifact(&model_id)?;

        Ok(WorkflowOutcome {
            job,
            fine_tuned_model: Some(model_id),
            sample_completion: Some(sample),
        })
    }

    /// Lists models to confirm the API is reachable with this credential.
    pub async fn connectivity_check(&self) -> RunnerResult<usize> {
        let models = self.client.models().list().await?;
        info!(models = models.data.len(), "connected to API");
        Ok(models.data.len())
    }

    /// Uploads the dataset file and returns the file id.
    pub async fn upload_dataset(&self, path: &Path) -> RunnerResult<String> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("dataset.jsonl");
        info!(file = filename, "uploading dataset");

        let contents = tokio::fs::read(path).await?;
        let file = self
            .client
            .files()
            .upload(FileUploadRequest::new(
                contents,
                filename,
                FilePurpose::FineTune,
            ))
            .await?;

        info!(file_id = %file.id, "dataset uploaded");
        Ok(file.id)
    }

    fn base_request(&self, file_id: String) -> CreateJobRequest {
        let plan = &self.options.plan;
        CreateJobRequest {
            model: plan.model.clone(),
            training_files: vec![file_id],
            hyperparameters: Hyperparameters {
                learning_rate_multiplier: plan.learning_rate_multiplier,
                batch_size: plan.batch_size,
                training_steps: None,
            },
            suffix: plan.suffix.clone(),
            dry_run: None,
        }
    }

    /// Dry-runs the submission and sizes the job from the estimate.
    async fn plan_training_steps(&self, request: &CreateJobRequest) -> RunnerResult<u32> {
        let estimate = self.client.fine_tuning().dry_run(request.clone()).await?;
        info!(
            n_epochs = estimate.n_epochs,
            n_train_tokens = estimate.n_train_tokens,
            "dry run estimate",
        );

        let steps = compute_training_steps(estimate.n_epochs, estimate.n_train_tokens);
        info!(training_steps = steps, "adjusted training steps");
        Ok(steps)
    }

    /// Polls the job at a fixed interval until it reaches a terminal status.
    ///
    /// Fetch failures are logged and retried after the same interval; the
    /// loop only stops on a terminal status or on the configured deadline.
    /// When the deadline expires the remote job is best-effort cancelled and
    /// the error carries the last observed status (`None` if no fetch ever
    /// succeeded).
    pub async fn poll_until_terminal(&self, job_id: &str) -> RunnerResult<FineTuningJob> {
        info!(job_id = %job_id, "monitoring fine-tuning job");
        let started = Instant::now();
        let mut last_verbose = Instant::now();
        let mut last_status: Option<JobStatus> = None;

        loop {
            match self.client.fine_tuning().retrieve(job_id).await {
                Ok(job) => {
                    let progress = job.progress_percentage();
                    info!(status = ?job.status, progress, "job status");
                    last_status = Some(job.status);

                    if job.status.is_terminal() {
                        return Ok(job);
                    }

                    if last_verbose.elapsed() >= self.options.verbose_interval {
                        info!(
                            status = ?job.status,
                            progress,
                            elapsed_secs = started.elapsed().as_secs(),
                            "fine-tuning still in progress",
                        );
                        last_verbose = Instant::now();
                    }
                }
                Err(e) => {
                    warn!(error = %e, "error checking job status, will retry");
                }
            }

            if let Some(deadline) = self.options.poll_deadline {
                if started.elapsed() >= deadline {
                    if self.options.cancel_on_deadline {
                        match self.client.fine_tuning().cancel(job_id).await {
                            Ok(job) => info!(status = ?job.status, "job cancelled after deadline"),
                            Err(e) => warn!(error = %e, "failed to cancel job after deadline"),
                        }
                    }
                    return Err(RunnerError::PollDeadline {
                        elapsed: started.elapsed(),
                        last_status,
                    });
                }
            }

            tokio::time::sleep(self.options.poll_interval).await;
        }
    }

    /// Sends one test prompt to the fine-tuned model and returns the reply.
    pub async fn smoke_test(&self, model_id: &str) -> RunnerResult<String> {
        info!(model = %model_id, prompt = %self.options.test_prompt, "running inference smoke test");

        let request = ChatCompletionRequest::new(
            model_id,
            vec![Message::user(self.options.test_prompt.clone())],
        );
        let response = self.client.chat().create(request).await?;

        let content = response
            .first_content()
            .ok_or_else(|| RunnerError::NotFound {
                message: "chat completion returned no choices".to_string(),
                resource: Some("choices".to_string()),
            })?
            .to_string();

        info!(response = %content, "test prompt response");
        Ok(content)
    }

    /// Persists the fine-tuned model id as the durable output of the run.
    fn persist_artifact(&self, model_id: &str) -> RunnerResult<()> {
        let record = serde_json::json!({ "fine_tuned_model_id": model_id });
        std::fs::write(&self.options.output_path, serde_json::to_vec_pretty(&record)?)?;
        info!(path = %self.options.output_path.display(), "fine-tuned model information saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunnerConfig;
    use crate::mocks::{MockResponse, MockTransport};
    use std::io::Write;
    use std::sync::Arc;
    use test_case::test_case;

    #[test_case(2.0, 50000 => 500; "ten epochs within cap")]
    #[test_case(200.0, 500 => 1; "floors to the minimum of one step")]
    #[test_case(1.0, 1000 => 10; "small dataset")]
    #[test_case(20.0, 100000 => 500; "cap limits desired epochs")]
    fn training_steps(n_epochs: f64, n_train_tokens: u64) -> u32 {
        compute_training_steps(n_epochs, n_train_tokens)
    }

    fn mock_client(transport: Arc<MockTransport>) -> RunnerClient {
        let config = RunnerConfig::builder()
            .api_key("test-key")
            .build()
            .unwrap();
        RunnerClient::with_transport(config, transport)
    }

    fn fast_options() -> WorkflowOptions {
        WorkflowOptions {
            poll_interval: Duration::from_millis(1),
            verbose_interval: Duration::from_millis(1),
            ..WorkflowOptions::default()
        }
    }

    fn job_json(status: &str) -> MockResponse {
        MockResponse::json(serde_json::json!({
            "id": "job-1",
            "status": status,
            "progress": {"percentage_complete": 50.0}
        }))
    }

    #[tokio::test]
    async fn test_poll_stops_on_terminal_status() {
        let transport = Arc::new(MockTransport::new());
        transport.enqueue_response(job_json("RUNNING"));
        transport.enqueue_response(job_json("RUNNING"));
        transport.enqueue_response(job_json("FAILED"));

        let client = mock_client(Arc::clone(&transport));
        let workflow = FineTuneWorkflow::new(&client, fast_options());

        let job = workflow.poll_until_terminal("job-1").await.unwrap();

        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(transport.request_count(), 3);
    }

    #[tokio::test]
    async fn test_poll_swallows_transient_errors() {
        let transport = Arc::new(MockTransport::new());
        transport.enqueue_response(MockResponse::error(503, "unavailable"));
        transport.enqueue_response(job_json("SUCCESS"));

        let client = mock_client(Arc::clone(&transport));
        let workflow = FineTuneWorkflow::new(&client, fast_options());

        let job = workflow.poll_until_terminal("job-1").await.unwrap();

        assert_eq!(job.status, JobStatus::Success);
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_poll_deadline_cancels_and_reports_last_status() {
        let transport = Arc::new(MockTransport::new());
        transport.enqueue_response(job_json("RUNNING"));
        transport.enqueue_response(job_json("CANCELLING"));

        let client = mock_client(Arc::clone(&transport));
        let options = WorkflowOptions {
            poll_deadline: Some(Duration::ZERO),
            ..fast_options()
        };
        let workflow = FineTuneWorkflow::new(&client, options);

        let result = workflow.poll_until_terminal("job-1").await;

        match result {
            Err(RunnerError::PollDeadline { last_status, .. }) => {
                assert_eq!(last_status, Some(JobStatus::Running));
            }
            other => panic!("expected PollDeadline, got {:?}", other.map(|j| j.status)),
        }

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].path, "/v1/fine_tuning/jobs/job-1/cancel");
    }

    #[tokio::test]
    async fn test_poll_deadline_without_any_observation_reports_unknown() {
        let transport = Arc::new(MockTransport::new());
        transport.enqueue_response(MockResponse::error(500, "boom"));

        let client = mock_client(Arc::clone(&transport));
        let options = WorkflowOptions {
            poll_deadline: Some(Duration::ZERO),
            cancel_on_deadline: false,
            ..fast_options()
        };
        let workflow = FineTuneWorkflow::new(&client, options);

        match workflow.poll_until_terminal("job-1").await {
            Err(RunnerError::PollDeadline { last_status, .. }) => {
                assert_eq!(last_status, None);
            }
            other => panic!("expected PollDeadline, got {:?}", other.map(|j| j.status)),
        }
        assert_eq!(transport.request_count(), 1);
    }

    fn write_dataset(dir: &Path) -> PathBuf {
        let path = dir.join("fine_tuning_data.jsonl");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"{{"messages":[{{"role":"user","content":"hi"}},{{"role":"assistant","content":"hello"}}]}}"#
        )
        .unwrap();
        path
    }

    fn enqueue_happy_path(transport: &MockTransport) {
        transport.enqueue_response(MockResponse::json(serde_json::json!({
            "object": "list",
            "data": [{"id": "open-mistral-7b", "object": "model"}]
        })));
        transport.enqueue_response(MockResponse::json(serde_json::json!({
            "id": "file-123",
            "object": "file",
            "bytes": 64,
            "created_at": 1700000000,
            "filename": "fine_tuning_data.jsonl"
        })));
        transport.enqueue_response(MockResponse::json(serde_json::json!({
            "n_epochs": 2,
            "n_train_tokens": 50000
        })));
        transport.enqueue_response(MockResponse::json(serde_json::json!({
            "id": "job-1",
            "status": "QUEUED"
        })));
    }

    #[tokio::test]
    async fn test_run_success_persists_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = write_dataset(dir.path());
        let output = dir.path().join("fine_tuned_model_info.json");

        let transport = Arc::new(MockTransport::new());
        enqueue_happy_path(&transport);
        transport.enqueue_response(MockResponse::json(serde_json::json!({
            "id": "job-1",
            "status": "SUCCESS",
            "fine_tuned_model": "ft:open-mistral-7b:abc123"
        })));
        transport.enqueue_response(MockResponse::json(serde_json::json!({
            "id": "cmpl-1",
            "object": "chat.completion",
            "model": "ft:open-mistral-7b:abc123",
            "created": 1700000000,
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "I am well."}}
            ]
        })));

        let client = mock_client(Arc::clone(&transport));
        let options = WorkflowOptions {
            output_path: output.clone(),
            ..fast_options()
        };
        let workflow = FineTuneWorkflow::new(&client, options);

        let outcome = workflow.run(&dataset).await.unwrap();

        assert!(outcome.succeeded());
        assert_eq!(
            outcome.fine_tuned_model.as_deref(),
            Some("ft:open-mistral-7b:abc123")
        );
        assert_eq!(outcome.sample_completion.as_deref(), Some("I am well."));

        // The real submission carries the steps computed from the dry run.
        let submissions = transport.requests_to("/v1/fine_tuning/jobs");
        let create_body: serde_json::Value =
            serde_json::from_slice(submissions[1].body.as_ref().unwrap()).unwrap();
        assert_eq!(create_body["hyperparameters"]["training_steps"], 500);
        assert!(create_body.get("dry_run").is_none());

        let saved: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&output).unwrap()).unwrap();
        assert_eq!(saved["fine_tuned_model_id"], "ft:open-mistral-7b:abc123");
    }

    #[tokio::test]
    async fn test_run_failed_job_skips_smoke_test() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = write_dataset(dir.path());
        let output = dir.path().join("fine_tuned_model_info.json");

        let transport = Arc::new(MockTransport::new());
        enqueue_happy_path(&transport);
        transport.enqueue_response(job_json("FAILED"));

        let client = mock_client(Arc::clone(&transport));
        let options = WorkflowOptions {
            output_path: output.clone(),
            ..fast_options()
        };
        let workflow = FineTuneWorkflow::new(&client, options);

        let outcome = workflow.run(&dataset).await.unwrap();

        assert!(!outcome.succeeded());
        assert_eq!(outcome.job.status, JobStatus::Failed);
        assert!(outcome.sample_completion.is_none());
        // models + upload + dry run + create + one poll; no chat call
        assert_eq!(transport.request_count(), 5);
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_run_end_to_end_over_http() {
        use wiremock::matchers::{body_partial_json, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let dir = tempfile::tempdir().unwrap();
        let dataset = write_dataset(dir.path());
        let output = dir.path().join("fine_tuned_model_info.json");

        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "object": "list",
                "data": [{"id": "open-mistral-7b", "object": "model"}]
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/files"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "file-123",
                "object": "file",
                "bytes": 64,
                "created_at": 1700000000,
                "filename": "fine_tuning_data.jsonl"
            })))
            .mount(&server)
            .await;

        // Dry-run submissions carry the flag; mounted first so it wins.
        Mock::given(method("POST"))
            .and(path("/v1/fine_tuning/jobs"))
            .and(body_partial_json(serde_json::json!({"dry_run": true})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "n_epochs": 200,
                "n_train_tokens": 500
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/fine_tuning/jobs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "job-1",
                "status": "QUEUED"
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/fine_tuning/jobs/job-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "job-1",
                "status": "SUCCESS",
                "fine_tuned_model": "ft:open-mistral-7b:abc123"
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "cmpl-1",
                "object": "chat.completion",
                "model": "ft:open-mistral-7b:abc123",
                "created": 1700000000,
                "choices": [
                    {"index": 0, "message": {"role": "assistant", "content": "I am well."}}
                ]
            })))
            .mount(&server)
            .await;

        let client = RunnerClient::builder()
            .api_key("test-key")
            .base_url(server.uri())
            .build()
            .unwrap();
        let options = WorkflowOptions {
            output_path: output.clone(),
            ..fast_options()
        };
        let workflow = FineTuneWorkflow::new(&client, options);

        let outcome = workflow.run(&dataset).await.unwrap();

        assert!(outcome.succeeded());

        // (200, 500): desired epochs capped at 0.5, floored steps clamped to 1.
        let requests = server.received_requests().await.unwrap();
        let create = requests
            .iter()
            .find(|r| {
                r.url.path() == "/v1/fine_tuning/jobs"
                    && !String::from_utf8_lossy(&r.body).contains("dry_run")
            })
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&create.body).unwrap();
        assert_eq!(body["hyperparameters"]["training_steps"], 1);

        let saved: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&output).unwrap()).unwrap();
        assert_eq!(saved["fine_tuned_model_id"], "ft:open-mistral-7b:abc123");
    }

    #[tokio::test]
    async fn test_run_aborts_when_connectivity_fails() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = write_dataset(dir.path());

        let transport = Arc::new(MockTransport::new());
        transport.enqueue_response(MockResponse::error(401, "bad key"));

        let client = mock_client(Arc::clone(&transport));
        let workflow = FineTuneWorkflow::new(&client, fast_options());

        let result = workflow.run(&dataset).await;

        assert!(result.is_err());
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_run_rejects_invalid_dataset_before_any_request() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = dir.path().join("fine_tuning_data.jsonl");
        std::fs::write(&dataset, "not json\n").unwrap();

        let transport = Arc::new(MockTransport::new());
        let client = mock_client(Arc::clone(&transport));
        let workflow = FineTuneWorkflow::new(&client, fast_options());

        let result = workflow.run(&dataset).await;

        assert!(matches!(result, Err(RunnerError::Dataset { .. })));
        assert_eq!(transport.request_count(), 0);
    }
}
