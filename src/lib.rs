//! Fine-Tuning Workflow Runner
//!
//! Drives a hosted fine-tuning API end to end: validate a local JSONL chat
//! dataset, upload it, size the job with a dry run, submit it, poll until a
//! terminal status, then smoke-test the resulting model and persist its id.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use finetune_runner::{FineTuneWorkflow, RunnerClient, WorkflowOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RunnerClient::from_api_key("your-api-key")?;
//!     let workflow = FineTuneWorkflow::new(&client, WorkflowOptions::default());
//!
//!     let outcome = workflow.run("fine_tuning_data.jsonl".as_ref()).await?;
//!     if let Some(model) = outcome.fine_tuned_model {
//!         println!("fine-tuned model: {}", model);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod client;
pub mod config;
pub mod dataset;
pub mod errors;
pub mod services;
pub mod transport;
pub mod types;
pub mod workflow;

// Re-exports for convenience
pub use client::{RunnerClient, RunnerClientBuilder};
pub use config::RunnerConfig;
pub use errors::{RunnerError, RunnerResult};
pub use workflow::{
    compute_training_steps, FineTuneWorkflow, TrainingPlan, WorkflowOptions, WorkflowOutcome,
};

// Type re-exports
pub use types::chat::{ChatCompletionRequest, ChatCompletionResponse, Message};
pub use types::common::Role;
pub use types::files::{FileObject, FilePurpose, FileUploadRequest};
pub use types::fine_tuning::{
    CreateJobRequest, DryRunEstimate, FineTuningJob, Hyperparameters, JobStatus,
};
pub use types::models::{Model, ModelListResponse};

/// Mock implementations for testing.
#[cfg(any(test, feature = "mocks"))]
pub mod mocks;
