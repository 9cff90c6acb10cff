//! Fine-tuning job types.

use serde::{Deserialize, Serialize};

/// Fine-tuning job status.
///
/// Jobs move from `Queued` through the intermediate states to exactly one of
/// the terminal outcomes; there is no transition back out of a terminal
/// status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Job is queued.
    Queued,
    /// Job is started.
    Started,
    /// Job is validating.
    Validating,
    /// Job has validated.
    Validated,
    /// Job is running.
    Running,
    /// Job failed validation.
    FailedValidation,
    /// Job failed.
    Failed,
    /// Job succeeded.
    Success,
    /// Job was cancelled.
    Cancelled,
    /// Job is cancelling.
    Cancelling,
}

impl JobStatus {
    /// Returns true once the job has reached a finished state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Success | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

/// Hyperparameters for a fine-tuning job.
#[derive(Debug, Clone, Serialize)]
pub struct Hyperparameters {
    /// Learning rate multiplier.
    pub learning_rate_multiplier: f64,
    /// Batch size.
    pub batch_size: u32,
    /// Number of training steps; filled in after the dry run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub training_steps: Option<u32>,
}

/// Fine-tuning job creation request.
#[derive(Debug, Clone, Serialize)]
pub struct CreateJobRequest {
    /// Base model to fine-tune.
    pub model: String,
    /// Training file IDs.
    pub training_files: Vec<String>,
    /// Hyperparameters.
    pub hyperparameters: Hyperparameters,
    /// Suffix for the fine-tuned model name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    /// When set, the service estimates the job instead of starting it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
}

fn default_n_epochs() -> f64 {
    1.0
}

fn default_n_train_tokens() -> u64 {
    1000
}

/// Estimate returned by a dry-run submission.
#[derive(Debug, Clone, Deserialize)]
pub struct DryRunEstimate {
    /// Estimated number of epochs over the dataset.
    #[serde(default = "default_n_epochs")]
    pub n_epochs: f64,
    /// Estimated number of training tokens.
    #[serde(default = "default_n_train_tokens")]
    pub n_train_tokens: u64,
}

/// Progress of a running job.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobProgress {
    /// Completion percentage, 0-100.
    #[serde(default)]
    pub percentage_complete: f64,
}

/// A fine-tuning job as reported by the service.
#[derive(Debug, Clone, Deserialize)]
pub struct FineTuningJob {
    /// Job ID.
    pub id: String,
    /// Job status.
    pub status: JobStatus,
    /// Base model.
    #[serde(default)]
    pub model: Option<String>,
    /// Training files.
    #[serde(default)]
    pub training_files: Vec<String>,
    /// Fine-tuned model name, present on success.
    #[serde(default)]
    pub fine_tuned_model: Option<String>,
    /// Progress information.
    #[serde(default)]
    pub progress: Option<JobProgress>,
    /// Creation timestamp.
    #[serde(default)]
    pub created_at: Option<i64>,
    /// Modification timestamp.
    #[serde(default)]
    pub modified_at: Option<i64>,
}

impl FineTuningJob {
    /// Completion percentage, defaulting to 0 when the service omits it.
    pub fn progress_percentage(&self) -> f64 {
        self.progress
            .as_ref()
            .map(|p| p.percentage_complete)
            .unwrap_or(0.0)
    }
}
