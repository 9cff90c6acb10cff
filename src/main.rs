//! Fine-tuning workflow runner CLI.
//!
//! Validates a JSONL chat dataset, uploads it, submits and monitors a
//! fine-tuning job, then smoke-tests the resulting model and saves its id.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};

use finetune_runner::workflow::{DEFAULT_OUTPUT_FILE, DEFAULT_TEST_PROMPT};
use finetune_runner::{
    dataset, FineTuneWorkflow, RunnerClient, RunnerConfig, TrainingPlan, WorkflowOptions,
    WorkflowOutcome,
};

/// Run a fine-tuning job end to end: validate, upload, submit, monitor, test.
#[derive(Parser, Debug)]
#[command(name = "finetune-runner", version, about)]
struct Args {
    /// Dataset file (.jsonl). When omitted, the current directory is
    /// searched for a .jsonl file whose name contains the dataset hint.
    dataset: Option<PathBuf>,

    /// Substring used to discover the dataset file when no path is given.
    #[arg(long, default_value = "fine_tuning_data")]
    dataset_hint: String,

    /// Base model to fine-tune.
    #[arg(long, default_value = "open-mistral-7b")]
    model: String,

    /// Suffix for the fine-tuned model name.
    #[arg(long)]
    suffix: Option<String>,

    /// API base URL (defaults to the hosted service).
    #[arg(long)]
    base_url: Option<String>,

    /// Seconds between job status checks.
    #[arg(long, default_value_t = 60)]
    poll_interval: u64,

    /// Maximum seconds to wait for the job before cancelling it.
    /// Unbounded when omitted.
    #[arg(long)]
    deadline: Option<u64>,

    /// Where to write the fine-tuned model info on success.
    #[arg(long, default_value = DEFAULT_OUTPUT_FILE)]
    output: PathBuf,

    /// Prompt sent to the fine-tuned model as a smoke test.
    #[arg(long, default_value = DEFAULT_TEST_PROMPT)]
    test_prompt: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn init_tracing(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow!("failed to initialise logging: {}", e))
}

/// Reads the API key from the environment, or prompts for it.
fn acquire_api_key() -> Result<String> {
    if let Ok(key) = std::env::var("MISTRAL_API_KEY") {
        if !key.is_empty() {
            return Ok(key);
        }
    }

    print!("Enter your Mistral AI API key: ");
    io::stdout().flush()?;
    let key = rpassword::read_password().context("failed to read API key")?;

    if key.is_empty() {
        return Err(anyhow!("no API key provided"));
    }
    Ok(key)
}

async fn run(args: Args) -> Result<WorkflowOutcome> {
    let api_key = acquire_api_key()?;

    let mut config_builder = RunnerConfig::builder().api_key(api_key);
    if let Some(base_url) = args.base_url {
        config_builder = config_builder.base_url(base_url);
    }
    let config = config_builder.build()?;
    let client = RunnerClient::new(config)?;

    let dataset_path = match args.dataset {
        Some(path) => path,
        None => dataset::locate_dataset(Path::new("."), &args.dataset_hint)?,
    };

    let options = WorkflowOptions {
        plan: TrainingPlan {
            model: args.model,
            suffix: args.suffix,
            ..TrainingPlan::default()
        },
        poll_interval: Duration::from_secs(args.poll_interval),
        poll_deadline: args.deadline.map(Duration::from_secs),
        test_prompt: args.test_prompt,
        output_path: args.output,
        ..WorkflowOptions::default()
    };

    let workflow = FineTuneWorkflow::new(&client, options);
    let outcome = workflow.run(&dataset_path).await?;
    Ok(outcome)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_tracing(&args.log_level) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    let code = match run(args).await {
        Ok(outcome) if outcome.succeeded() => ExitCode::SUCCESS,
        Ok(outcome) => {
            error!(status = ?outcome.job.status, "run finished without a fine-tuned model");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("an error occurred: {:#}", e);
            ExitCode::FAILURE
        }
    };

    info!("process completed");
    code
}
