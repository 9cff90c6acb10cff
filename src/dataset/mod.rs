//! Dataset validation and discovery.
//!
//! A dataset is a line-delimited JSON file where every line carries a
//! `messages` array of `{role, content}` objects. Validation is a gate, not
//! a transform: bad lines are skipped with a diagnostic and the original
//! file is what gets uploaded.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::errors::{RunnerError, RunnerResult};
use crate::types::common::Role;

/// A diagnostic for one skipped line.
#[derive(Debug, Clone)]
pub struct LineDiagnostic {
    /// 1-based line number.
    pub line: usize,
    /// Why the line was skipped.
    pub reason: String,
}

impl fmt::Display for LineDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.reason)
    }
}

/// Result of validating a dataset file.
#[derive(Debug, Clone)]
pub struct DatasetReport {
    /// The validated file, unchanged.
    pub path: PathBuf,
    /// Number of structurally valid records.
    pub valid_records: usize,
    /// One diagnostic per skipped line.
    pub diagnostics: Vec<LineDiagnostic>,
}

/// Validates a JSONL dataset file line by line.
///
/// Malformed lines are skipped with a diagnostic; the call only fails when
/// the file cannot be read or when zero records survive.
pub fn validate_file(path: &Path) -> RunnerResult<DatasetReport> {
    info!(path = %path.display(), "validating dataset file");

    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut valid_records = 0;
    let mut diagnostics = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let number = index + 1;

        match check_record(&line) {
            Ok(()) => valid_records += 1,
            Err(reason) => {
                warn!(line = number, %reason, "skipping invalid record");
                diagnostics.push(LineDiagnostic {
                    line: number,
                    reason,
                });
            }
        }
    }

    if valid_records == 0 {
        return Err(RunnerError::Dataset {
            message: format!("no valid records found in {}", path.display()),
        });
    }

    info!(
        records = valid_records,
        skipped = diagnostics.len(),
        "dataset file validated",
    );

    Ok(DatasetReport {
        path: path.to_path_buf(),
        valid_records,
        diagnostics,
    })
}

/// Checks a single line. Any invalid message invalidates the whole record.
fn check_record(line: &str) -> Result<(), String> {
    let value: serde_json::Value =
        serde_json::from_str(line).map_err(|_| "invalid JSON".to_string())?;

    let messages = value
        .get("messages")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| "missing or invalid 'messages' field".to_string())?;

    for message in messages {
        if message.get("content").is_none() {
            return Err("message missing 'content'".to_string());
        }
        let role = message
            .get("role")
            .ok_or_else(|| "message missing 'role'".to_string())?;
        if serde_json::from_value::<Role>(role.clone()).is_err() {
            return Err(format!("invalid role {}", role));
        }
    }

    Ok(())
}

/// Finds a `.jsonl` dataset in `dir` whose filename contains `hint`.
pub fn locate_dataset(dir: &Path, hint: &str) -> RunnerResult<PathBuf> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.contains(hint) && name.ends_with(".jsonl") {
            info!(file = %name, "found dataset file");
            return Ok(entry.path());
        }
    }

    Err(RunnerError::Dataset {
        message: format!(
            "no .jsonl file containing '{}' found in {}",
            hint,
            dir.display()
        ),
    })
}
