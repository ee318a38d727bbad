//! Error handling for script generation and submission.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for submission operations.
pub type SchedResult<T> = Result<T, SchedError>;

/// Pipeline stage an I/O failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Creating the output directory tree.
    Layout,
    /// Writing or copying the job payload.
    Payload,
    /// Writing the rendered submission file.
    Render,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Layout => "output layout",
            Stage::Payload => "payload",
            Stage::Render => "submission script",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while preparing or submitting a job.
#[derive(Error, Debug)]
pub enum SchedError {
    /// Unknown platform identifier.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A required template field is empty after defaults were applied.
    #[error("Missing parameter: {field}")]
    MissingParameter { field: &'static str },

    /// A parameter is present but not usable in a directive.
    #[error("Invalid parameter {field}: {reason}")]
    InvalidParameter { field: &'static str, reason: String },

    /// The job payload could not be located.
    #[error("Payload error for {}: {message}", path.display())]
    Payload { path: PathBuf, message: String },

    /// The submission command failed to spawn or exited non-zero.
    #[error("Submission failed: {command} exited with {}{}", fmt_exit_code(*exit_code), fmt_stderr(stderr))]
    Submission {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// Filesystem failure with the offending path attached.
    #[error("IO error in {stage} stage at {}: {source}", path.display())]
    Io {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SchedError {
    /// Wrap an I/O error with the stage and path it occurred at.
    pub fn io(stage: Stage, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SchedError::Io {
            stage,
            path: path.into(),
            source,
        }
    }

    /// Exit code of a failed submission, if the child ran at all.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            SchedError::Submission { exit_code, .. } => *exit_code,
            _ => None,
        }
    }
}

fn fmt_exit_code(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status".to_string(),
    }
}

fn fmt_stderr(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}
