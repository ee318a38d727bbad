//! Handing the rendered script to the scheduler.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{SchedError, SchedResult};

/// Exit status and output of a submission command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl SubmissionOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Job id printed by the scheduler, if the output looks familiar.
    ///
    /// - Torque/PBS: `12345.server.domain`
    /// - LSF: `Job <12345> is submitted to queue <normal>.`
    pub fn job_id(&self) -> Option<String> {
        parse_job_id(&self.stdout)
    }
}

fn parse_job_id(output: &str) -> Option<String> {
    let trimmed = output.trim();

    if let Some(rest) = trimmed.strip_prefix("Job <") {
        let end = rest.find('>')?;
        let id = &rest[..end];
        if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) {
            return Some(id.to_string());
        }
        return None;
    }

    let first = trimmed.lines().next()?.trim();
    let number = first.split('.').next()?;
    if !number.is_empty() && number.chars().all(|c| c.is_ascii_digit()) {
        return Some(first.to_string());
    }
    None
}

/// Runs a submission program on a rendered script.
#[async_trait]
pub trait Submitter: Send + Sync {
    /// Submit `script`, returning the program's exit status and output.
    ///
    /// A non-zero exit is reported as [`SchedError::Submission`].
    async fn submit(&self, program: &str, script: &Path) -> SchedResult<SubmissionOutcome>;
}

/// Runs `sh -c "<program> < <script>"` and waits for it to return.
#[derive(Debug, Clone)]
pub struct ShellSubmitter {
    shell: String,
}

impl Default for ShellSubmitter {
    fn default() -> Self {
        Self {
            shell: "sh".to_string(),
        }
    }
}

impl ShellSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different shell binary.
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }
}

/// The shell command line that submits `script` through `program`.
pub fn submit_command_line(program: &str, script: &Path) -> String {
    format!("{program} < {}", shell_quote(&script.display().to_string()))
}

fn shell_quote(value: &str) -> String {
    if value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "/._-+=:,@%".contains(c))
    {
        return value.to_string();
    }
    format!("'{}'", value.replace('\'', r"'\''"))
}

#[async_trait]
impl Submitter for ShellSubmitter {
    async fn submit(&self, program: &str, script: &Path) -> SchedResult<SubmissionOutcome> {
        let command_line = submit_command_line(program, script);
        tracing::debug!("Running `{}` via {}", command_line, self.shell);

        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(&command_line)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| SchedError::Submission {
                command: command_line.clone(),
                exit_code: None,
                stderr: e.to_string(),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        // None means the child was killed by a signal
        let Some(exit_code) = output.status.code() else {
            return Err(SchedError::Submission {
                command: command_line,
                exit_code: None,
                stderr,
            });
        };

        if exit_code != 0 {
            tracing::warn!("`{}` exited with status {}", command_line, exit_code);
            return Err(SchedError::Submission {
                command: command_line,
                exit_code: Some(exit_code),
                stderr,
            });
        }

        Ok(SubmissionOutcome {
            exit_code,
            stdout,
            stderr,
        })
    }
}

/// Records submissions instead of running anything.
///
/// Every call succeeds with exit code 0 and empty output.
#[derive(Debug, Default)]
pub struct DryRunSubmitter {
    submitted: Mutex<Vec<(String, PathBuf)>>,
}

impl DryRunSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(program, script)` pairs seen so far, oldest first.
    pub fn submitted(&self) -> Vec<(String, PathBuf)> {
        self.submitted
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

#[async_trait]
impl Submitter for DryRunSubmitter {
    async fn submit(&self, program: &str, script: &Path) -> SchedResult<SubmissionOutcome> {
        tracing::info!(
            "Dry run, not submitting `{}`",
            submit_command_line(program, script)
        );
        let mut submitted = self
            .submitted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        submitted.push((program.to_string(), script.to_path_buf()));

        Ok(SubmissionOutcome {
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
        })
    }
}
