//! Submit command implementation.
//!
//! Submits inline code, a Python script or a shell command to Torque or LSF.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use console::style;

use hpcsub_sched::{BatchSubmitter, DryRunSubmitter, SubmissionReport};

use super::common::{JobArgs, scheduler_config};

/// What the job runs.
pub enum JobPayload<'a> {
    Code { code: &'a str, args: &'a str },
    Script { path: &'a Path, args: &'a str },
    Command(&'a str),
}

impl JobPayload<'_> {
    fn describe(&self) -> String {
        match self {
            JobPayload::Code { .. } => "inline code".to_string(),
            JobPayload::Script { path, .. } => path.display().to_string(),
            JobPayload::Command(command) => format!("`{command}`"),
        }
    }
}

/// Execute a submission command.
pub async fn execute(
    payload: JobPayload<'_>,
    job: &JobArgs,
    platform: &str,
    submit_program: Option<&str>,
) -> Result<()> {
    let config = scheduler_config(platform, submit_program)?;
    let params = job.queue_args.queue_params()?;
    tracing::debug!(?config, "Resolved scheduler configuration");
    tracing::debug!(?params, "Merged queue parameters");

    println!(
        "{} Submitting {} to {} via {}",
        style("→").cyan().bold(),
        style(payload.describe()).green(),
        style(config.platform).magenta(),
        style(config.submit_program()).yellow()
    );

    let mut submitter = BatchSubmitter::new(config);
    if job.dry_run {
        tracing::info!("Dry run, recording the submission instead of running it");
        submitter = submitter.with_submitter(Arc::new(DryRunSubmitter::new()));
    }

    let output = job.output.as_path();
    let report = match payload {
        JobPayload::Code { code, args } => submitter
            .submit_code(code, output, args, &params)
            .await
            .context("Failed to submit code")?,
        JobPayload::Script { path, args } => submitter
            .submit_script(path, output, args, &params)
            .await
            .with_context(|| format!("Failed to submit script {}", path.display()))?,
        JobPayload::Command(command) => submitter
            .submit_raw_command(command, output, &params)
            .await
            .context("Failed to submit command")?,
    };

    print_report(&report, job.dry_run)
}

fn print_report(report: &SubmissionReport, dry_run: bool) -> Result<()> {
    if let Some(payload) = &report.payload {
        let note = if payload.copied { "" } else { " (existing copy kept)" };
        println!(
            "  Payload: {}{}",
            style(payload.path.display()).dim(),
            style(note).yellow()
        );
    }
    println!("  Script:  {}", style(report.script_path.display()).dim());

    if dry_run {
        let script = std::fs::read_to_string(&report.script_path).with_context(|| {
            format!("Failed to read back {}", report.script_path.display())
        })?;
        println!();
        print!("{script}");
        println!();
        println!("{} Dry run, nothing submitted", style("✓").green().bold());
        return Ok(());
    }

    let stdout = report.outcome.stdout.trim();
    if !stdout.is_empty() {
        println!("  {stdout}");
    }

    match report.outcome.job_id() {
        Some(job_id) => println!(
            "{} Submitted as job {}",
            style("✓").green().bold(),
            style(job_id).cyan()
        ),
        None => println!(
            "{} Submitted (exit code {})",
            style("✓").green().bold(),
            report.exit_code()
        ),
    }

    Ok(())
}
