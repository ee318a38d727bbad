//! Scheduler configuration and the submission pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;

use crate::error::{SchedError, SchedResult, Stage};
use crate::layout::{OutputLocation, ensure_layout};
use crate::params::{QueueParameters, ResolvedParameters};
use crate::payload::{
    CleanupHook, MaterializedPayload, NoopCleanup, check_script_source, materialize_from_code,
    materialize_from_script,
};
use crate::platform::{Platform, PlatformProfile};
use crate::submitter::{ShellSubmitter, SubmissionOutcome, Submitter};
use crate::templates;

/// Environment variable selecting the platform in [`SchedulerConfig::from_env`].
pub const PLATFORM_ENV: &str = "HPCSUB_PLATFORM";

/// Environment variable overriding the submission program.
pub const SUBMIT_PROGRAM_ENV: &str = "HPCSUB_SUBMIT_PROGRAM";

/// Configuration for submitting jobs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Target batch scheduler.
    pub platform: Platform,

    /// Program fed the script on stdin; `qsub`/`bsub` when unset.
    pub submit_program: Option<String>,
}

impl SchedulerConfig {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            submit_program: None,
        }
    }

    /// Create a configuration for Torque/PBS.
    pub fn torque() -> Self {
        Self::new(Platform::Torque)
    }

    /// Create a configuration for LSF.
    pub fn lsf() -> Self {
        Self::new(Platform::Lsf)
    }

    pub fn with_submit_program(mut self, program: impl Into<String>) -> Self {
        self.submit_program = Some(program.into());
        self
    }

    /// Read [`PLATFORM_ENV`] and [`SUBMIT_PROGRAM_ENV`].
    pub fn from_env() -> SchedResult<Self> {
        Self::from_values(
            std::env::var(PLATFORM_ENV).ok(),
            std::env::var(SUBMIT_PROGRAM_ENV).ok(),
        )
    }

    fn from_values(platform: Option<String>, program: Option<String>) -> SchedResult<Self> {
        let mut config = Self::default();
        if let Some(platform) = platform {
            config.configure(&platform)?;
        }
        config.submit_program = program.filter(|p| !p.trim().is_empty());
        Ok(config)
    }

    /// Switch to the platform named `platform_id`.
    ///
    /// On an unknown identifier the current platform is kept.
    pub fn configure(&mut self, platform_id: &str) -> SchedResult<()> {
        self.platform = platform_id.parse()?;
        Ok(())
    }

    pub fn profile(&self) -> PlatformProfile {
        self.platform.profile()
    }

    /// Program the rendered script is piped into.
    pub fn submit_program(&self) -> &str {
        self.submit_program
            .as_deref()
            .unwrap_or(self.platform.profile().submit_program)
    }
}

/// Result of one submission call.
#[derive(Debug, Clone)]
pub struct SubmissionReport {
    pub location: OutputLocation,
    /// The rendered `hpc_file.qsub` / `hpc_file.bsub`.
    pub script_path: PathBuf,
    /// Materialized payload, absent for raw commands.
    pub payload: Option<MaterializedPayload>,
    pub outcome: SubmissionOutcome,
}

impl SubmissionReport {
    pub fn exit_code(&self) -> i32 {
        self.outcome.exit_code
    }
}

/// Prepares output directories, renders scripts and submits them.
///
/// The configuration is fixed per instance; one instance can submit any
/// number of jobs. Concurrent jobs must use distinct output paths since
/// files inside one `hpc_files` directory are not locked.
pub struct BatchSubmitter {
    config: SchedulerConfig,
    profile: PlatformProfile,
    submitter: Arc<dyn Submitter>,
    cleanup: Arc<dyn CleanupHook>,
}

impl BatchSubmitter {
    /// Submitter that shells out to the platform's program.
    pub fn new(config: SchedulerConfig) -> Self {
        let profile = config.profile();
        Self {
            config,
            profile,
            submitter: Arc::new(ShellSubmitter::new()),
            cleanup: Arc::new(NoopCleanup),
        }
    }

    pub fn with_submitter(mut self, submitter: Arc<dyn Submitter>) -> Self {
        self.submitter = submitter;
        self
    }

    /// Replace the epilogue appended to inline code.
    pub fn with_cleanup(mut self, cleanup: Arc<dyn CleanupHook>) -> Self {
        self.cleanup = cleanup;
        self
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn profile(&self) -> &PlatformProfile {
        &self.profile
    }

    /// Switch platforms. The previous profile stays active on error.
    pub fn configure(&mut self, platform_id: &str) -> SchedResult<()> {
        self.config.configure(platform_id)?;
        self.profile = self.config.profile();
        Ok(())
    }

    /// Submit inline Python code.
    ///
    /// The code is written to `hpc_files/job_script.py` (always overwritten)
    /// followed by the cleanup epilogue and run as
    /// `python <job_script.py> <script_arguments>`.
    pub async fn submit_code(
        &self,
        code: &str,
        output_path: impl AsRef<Path>,
        script_arguments: &str,
        params: &QueueParameters,
    ) -> SchedResult<SubmissionReport> {
        let resolved = params.resolve(&self.profile)?;
        let location = ensure_layout(output_path).await?;
        let payload = materialize_from_code(code, &location, self.cleanup.as_ref()).await?;
        let command = payload.command(script_arguments);

        self.finish(location, &resolved, &command, Some(payload))
            .await
    }

    /// Submit an existing Python script.
    ///
    /// The script is copied to `hpc_files/job_script.py` only if that file is
    /// not there yet; an earlier copy is reused as is.
    pub async fn submit_script(
        &self,
        script_path: impl AsRef<Path>,
        output_path: impl AsRef<Path>,
        script_arguments: &str,
        params: &QueueParameters,
    ) -> SchedResult<SubmissionReport> {
        let script_path = script_path.as_ref();

        // nothing may be created for a job whose payload is missing
        check_script_source(script_path).await?;
        let resolved = params.resolve(&self.profile)?;

        let location = ensure_layout(output_path).await?;
        let payload = materialize_from_script(script_path, &location).await?;
        let command = payload.command(script_arguments);

        self.finish(location, &resolved, &command, Some(payload))
            .await
    }

    /// Submit `command` as the job body without materializing a payload.
    pub async fn submit_raw_command(
        &self,
        command: &str,
        output_path: impl AsRef<Path>,
        params: &QueueParameters,
    ) -> SchedResult<SubmissionReport> {
        if command.trim().is_empty() {
            return Err(SchedError::MissingParameter { field: "command" });
        }
        let resolved = params.resolve(&self.profile)?;
        let location = ensure_layout(output_path).await?;

        self.finish(location, &resolved, command, None).await
    }

    /// Render the submission script for `command` without touching disk.
    pub fn render(
        &self,
        output_path: impl AsRef<Path>,
        command: &str,
        params: &QueueParameters,
    ) -> SchedResult<String> {
        let resolved = params.resolve(&self.profile)?;
        let location = OutputLocation::for_output(output_path);
        Ok(templates::render_script(
            &self.profile,
            &resolved,
            &location.logs_dir(),
            command,
        ))
    }

    async fn finish(
        &self,
        location: OutputLocation,
        params: &ResolvedParameters,
        command: &str,
        payload: Option<MaterializedPayload>,
    ) -> SchedResult<SubmissionReport> {
        let script =
            templates::render_script(&self.profile, params, &location.logs_dir(), command);
        let script_path = location.submission_file(&self.profile);

        fs::write(&script_path, script)
            .await
            .map_err(|e| SchedError::io(Stage::Render, &script_path, e))?;
        tracing::debug!("Wrote submission script {}", script_path.display());

        let outcome = self
            .submitter
            .submit(self.config.submit_program(), &script_path)
            .await?;

        match outcome.job_id() {
            Some(job_id) => tracing::info!(
                "Submitted {} to {} as job {}",
                params.job_name,
                self.profile.platform,
                job_id
            ),
            None => tracing::info!("Submitted {} to {}", params.job_name, self.profile.platform),
        }

        Ok(SubmissionReport {
            location,
            script_path,
            payload,
            outcome,
        })
    }
}
