//! Shared helpers for CLI commands.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use hpcsub_sched::{QueueParameters, SchedulerConfig};

/// Job options shared by every submission command.
#[derive(Args, Debug, Clone)]
pub struct JobArgs {
    /// Output directory; files go to <OUTPUT>/hpc_files
    #[arg(short, long)]
    pub output: PathBuf,

    #[command(flatten)]
    pub queue_args: QueueArgs,

    /// Write all files but do not call the scheduler
    #[arg(long)]
    pub dry_run: bool,
}

/// Options of the `render` command.
#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    /// Output directory the log paths point into
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,

    #[command(flatten)]
    pub queue_args: QueueArgs,
}

/// Queue parameter flags.
#[derive(Args, Debug, Clone, Default)]
pub struct QueueArgs {
    /// Job name [default: job]
    #[arg(short = 'N', long)]
    pub job_name: Option<String>,

    /// Queue name [default: compute]
    #[arg(short, long)]
    pub queue: Option<String>,

    /// Environment activated before the job runs [default: base]
    #[arg(short, long = "env")]
    pub environment: Option<String>,

    /// Number of nodes [default: 1]
    #[arg(long)]
    pub nodes: Option<u32>,

    /// Cores per node [default: 1]
    #[arg(long)]
    pub ppn: Option<u32>,

    /// Wall time limit, HH:MM:SS [default: 10:00:00]
    #[arg(short, long)]
    pub walltime: Option<String>,

    /// Requested memory [default: 4GB]
    #[arg(long)]
    pub mem: Option<String>,

    /// Memory limit [default: 8GB]
    #[arg(long)]
    pub max_mem: Option<String>,

    /// Stdout log file name inside hpc_files/logs
    #[arg(long)]
    pub log_file: Option<String>,

    /// Stderr log file name inside hpc_files/logs
    #[arg(long)]
    pub error_file: Option<String>,

    /// YAML file with queue parameters; flags take precedence
    #[arg(long)]
    pub params: Option<PathBuf>,
}

impl QueueArgs {
    /// Queue parameters given as flags.
    pub fn flag_params(&self) -> QueueParameters {
        QueueParameters {
            job_name: self.job_name.clone(),
            queue_name: self.queue.clone(),
            environment_name: self.environment.clone(),
            node_count: self.nodes,
            cores_per_node: self.ppn,
            walltime: self.walltime.clone(),
            requested_memory: self.mem.clone(),
            max_memory: self.max_mem.clone(),
            log_file: self.log_file.clone(),
            error_file: self.error_file.clone(),
        }
    }

    /// Parameters from `--params` overlaid with the flags.
    pub fn queue_params(&self) -> Result<QueueParameters> {
        let base = match &self.params {
            Some(path) => load_params_file(path)?,
            None => QueueParameters::default(),
        };
        Ok(base.merge(self.flag_params()))
    }
}

/// Load queue parameters from a YAML file.
pub fn load_params_file(path: &Path) -> Result<QueueParameters> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read parameter file: {}", path.display()))?;

    if source.trim().is_empty() {
        return Ok(QueueParameters::default());
    }

    serde_yaml_ng::from_str(&source)
        .with_context(|| format!("Invalid parameter file: {}", path.display()))
}

/// Build the scheduler configuration from global flags.
pub fn scheduler_config(platform: &str, submit_program: Option<&str>) -> Result<SchedulerConfig> {
    let mut config = SchedulerConfig::default();
    config.configure(platform)?;
    if let Some(program) = submit_program.filter(|p| !p.trim().is_empty()) {
        config = config.with_submit_program(program);
    }
    Ok(config)
}
