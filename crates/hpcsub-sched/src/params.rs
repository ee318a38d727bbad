//! Queue parameters and their published defaults.

use serde::{Deserialize, Serialize};

use crate::error::{SchedError, SchedResult};
use crate::platform::PlatformProfile;

pub const DEFAULT_QUEUE_NAME: &str = "compute";
pub const DEFAULT_JOB_NAME: &str = "job";
pub const DEFAULT_ENVIRONMENT_NAME: &str = "base";
pub const DEFAULT_NODE_COUNT: u32 = 1;
pub const DEFAULT_CORES_PER_NODE: u32 = 1;
pub const DEFAULT_WALLTIME: &str = "10:00:00";
pub const DEFAULT_REQUESTED_MEMORY: &str = "4GB";
pub const DEFAULT_MAX_MEMORY: &str = "8GB";

/// Caller-supplied queue parameters.
///
/// Every field is optional. Unset fields fall back to the defaults above when
/// the parameters are resolved; log file names default to the platform's job
/// id placeholder (`$PBS_JOBID.output`, `%J.error`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueueParameters {
    pub job_name: Option<String>,
    pub queue_name: Option<String>,
    pub environment_name: Option<String>,
    pub node_count: Option<u32>,
    pub cores_per_node: Option<u32>,
    /// Wall clock limit, `HH:MM:SS`.
    pub walltime: Option<String>,
    pub requested_memory: Option<String>,
    pub max_memory: Option<String>,
    /// Stdout file name inside `hpc_files/logs`.
    pub log_file: Option<String>,
    /// Stderr file name inside `hpc_files/logs`.
    pub error_file: Option<String>,
}

impl QueueParameters {
    /// Empty parameter set; everything resolves to defaults.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_job_name(mut self, name: impl Into<String>) -> Self {
        self.job_name = Some(name.into());
        self
    }

    pub fn with_queue(mut self, queue: impl Into<String>) -> Self {
        self.queue_name = Some(queue.into());
        self
    }

    pub fn with_environment(mut self, env: impl Into<String>) -> Self {
        self.environment_name = Some(env.into());
        self
    }

    pub fn with_nodes(mut self, nodes: u32) -> Self {
        self.node_count = Some(nodes);
        self
    }

    pub fn with_cores_per_node(mut self, cores: u32) -> Self {
        self.cores_per_node = Some(cores);
        self
    }

    pub fn with_walltime(mut self, walltime: impl Into<String>) -> Self {
        self.walltime = Some(walltime.into());
        self
    }

    /// Set requested and maximum memory.
    pub fn with_memory(mut self, requested: impl Into<String>, max: impl Into<String>) -> Self {
        self.requested_memory = Some(requested.into());
        self.max_memory = Some(max.into());
        self
    }

    pub fn with_log_files(mut self, log: impl Into<String>, error: impl Into<String>) -> Self {
        self.log_file = Some(log.into());
        self.error_file = Some(error.into());
        self
    }

    /// Overlay `overrides` on top of `self`, field by field.
    ///
    /// A field set in `overrides` wins; otherwise the value from `self` is kept.
    pub fn merge(self, overrides: QueueParameters) -> QueueParameters {
        QueueParameters {
            job_name: overrides.job_name.or(self.job_name),
            queue_name: overrides.queue_name.or(self.queue_name),
            environment_name: overrides.environment_name.or(self.environment_name),
            node_count: overrides.node_count.or(self.node_count),
            cores_per_node: overrides.cores_per_node.or(self.cores_per_node),
            walltime: overrides.walltime.or(self.walltime),
            requested_memory: overrides.requested_memory.or(self.requested_memory),
            max_memory: overrides.max_memory.or(self.max_memory),
            log_file: overrides.log_file.or(self.log_file),
            error_file: overrides.error_file.or(self.error_file),
        }
    }

    /// Apply defaults and validate against the given platform.
    pub fn resolve(&self, profile: &PlatformProfile) -> SchedResult<ResolvedParameters> {
        let text = |value: &Option<String>, default: &str, field: &'static str| {
            let value = value.as_deref().unwrap_or(default);
            if value.trim().is_empty() {
                Err(SchedError::MissingParameter { field })
            } else {
                Ok(value.to_string())
            }
        };

        let node_count = positive(self.node_count.unwrap_or(DEFAULT_NODE_COUNT), "node_count")?;
        let cores_per_node = positive(
            self.cores_per_node.unwrap_or(DEFAULT_CORES_PER_NODE),
            "cores_per_node",
        )?;

        let walltime = text(&self.walltime, DEFAULT_WALLTIME, "walltime")?;
        validate_walltime(&walltime)?;

        Ok(ResolvedParameters {
            job_name: text(&self.job_name, DEFAULT_JOB_NAME, "job_name")?,
            queue_name: text(&self.queue_name, DEFAULT_QUEUE_NAME, "queue_name")?,
            environment_name: text(
                &self.environment_name,
                DEFAULT_ENVIRONMENT_NAME,
                "environment_name",
            )?,
            node_count,
            cores_per_node,
            walltime,
            requested_memory: text(
                &self.requested_memory,
                DEFAULT_REQUESTED_MEMORY,
                "requested_memory",
            )?,
            max_memory: text(&self.max_memory, DEFAULT_MAX_MEMORY, "max_memory")?,
            log_file: text(&self.log_file, &profile.default_log_file(), "log_file")?,
            error_file: text(&self.error_file, &profile.default_error_file(), "error_file")?,
        })
    }
}

/// Fully resolved parameters, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedParameters {
    pub job_name: String,
    pub queue_name: String,
    pub environment_name: String,
    pub node_count: u32,
    pub cores_per_node: u32,
    pub walltime: String,
    pub requested_memory: String,
    pub max_memory: String,
    pub log_file: String,
    pub error_file: String,
}

impl ResolvedParameters {
    /// Total cores across all nodes. LSF's `-n` takes this value.
    pub fn total_cores(&self) -> u64 {
        u64::from(self.node_count) * u64::from(self.cores_per_node)
    }
}

fn positive(value: u32, field: &'static str) -> SchedResult<u32> {
    if value == 0 {
        return Err(SchedError::InvalidParameter {
            field,
            reason: "must be a positive integer".to_string(),
        });
    }
    Ok(value)
}

/// Check a walltime of the form `HH:MM:SS`.
///
/// Hours may exceed 24 and use more than two digits; minutes and seconds must
/// be two digits below 60.
pub fn validate_walltime(walltime: &str) -> SchedResult<()> {
    let invalid = || SchedError::InvalidParameter {
        field: "walltime",
        reason: format!("'{walltime}' is not of the form HH:MM:SS"),
    };

    let parts: Vec<&str> = walltime.split(':').collect();
    if parts.len() != 3 {
        return Err(invalid());
    }
    if parts
        .iter()
        .any(|p| p.is_empty() || !p.chars().all(|c| c.is_ascii_digit()))
    {
        return Err(invalid());
    }
    for part in &parts[1..] {
        let value: u32 = part.parse().map_err(|_| invalid())?;
        if part.len() != 2 || value >= 60 {
            return Err(invalid());
        }
    }
    Ok(())
}
