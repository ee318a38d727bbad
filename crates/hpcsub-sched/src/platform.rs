//! Batch scheduler platforms and their directive conventions.

use std::fmt;
use std::str::FromStr;

use crate::error::SchedError;

/// The type of HPC batch scheduler to target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Torque / PBS, submitted with `qsub`.
    #[default]
    Torque,
    /// IBM Spectrum LSF, submitted with `bsub`.
    Lsf,
}

impl Platform {
    /// All supported platforms.
    pub const ALL: [Platform; 2] = [Platform::Torque, Platform::Lsf];

    /// Identifier accepted by [`Platform::from_str`].
    pub fn id(&self) -> &'static str {
        match self {
            Platform::Torque => "torque",
            Platform::Lsf => "lsf",
        }
    }

    /// Resolve the immutable profile for this platform.
    pub fn profile(&self) -> PlatformProfile {
        match self {
            Platform::Torque => PlatformProfile {
                platform: *self,
                directive_prefix: "#PBS",
                output_file_name: "hpc_file.qsub",
                job_id_placeholder: "$PBS_JOBID",
                submit_program: "qsub",
            },
            Platform::Lsf => PlatformProfile {
                platform: *self,
                directive_prefix: "#BSUB",
                output_file_name: "hpc_file.bsub",
                job_id_placeholder: "%J",
                submit_program: "bsub",
            },
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Platform {
    type Err = SchedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "torque" | "pbs" => Ok(Platform::Torque),
            "lsf" => Ok(Platform::Lsf),
            other => Err(SchedError::Configuration(format!(
                "unknown platform '{other}', expected one of: torque, lsf"
            ))),
        }
    }
}

/// Directive syntax and file conventions of one scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformProfile {
    pub platform: Platform,
    /// Comment prefix of every directive line.
    pub directive_prefix: &'static str,
    /// Name of the rendered submission file inside `hpc_files`.
    pub output_file_name: &'static str,
    /// Scheduler variable that expands to the job id at runtime.
    pub job_id_placeholder: &'static str,
    /// Program that reads the submission file on stdin.
    pub submit_program: &'static str,
}

impl PlatformProfile {
    /// Default stdout log name, e.g. `$PBS_JOBID.output`.
    pub fn default_log_file(&self) -> String {
        format!("{}.output", self.job_id_placeholder)
    }

    /// Default stderr log name, e.g. `%J.error`.
    pub fn default_error_file(&self) -> String {
        format!("{}.error", self.job_id_placeholder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_platform() {
        assert_eq!("torque".parse::<Platform>().unwrap(), Platform::Torque);
        assert_eq!("PBS".parse::<Platform>().unwrap(), Platform::Torque);
        assert_eq!(" lsf ".parse::<Platform>().unwrap(), Platform::Lsf);
    }

    #[test]
    fn test_id_parses_back() {
        for platform in Platform::ALL {
            assert_eq!(platform.id().parse::<Platform>().unwrap(), platform);
        }
    }

    #[test]
    fn test_parse_unknown_platform() {
        let err = "slurm".parse::<Platform>().unwrap_err();
        assert!(matches!(err, SchedError::Configuration(_)));
        assert!(err.to_string().contains("slurm"));
    }

    #[test]
    fn test_profiles() {
        let torque = Platform::Torque.profile();
        assert_eq!(torque.directive_prefix, "#PBS");
        assert_eq!(torque.output_file_name, "hpc_file.qsub");
        assert_eq!(torque.submit_program, "qsub");
        assert_eq!(torque.default_log_file(), "$PBS_JOBID.output");
        assert_eq!(torque.default_error_file(), "$PBS_JOBID.error");

        let lsf = Platform::Lsf.profile();
        assert_eq!(lsf.directive_prefix, "#BSUB");
        assert_eq!(lsf.output_file_name, "hpc_file.bsub");
        assert_eq!(lsf.submit_program, "bsub");
        assert_eq!(lsf.default_log_file(), "%J.output");
    }

    #[test]
    fn test_default_is_torque() {
        assert_eq!(Platform::default(), Platform::Torque);
        assert_eq!(Platform::default().to_string(), "torque");
    }
}
