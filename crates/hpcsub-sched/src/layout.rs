//! Per-job output directory layout.
//!
//! ```text
//! <output_path>/
//!   hpc_files/
//!     hpc_file.qsub | hpc_file.bsub
//!     job_script.py
//!     logs/
//! ```

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::{SchedError, SchedResult, Stage};
use crate::platform::PlatformProfile;

/// Directory holding generated files below the caller's output path.
pub const HPC_DIR_NAME: &str = "hpc_files";

/// Log directory inside [`HPC_DIR_NAME`].
pub const LOG_DIR_NAME: &str = "logs";

/// Materialized payload name inside [`HPC_DIR_NAME`].
pub const JOB_SCRIPT_NAME: &str = "job_script.py";

/// The `hpc_files` directory of one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLocation {
    root: PathBuf,
}

impl OutputLocation {
    /// Location for `output_path` without touching the filesystem.
    pub fn for_output(output_path: impl AsRef<Path>) -> Self {
        Self {
            root: output_path.as_ref().join(HPC_DIR_NAME),
        }
    }

    /// The `hpc_files` directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join(LOG_DIR_NAME)
    }

    pub fn job_script_path(&self) -> PathBuf {
        self.root.join(JOB_SCRIPT_NAME)
    }

    /// Path of the rendered submission file for `profile`.
    pub fn submission_file(&self, profile: &PlatformProfile) -> PathBuf {
        self.root.join(profile.output_file_name)
    }
}

/// Create `<output_path>/hpc_files/logs`, including parents.
///
/// Existing directories are left untouched, so calling this repeatedly is
/// harmless.
pub async fn ensure_layout(output_path: impl AsRef<Path>) -> SchedResult<OutputLocation> {
    let location = OutputLocation::for_output(output_path);
    let logs = location.logs_dir();

    // create_dir_all also creates hpc_files itself
    fs::create_dir_all(&logs)
        .await
        .map_err(|e| SchedError::io(Stage::Layout, &logs, e))?;

    tracing::debug!("Output layout ready at {}", location.root.display());
    Ok(location)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Platform;

    #[tokio::test]
    async fn test_ensure_layout_creates_tree() {
        let tmp = tempfile::tempdir().unwrap();
        let output = tmp.path().join("nested").join("run1");

        let location = ensure_layout(&output).await.unwrap();

        assert_eq!(location.root(), output.join("hpc_files"));
        assert!(output.join("hpc_files").is_dir());
        assert!(output.join("hpc_files/logs").is_dir());
    }

    #[tokio::test]
    async fn test_ensure_layout_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let first = ensure_layout(tmp.path()).await.unwrap();
        std::fs::write(first.logs_dir().join("1.output"), "keep me").unwrap();

        let second = ensure_layout(tmp.path()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(
            std::fs::read_to_string(second.logs_dir().join("1.output")).unwrap(),
            "keep me"
        );
    }

    #[tokio::test]
    async fn test_ensure_layout_reports_path() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, "not a directory").unwrap();

        let err = ensure_layout(&blocker).await.unwrap_err();
        match err {
            SchedError::Io { stage, path, .. } => {
                assert_eq!(stage, Stage::Layout);
                assert!(path.starts_with(&blocker));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_paths() {
        let location = OutputLocation::for_output("/scratch/run");
        assert_eq!(location.logs_dir(), Path::new("/scratch/run/hpc_files/logs"));
        assert_eq!(
            location.job_script_path(),
            Path::new("/scratch/run/hpc_files/job_script.py")
        );
        assert_eq!(
            location.submission_file(&Platform::Lsf.profile()),
            Path::new("/scratch/run/hpc_files/hpc_file.bsub")
        );
    }
}
