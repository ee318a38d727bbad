//! Batch submission scripts for Torque/PBS and LSF clusters.
//!
//! This crate turns a job description (inline Python code, an existing
//! script, or a raw shell command plus queue parameters) into a scheduler
//! submission script, writes it into a per-job output directory and pipes it
//! into `qsub` or `bsub`.
//!
//! # Pipeline
//!
//! 1. **Layout**: create `<output>/hpc_files/logs`
//! 2. **Payload**: materialize the code or script as `hpc_files/job_script.py`
//! 3. **Render**: fill the platform's directive block and job body
//! 4. **Submit**: run `qsub < hpc_file.qsub` / `bsub < hpc_file.bsub`
//!
//! # Supported Schedulers
//!
//! | Platform | Directives | Submission file | Command |
//! |----------|------------|-----------------|---------|
//! | Torque/PBS | `#PBS` | `hpc_file.qsub` | `qsub` |
//! | LSF | `#BSUB` | `hpc_file.bsub` | `bsub` |
//!
//! # Example
//!
//! ```no_run
//! use hpcsub_sched::{BatchSubmitter, QueueParameters, SchedulerConfig};
//!
//! # async fn run() -> hpcsub_sched::SchedResult<()> {
//! let submitter = BatchSubmitter::new(SchedulerConfig::lsf());
//!
//! let params = QueueParameters::new()
//!     .with_job_name("model")
//!     .with_nodes(2)
//!     .with_cores_per_node(4);
//!
//! let report = submitter
//!     .submit_code("print('hi')", "runs/model", "", &params)
//!     .await?;
//! println!("bsub exited with {}", report.exit_code());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod layout;
pub mod params;
pub mod payload;
pub mod platform;
pub mod scheduler;
pub mod submitter;
pub mod templates;

// Re-exports
pub use error::{SchedError, SchedResult, Stage};
pub use layout::{OutputLocation, ensure_layout};
pub use params::{QueueParameters, ResolvedParameters};
pub use payload::{CleanupHook, MaterializedPayload, NoopCleanup, RemoveScriptCleanup};
pub use platform::{Platform, PlatformProfile};
pub use scheduler::{BatchSubmitter, SchedulerConfig, SubmissionReport};
pub use submitter::{DryRunSubmitter, ShellSubmitter, SubmissionOutcome, Submitter};
