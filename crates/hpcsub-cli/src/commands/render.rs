//! Render command implementation.

use anyhow::Result;

use hpcsub_sched::BatchSubmitter;

use super::common::{RenderArgs, scheduler_config};

/// Print the submission script for `command` to stdout.
pub fn execute(command: &str, args: &RenderArgs, platform: &str) -> Result<()> {
    let submitter = BatchSubmitter::new(scheduler_config(platform, None)?);
    let params = args.queue_args.queue_params()?;
    tracing::debug!(?params, "Merged queue parameters");
    let script = submitter.render(&args.output, command, &params)?;
    print!("{script}");
    Ok(())
}
