//! Submission script templates for Torque and LSF.
//!
//! Values are interpolated verbatim: nothing is quoted or escaped, so callers
//! must pass values that are safe in both the directive syntax and the shell.

use std::path::Path;

use crate::params::ResolvedParameters;
use crate::platform::{Platform, PlatformProfile};

/// Render a complete submission script.
pub fn render_script(
    profile: &PlatformProfile,
    params: &ResolvedParameters,
    logs_dir: &Path,
    command: &str,
) -> String {
    let mut script = String::new();

    script.push_str("#!/bin/bash\n");
    script.push_str(&render_directives(profile, params, logs_dir));

    if profile.platform == Platform::Torque {
        script.push_str("\n# Run in the submission directory when started by PBS\n");
        script.push_str("if test X$PBS_ENVIRONMENT = XPBS_BATCH; then cd $PBS_O_WORKDIR; fi\n");
    }

    script.push_str(&render_body(params, command));
    script
}

/// Render only the scheduler directive block.
pub fn render_directives(
    profile: &PlatformProfile,
    params: &ResolvedParameters,
    logs_dir: &Path,
) -> String {
    match profile.platform {
        Platform::Torque => torque_directives(profile, params, logs_dir),
        Platform::Lsf => lsf_directives(profile, params, logs_dir),
    }
}

fn torque_directives(
    profile: &PlatformProfile,
    params: &ResolvedParameters,
    logs_dir: &Path,
) -> String {
    let p = profile.directive_prefix;
    let mut block = String::new();

    block.push_str(&format!("{p} -N {}\n", params.job_name));
    block.push_str(&format!("{p} -q {}\n", params.queue_name));

    // Resources
    block.push_str(&format!("{p} -l walltime={}\n", params.walltime));
    block.push_str(&format!(
        "{p} -l nodes={}:ppn={}\n",
        params.node_count, params.cores_per_node
    ));
    block.push_str(&format!("{p} -l mem={}\n", params.requested_memory));
    block.push_str(&format!("{p} -l vmem={}\n", params.max_memory));

    // Logs
    block.push_str(&format!(
        "{p} -o {}\n",
        logs_dir.join(&params.log_file).display()
    ));
    block.push_str(&format!(
        "{p} -e {}\n",
        logs_dir.join(&params.error_file).display()
    ));

    block
}

fn lsf_directives(
    profile: &PlatformProfile,
    params: &ResolvedParameters,
    logs_dir: &Path,
) -> String {
    let p = profile.directive_prefix;
    let mut block = String::new();

    block.push_str(&format!("{p} -J {}\n", params.job_name));
    block.push_str(&format!("{p} -q {}\n", params.queue_name));
    block.push_str(&format!("{p} -W {}\n", params.walltime));

    // LSF counts cores across the whole job; ptile spreads them per host.
    block.push_str(&format!("{p} -n {}\n", params.total_cores()));
    block.push_str(&format!(
        "{p} -R \"span[ptile={}]\"\n",
        params.cores_per_node
    ));
    block.push_str(&format!(
        "{p} -R \"rusage[mem={}]\"\n",
        params.requested_memory
    ));
    block.push_str(&format!("{p} -M {}\n", params.max_memory));

    block.push_str(&format!(
        "{p} -o {}\n",
        logs_dir.join(&params.log_file).display()
    ));
    block.push_str(&format!(
        "{p} -e {}\n",
        logs_dir.join(&params.error_file).display()
    ));

    block
}

fn render_body(params: &ResolvedParameters, command: &str) -> String {
    let mut body = String::new();

    body.push_str("\n# Activate environment\n");
    body.push_str(&format!(
        "echo '**** Activating environment ****: env_name = '{}\n",
        params.environment_name
    ));
    body.push_str(&format!("source activate {}\n", params.environment_name));

    body.push_str("\necho '**** Running job ****'\n");
    body.push_str(command);
    body.push('\n');
    body.push_str("echo '**** Job completed ****'\n");

    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::QueueParameters;

    fn resolved(platform: Platform, params: QueueParameters) -> (PlatformProfile, ResolvedParameters) {
        let profile = platform.profile();
        let resolved = params.resolve(&profile).unwrap();
        (profile, resolved)
    }

    #[test]
    fn test_render_torque_script() {
        let (profile, params) = resolved(
            Platform::Torque,
            QueueParameters::new()
                .with_job_name("model")
                .with_queue("gpu")
                .with_nodes(2)
                .with_cores_per_node(16)
                .with_environment("py311"),
        );

        let script = render_script(
            &profile,
            &params,
            Path::new("/scratch/run/hpc_files/logs"),
            "python train.py --epochs 3",
        );

        assert!(script.starts_with("#!/bin/bash\n"));
        assert!(script.contains("#PBS -N model\n"));
        assert!(script.contains("#PBS -q gpu\n"));
        assert!(script.contains("#PBS -l walltime=10:00:00\n"));
        assert!(script.contains("#PBS -l nodes=2:ppn=16\n"));
        assert!(script.contains("#PBS -o /scratch/run/hpc_files/logs/$PBS_JOBID.output\n"));
        assert!(script.contains("#PBS -e /scratch/run/hpc_files/logs/$PBS_JOBID.error\n"));
        assert!(script.contains("cd $PBS_O_WORKDIR"));
        assert!(script.contains("source activate py311\n"));
        assert!(script.contains("\npython train.py --epochs 3\n"));
        assert!(!script.contains("#BSUB"));
    }

    #[test]
    fn test_render_lsf_total_cores() {
        let (profile, params) = resolved(
            Platform::Lsf,
            QueueParameters::new().with_nodes(2).with_cores_per_node(4),
        );

        let script = render_script(&profile, &params, Path::new("/w/logs"), "hostname");

        assert!(script.contains("#BSUB -n 8\n"));
        assert!(script.contains("#BSUB -R \"span[ptile=4]\"\n"));
        assert!(script.contains("#BSUB -R \"rusage[mem=4GB]\"\n"));
        assert!(script.contains("#BSUB -M 8GB\n"));
        assert!(script.contains("#BSUB -W 10:00:00\n"));
        assert!(script.contains("#BSUB -o /w/logs/%J.output\n"));
        assert!(!script.contains("#PBS"));
        assert!(!script.contains("PBS_O_WORKDIR"));
    }

    #[test]
    fn test_torque_keeps_per_node_cores() {
        let (profile, params) = resolved(
            Platform::Torque,
            QueueParameters::new().with_nodes(2).with_cores_per_node(4),
        );
        let block = render_directives(&profile, &params, Path::new("/w/logs"));
        assert!(block.contains("#PBS -l nodes=2:ppn=4\n"));
    }

    #[test]
    fn test_no_placeholders_left() {
        for platform in Platform::ALL {
            let (profile, params) = resolved(platform, QueueParameters::new());
            let script = render_script(&profile, &params, Path::new("/w/logs"), "true");
            assert!(script.contains(profile.directive_prefix));
            assert!(!script.contains('{'), "{platform}: {script}");
            assert!(!script.contains('}'), "{platform}: {script}");
        }
    }

    #[test]
    fn test_defaults_rendered_verbatim() {
        let (profile, params) = resolved(Platform::Torque, QueueParameters::new());
        let script = render_script(&profile, &params, Path::new("/w/logs"), "true");

        assert!(script.contains("#PBS -N job\n"));
        assert!(script.contains("#PBS -q compute\n"));
        assert!(script.contains("source activate base\n"));
        assert!(script.contains("#PBS -l nodes=1:ppn=1\n"));
        assert!(script.contains("#PBS -l walltime=10:00:00\n"));
        assert!(script.contains("#PBS -l mem=4GB\n"));
        assert!(script.contains("#PBS -l vmem=8GB\n"));
    }

    #[test]
    fn test_custom_log_files() {
        let (profile, params) = resolved(
            Platform::Torque,
            QueueParameters::new().with_log_files("small_test.log", "small_test.err"),
        );
        let block = render_directives(&profile, &params, Path::new("/w/logs"));
        assert!(block.contains("#PBS -o /w/logs/small_test.log\n"));
        assert!(block.contains("#PBS -e /w/logs/small_test.err\n"));
    }
}
