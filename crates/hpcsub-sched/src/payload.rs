//! Materializing the job payload into `hpc_files/job_script.py`.
//!
//! Inline code is written on every call. A script path is copied only when
//! `job_script.py` does not exist yet, so resubmitting into the same output
//! directory reuses the first copy even if the source changed since.

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::{SchedError, SchedResult, Stage};
use crate::layout::OutputLocation;

/// Produces the epilogue appended to inline code.
pub trait CleanupHook: Send + Sync {
    /// Python source appended after the user's code. `script` is the path the
    /// code is materialized at.
    fn epilogue(&self, script: &Path) -> String;
}

/// Appends a commented-out removal block; nothing is deleted.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCleanup;

impl CleanupHook for NoopCleanup {
    fn epilogue(&self, script: &Path) -> String {
        format!(
            "\n\n# cleanup epilogue (inactive)\n\
             # import os\n\
             # os.remove({})\n",
            python_string_literal(script)
        )
    }
}

/// Deletes the materialized script once it finished running.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveScriptCleanup;

impl CleanupHook for RemoveScriptCleanup {
    fn epilogue(&self, script: &Path) -> String {
        format!(
            "\n\n# cleanup epilogue\n\
             import os as _hpcsub_os\n\
             _hpcsub_os.remove({})\n",
            python_string_literal(script)
        )
    }
}

/// Single-quoted Python literal for `path`.
fn python_string_literal(path: &Path) -> String {
    let raw = path.to_string_lossy();
    let mut literal = String::with_capacity(raw.len() + 2);
    literal.push('\'');
    for c in raw.chars() {
        match c {
            '\\' => literal.push_str("\\\\"),
            '\'' => literal.push_str("\\'"),
            '\n' => literal.push_str("\\n"),
            '\r' => literal.push_str("\\r"),
            c => literal.push(c),
        }
    }
    literal.push('\'');
    literal
}

/// Where the payload ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedPayload {
    pub path: PathBuf,
    /// False when an existing `job_script.py` was kept instead of copying.
    pub copied: bool,
}

impl MaterializedPayload {
    /// Shell command running the payload: `python <path> <args>`.
    pub fn command(&self, script_arguments: &str) -> String {
        python_command(&self.path, script_arguments)
    }
}

/// `python <path> <args>`, with the trailing separator kept when `args` is
/// empty.
pub fn python_command(script: &Path, script_arguments: &str) -> String {
    format!("python {} {}", script.display(), script_arguments)
}

/// Write `code` plus the hook's epilogue to `job_script.py`, replacing any
/// existing file.
pub async fn materialize_from_code(
    code: &str,
    location: &OutputLocation,
    cleanup: &dyn CleanupHook,
) -> SchedResult<MaterializedPayload> {
    let path = location.job_script_path();

    let mut text = String::with_capacity(code.len() + 128);
    text.push_str(code);
    text.push_str(&cleanup.epilogue(&path));

    fs::write(&path, text)
        .await
        .map_err(|e| SchedError::io(Stage::Payload, &path, e))?;

    tracing::debug!("Wrote inline code to {}", path.display());
    Ok(MaterializedPayload { path, copied: true })
}

/// Fail with [`SchedError::Payload`] unless `source` is an existing file.
pub async fn check_script_source(source: &Path) -> SchedResult<()> {
    match fs::metadata(source).await {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => Err(SchedError::Payload {
            path: source.to_path_buf(),
            message: "not a regular file".to_string(),
        }),
        Err(e) => Err(SchedError::Payload {
            path: source.to_path_buf(),
            message: format!("script not found ({e})"),
        }),
    }
}

/// Copy `source` to `job_script.py` unless that file already exists.
pub async fn materialize_from_script(
    source: &Path,
    location: &OutputLocation,
) -> SchedResult<MaterializedPayload> {
    check_script_source(source).await?;

    let path = location.job_script_path();
    let exists = fs::try_exists(&path)
        .await
        .map_err(|e| SchedError::io(Stage::Payload, &path, e))?;

    if exists {
        tracing::warn!(
            "{} already exists, keeping it instead of copying {}",
            path.display(),
            source.display()
        );
        return Ok(MaterializedPayload {
            path,
            copied: false,
        });
    }

    fs::copy(source, &path)
        .await
        .map_err(|e| SchedError::io(Stage::Payload, &path, e))?;

    tracing::debug!("Copied {} to {}", source.display(), path.display());
    Ok(MaterializedPayload { path, copied: true })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::ensure_layout;

    #[tokio::test]
    async fn test_code_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let location = ensure_layout(tmp.path()).await.unwrap();

        materialize_from_code("print('one')", &location, &NoopCleanup)
            .await
            .unwrap();
        let payload = materialize_from_code("print('two')", &location, &NoopCleanup)
            .await
            .unwrap();

        let text = std::fs::read_to_string(&payload.path).unwrap();
        assert!(text.starts_with("print('two')"));
        assert!(!text.contains("print('one')"));
        assert!(text.contains("# os.remove("));
    }

    #[tokio::test]
    async fn test_remove_script_hook() {
        let tmp = tempfile::tempdir().unwrap();
        let location = ensure_layout(tmp.path()).await.unwrap();

        let payload = materialize_from_code("x = 1", &location, &RemoveScriptCleanup)
            .await
            .unwrap();

        let text = std::fs::read_to_string(&payload.path).unwrap();
        let expected = format!("_hpcsub_os.remove('{}')", payload.path.display());
        assert!(text.contains(&expected));
    }

    #[tokio::test]
    async fn test_epilogue_escapes_quotes_in_path() {
        let tmp = tempfile::tempdir().unwrap();
        let location = ensure_layout(tmp.path().join("o'brien")).await.unwrap();

        let payload = materialize_from_code("print('hi')", &location, &RemoveScriptCleanup)
            .await
            .unwrap();

        let text = std::fs::read_to_string(&payload.path).unwrap();
        let escaped = payload.path.display().to_string().replace('\'', "\\'");
        assert!(text.contains(&format!("_hpcsub_os.remove('{escaped}')\n")));
        assert!(!text.contains("o'brien"));

        let noop = NoopCleanup.epilogue(&payload.path);
        assert!(noop.contains(&format!("# os.remove('{escaped}')\n")));
    }

    #[test]
    fn test_python_string_literal() {
        assert_eq!(python_string_literal(Path::new("/w/job.py")), "'/w/job.py'");
        assert_eq!(
            python_string_literal(Path::new("/w/o'b\\x/job.py")),
            r"'/w/o\'b\\x/job.py'"
        );
    }

    #[tokio::test]
    async fn test_script_copied_once() {
        let tmp = tempfile::tempdir().unwrap();
        let location = ensure_layout(tmp.path().join("out")).await.unwrap();
        let source = tmp.path().join("train.py");

        std::fs::write(&source, "print('v1')\n").unwrap();
        let first = materialize_from_script(&source, &location).await.unwrap();
        assert!(first.copied);

        std::fs::write(&source, "print('v2')\n").unwrap();
        let second = materialize_from_script(&source, &location).await.unwrap();
        assert!(!second.copied);
        assert_eq!(first.path, second.path);
        assert_eq!(std::fs::read_to_string(&second.path).unwrap(), "print('v1')\n");
    }

    #[tokio::test]
    async fn test_missing_script() {
        let tmp = tempfile::tempdir().unwrap();
        let location = OutputLocation::for_output(tmp.path());

        let err = materialize_from_script(&tmp.path().join("nope.py"), &location)
            .await
            .unwrap_err();
        assert!(matches!(err, SchedError::Payload { .. }));
    }

    #[test]
    fn test_python_command() {
        let cmd = python_command(Path::new("/w/hpc_files/job_script.py"), "--lr 0.1");
        assert_eq!(cmd, "python /w/hpc_files/job_script.py --lr 0.1");

        let cmd = python_command(Path::new("/w/hpc_files/job_script.py"), "");
        assert_eq!(cmd, "python /w/hpc_files/job_script.py ");
    }
}
