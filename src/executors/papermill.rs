// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nbflow contributors

//! Papermill engine
//!
//! Runs notebooks through the `papermill` command line. The notebook's own
//! streams reach the capture files through `--stdout-file`/`--stderr-file`;
//! papermill's process output (logs, tracebacks) is appended after it.

use async_trait::async_trait;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

use super::{EngineFailure, EngineRequest, ExecutionEngine};
use crate::config::EngineConfig;
use crate::errors::NbflowError;

/// Markers papermill prints when the requested kernel is not installed
const MISSING_KERNEL_MARKERS: &[&str] = &["NoSuchKernel", "No such kernel"];

/// Papermill engine
pub struct PapermillEngine {
    /// Program to run
    program: PathBuf,
    /// Arguments placed before the papermill arguments
    base_args: Vec<String>,
}

impl PapermillEngine {
    /// Create an engine from configuration, locating the command on the PATH
    pub fn from_config(config: &EngineConfig) -> Result<Self, NbflowError> {
        let program =
            which::which(&config.command).map_err(|_| NbflowError::engine_not_found(&config.command))?;

        Ok(Self {
            program,
            base_args: config.args.clone(),
        })
    }

    /// Create an engine around an explicit command, without PATH lookup
    pub fn with_command(program: impl Into<PathBuf>, base_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            base_args,
        }
    }

    fn build_command(&self, request: &EngineRequest<'_>) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.base_args)
            .arg(request.input_path)
            .arg(request.output_path)
            .arg("--cwd")
            .arg(request.working_dir)
            .arg("--stdout-file")
            .arg(request.stdout_path)
            .arg("--stderr-file")
            .arg(request.stderr_path)
            .arg("--no-progress-bar");

        if let Some(environment) = request.environment {
            cmd.arg("-k").arg(environment);
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        cmd
    }
}

fn read_all(file: &File) -> std::io::Result<Vec<u8>> {
    let mut reader = file;
    let mut buf = Vec::new();
    reader.seek(SeekFrom::Start(0))?;
    reader.read_to_end(&mut buf)?;
    Ok(buf)
}

/// Finish a capture file after an attempt
///
/// Papermill opens its stream files in write mode, so an attempt may have
/// truncated what earlier attempts left. That content is put back in front
/// before the process output is appended.
fn settle_capture(file: &File, earlier: &[u8], process_output: &[u8]) -> std::io::Result<()> {
    let mut content = read_all(file)?;
    if !content.starts_with(earlier) {
        let mut restored = earlier.to_vec();
        restored.append(&mut content);
        content = restored;
    }
    content.extend_from_slice(process_output);

    let mut writer = file;
    file.set_len(0)?;
    writer.seek(SeekFrom::Start(0))?;
    writer.write_all(&content)?;
    writer.flush()
}

fn last_line(output: &str) -> Option<&str> {
    output.lines().rev().map(str::trim).find(|line| !line.is_empty())
}

#[async_trait]
impl ExecutionEngine for PapermillEngine {
    fn name(&self) -> &str {
        "papermill"
    }

    async fn execute(&self, request: EngineRequest<'_>) -> Result<(), EngineFailure> {
        let capture_error =
            |e: std::io::Error| EngineFailure::failed(format!("failed to update capture files: {}", e));

        let earlier_out = read_all(request.stdout).map_err(capture_error)?;
        let earlier_err = read_all(request.stderr).map_err(capture_error)?;

        let output = self.build_command(&request).output().await.map_err(|e| {
            EngineFailure::failed(format!("failed to start {}: {}", self.program.display(), e))
        })?;

        settle_capture(request.stdout, &earlier_out, &output.stdout).map_err(capture_error)?;
        settle_capture(request.stderr, &earlier_err, &output.stderr).map_err(capture_error)?;

        if output.status.success() {
            return Ok(());
        }

        // only this attempt's process stderr decides the failure kind
        let stderr = String::from_utf8_lossy(&output.stderr);
        let mut message = format!("{} exited with {}", self.program.display(), output.status);
        if let Some(line) = last_line(&stderr) {
            message.push_str(": ");
            message.push_str(line);
        }

        if MISSING_KERNEL_MARKERS.iter().any(|marker| stderr.contains(marker)) {
            Err(EngineFailure::environment_not_found(message))
        } else {
            Err(EngineFailure::failed(message))
        }
    }

    async fn check_available(&self) -> bool {
        self.program.exists() || which::which(&self.program).is_ok()
    }

    async fn version(&self) -> Result<String, NbflowError> {
        let output = Command::new(&self.program)
            .args(&self.base_args)
            .arg("--version")
            .output()
            .await
            .map_err(|_| NbflowError::engine_not_found(&self.program.to_string_lossy()))?;

        let version_str = String::from_utf8_lossy(&output.stdout);
        let version = version_str
            .lines()
            .next()
            .unwrap_or("unknown")
            .trim()
            .to_string();

        Ok(version)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::executors::EngineFailureKind;
    use std::fs::OpenOptions;
    use std::path::Path;

    // Stands in for papermill. Like papermill it opens the stream files in
    // write mode, sends notebook output there and logs to its own stderr.
    const FAKE_PAPERMILL: &str = r#"
input="$1"
shift 2
kernel=""
while [ $# -gt 0 ]; do
    case "$1" in
        --cwd) cwd="$2"; shift 2 ;;
        --stdout-file) out="$2"; shift 2 ;;
        --stderr-file) err="$2"; shift 2 ;;
        -k) kernel="$2"; shift 2 ;;
        *) shift ;;
    esac
done
: > "$out"
: > "$err"
echo "Input Notebook: $input" >&2
case "$input" in
    *broken*)
        echo "partial result" >> "$out"
        echo "ZeroDivisionError in cell" >> "$err"
        echo "PapermillExecutionError: cell 3 raised" >&2
        exit 1
        ;;
esac
if [ -z "$kernel" ]; then
    echo "jupyter_client.kernelspec.NoSuchKernel: No such kernel named py-custom" >&2
    exit 1
fi
echo "hello from $input in $cwd" >> "$out"
echo "kernel $kernel" >> "$out"
"#;

    fn capture(path: &Path) -> File {
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .unwrap()
    }

    fn fake_engine(dir: &Path) -> PapermillEngine {
        let script = dir.join("fake-papermill.sh");
        std::fs::write(&script, FAKE_PAPERMILL).unwrap();
        PapermillEngine::with_command("sh", vec![script.to_string_lossy().into_owned()])
    }

    struct Sinks {
        stdout_path: PathBuf,
        stderr_path: PathBuf,
        stdout: File,
        stderr: File,
    }

    impl Sinks {
        fn new(dir: &Path, name: &str) -> Self {
            let stdout_path = dir.join(format!("{}.out", name));
            let stderr_path = dir.join(format!("{}.err", name));
            Self {
                stdout: capture(&stdout_path),
                stderr: capture(&stderr_path),
                stdout_path,
                stderr_path,
            }
        }

        fn request<'a>(
            &'a self,
            notebook: &'a Path,
            working_dir: &'a Path,
            environment: Option<&'a str>,
        ) -> EngineRequest<'a> {
            EngineRequest {
                input_path: notebook,
                output_path: notebook,
                stdout: &self.stdout,
                stderr: &self.stderr,
                stdout_path: &self.stdout_path,
                stderr_path: &self.stderr_path,
                working_dir,
                environment,
            }
        }

        fn out(&self) -> String {
            std::fs::read_to_string(&self.stdout_path).unwrap()
        }

        fn err(&self) -> String {
            std::fs::read_to_string(&self.stderr_path).unwrap()
        }
    }

    #[tokio::test]
    async fn test_notebook_output_lands_in_capture_file() {
        let dir = tempfile::tempdir().unwrap();
        let engine = fake_engine(dir.path());
        let notebook = dir.path().join("nb.ipynb");
        let sinks = Sinks::new(dir.path(), "nb.ipynb");

        engine
            .execute(sinks.request(&notebook, dir.path(), Some("python3")))
            .await
            .unwrap();

        let out = sinks.out();
        assert!(out.contains("hello from"));
        assert!(out.contains("kernel python3"));
        assert!(sinks.err().contains("Input Notebook:"));
    }

    #[tokio::test]
    async fn test_missing_kernel_is_classified() {
        let dir = tempfile::tempdir().unwrap();
        let engine = fake_engine(dir.path());
        let notebook = dir.path().join("nb.ipynb");
        let sinks = Sinks::new(dir.path(), "nb.ipynb");

        let failure = engine
            .execute(sinks.request(&notebook, dir.path(), None))
            .await
            .unwrap_err();

        assert_eq!(failure.kind, EngineFailureKind::EnvironmentNotFound);
        assert!(failure.message.contains("No such kernel named py-custom"));
        assert!(sinks.err().contains("NoSuchKernel"));
    }

    #[tokio::test]
    async fn test_retry_keeps_earlier_attempt_output() {
        let dir = tempfile::tempdir().unwrap();
        let engine = fake_engine(dir.path());
        let notebook = dir.path().join("nb.ipynb");
        let sinks = Sinks::new(dir.path(), "nb.ipynb");

        let first = engine.execute(sinks.request(&notebook, dir.path(), None)).await;
        assert!(first.unwrap_err().is_environment_not_found());

        engine
            .execute(sinks.request(&notebook, dir.path(), Some("python3")))
            .await
            .unwrap();

        let err = sinks.err();
        let kernel_error = err.find("NoSuchKernel").unwrap();
        let second_log = err.rfind("Input Notebook:").unwrap();
        assert!(kernel_error < second_log);
        assert!(sinks.out().contains("kernel python3"));
    }

    #[tokio::test]
    async fn test_cell_error_is_plain_failure() {
        let dir = tempfile::tempdir().unwrap();
        let engine = fake_engine(dir.path());
        let notebook = dir.path().join("broken.ipynb");
        let sinks = Sinks::new(dir.path(), "broken.ipynb");

        let failure = engine
            .execute(sinks.request(&notebook, dir.path(), None))
            .await
            .unwrap_err();

        assert_eq!(failure.kind, EngineFailureKind::Failed);
        assert!(failure.message.contains("cell 3 raised"));
        assert_eq!(sinks.out(), "partial result\n");

        let err = sinks.err();
        assert!(err.starts_with("ZeroDivisionError in cell\n"));
        assert!(err.contains("PapermillExecutionError"));
    }

    #[tokio::test]
    async fn test_only_new_stderr_is_classified() {
        let dir = tempfile::tempdir().unwrap();
        let engine = fake_engine(dir.path());
        let notebook = dir.path().join("broken.ipynb");
        let sinks = Sinks::new(dir.path(), "broken.ipynb");

        // left over from an earlier attempt on the same sink
        let mut writer = &sinks.stderr;
        writer.write_all(b"NoSuchKernel from before\n").unwrap();

        let failure = engine
            .execute(sinks.request(&notebook, dir.path(), None))
            .await
            .unwrap_err();
        assert_eq!(failure.kind, EngineFailureKind::Failed);

        let err = sinks.err();
        assert!(err.starts_with("NoSuchKernel from before\n"));
        assert!(err.contains("cell 3 raised"));
    }

    #[tokio::test]
    async fn test_unstartable_program_fails() {
        let dir = tempfile::tempdir().unwrap();
        let engine = PapermillEngine::with_command(dir.path().join("no-such-binary"), vec![]);
        let notebook = dir.path().join("nb.ipynb");
        let sinks = Sinks::new(dir.path(), "nb.ipynb");

        let failure = engine
            .execute(sinks.request(&notebook, dir.path(), None))
            .await
            .unwrap_err();

        assert_eq!(failure.kind, EngineFailureKind::Failed);
        assert!(failure.message.contains("failed to start"));
        assert!(!engine.check_available().await);
    }
}
