//! Collaborator invocation.
//!
//! One polymorphic execution path for both kinds of check: shell commands
//! run as child processes, and the secret scan runs in-process on the
//! blocking pool. Both honour the same timeout contract.

use async_trait::async_trait;
use gatekeeper_core::{scan, Finding, Invocation, ScanConfig};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::debug;

/// What a collaborator produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollaboratorOutput {
    /// Exit code; `None` when terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,

    /// Findings reported by in-process scans.
    pub findings: Vec<Finding>,
}

impl CollaboratorOutput {
    pub fn exited(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(exit_code),
            stdout: stdout.into(),
            stderr: stderr.into(),
            findings: Vec::new(),
        }
    }
}

/// Why a collaborator produced no usable output.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum InvokeError {
    #[error("timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("failed to launch: {0}")]
    Launch(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Capability to run a check's collaborator.
#[async_trait]
pub trait CollaboratorInvoker: Send + Sync {
    async fn invoke(
        &self,
        invocation: &Invocation,
        cwd: &Path,
        timeout: Duration,
    ) -> Result<CollaboratorOutput, InvokeError>;
}

/// Invoker backed by real processes and the in-process scanner.
pub struct SystemInvoker;

#[async_trait]
impl CollaboratorInvoker for SystemInvoker {
    async fn invoke(
        &self,
        invocation: &Invocation,
        cwd: &Path,
        timeout: Duration,
    ) -> Result<CollaboratorOutput, InvokeError> {
        match invocation {
            Invocation::Command { command } => run_shell(command, cwd, timeout).await,
            Invocation::SecretScan { config } => run_scan(config.clone(), cwd.to_path_buf(), timeout).await,
        }
    }
}

fn shell_command(command: &str) -> Command {
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;

        let mut cmd = std::process::Command::new("sh");
        cmd.arg("-c").arg(command);
        // Own process group so a timeout can take down the whole tree.
        cmd.process_group(0);
        Command::from(cmd)
    }
    #[cfg(not(unix))]
    {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(command);
        cmd
    }
}

fn drain<R>(pipe: Option<R>) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf).await;
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

#[cfg(unix)]
fn terminate_group(pid: Option<u32>) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    if let Some(pid) = pid {
        if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
            debug!(pid, error = %e, "Process group already gone");
        }
    }
}

#[cfg(not(unix))]
fn terminate_group(_pid: Option<u32>) {}

/// Kill the direct child if still running and wait for it.
async fn reap(child: &mut tokio::process::Child) {
    if let Err(e) = child.start_kill() {
        debug!(error = %e, "Child already exited");
    }
    let _ = child.wait().await;
}

/// Run `command` through the shell in `cwd`, capturing full output.
///
/// On timeout the whole process group is killed and the child reaped
/// before returning.
pub async fn run_shell(command: &str, cwd: &Path, timeout: Duration) -> Result<CollaboratorOutput, InvokeError> {
    let mut cmd = shell_command(command);
    cmd.current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let started = Instant::now();
    let mut child = cmd
        .spawn()
        .map_err(|e| InvokeError::Launch(format!("{command}: {e}")))?;
    let pid = child.id();

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    match tokio::time::timeout(timeout, child.wait()).await {
        Ok(Ok(status)) => {
            let stdout_abort = stdout.abort_handle();
            let stderr_abort = stderr.abort_handle();
            let readers = async { (stdout.await.unwrap_or_default(), stderr.await.unwrap_or_default()) };
            let remaining = timeout.saturating_sub(started.elapsed());
            match tokio::time::timeout(remaining, readers).await {
                Ok((stdout, stderr)) => Ok(CollaboratorOutput {
                    exit_code: status.code(),
                    stdout,
                    stderr,
                    findings: Vec::new(),
                }),
                Err(_) => {
                    // Background processes held the pipes open past the deadline.
                    terminate_group(pid);
                    stdout_abort.abort();
                    stderr_abort.abort();
                    debug!(command = %command, seconds = timeout.as_secs(), "Terminated lingering background processes");
                    Err(InvokeError::Timeout {
                        seconds: timeout.as_secs(),
                    })
                }
            }
        }
        Ok(Err(e)) => {
            terminate_group(pid);
            reap(&mut child).await;
            stdout.abort();
            stderr.abort();
            Err(InvokeError::Internal(format!("failed waiting for {command}: {e}")))
        }
        Err(_) => {
            terminate_group(pid);
            reap(&mut child).await;
            stdout.abort();
            stderr.abort();
            debug!(command = %command, seconds = timeout.as_secs(), "Terminated timed-out command");
            Err(InvokeError::Timeout {
                seconds: timeout.as_secs(),
            })
        }
    }
}

/// Run the secret scan on the blocking pool under `timeout`.
pub async fn run_scan(config: ScanConfig, root: PathBuf, timeout: Duration) -> Result<CollaboratorOutput, InvokeError> {
    let task = tokio::task::spawn_blocking(move || scan(&root, &config));

    let report = match tokio::time::timeout(timeout, task).await {
        Ok(Ok(report)) => report,
        Ok(Err(e)) => return Err(InvokeError::Internal(format!("secret scan aborted: {e}"))),
        Err(_) => {
            return Err(InvokeError::Timeout {
                seconds: timeout.as_secs(),
            })
        }
    };

    Ok(CollaboratorOutput {
        exit_code: Some(if report.is_clean() { 0 } else { 1 }),
        stdout: report.render(),
        stderr: String::new(),
        findings: report.findings,
    })
}
