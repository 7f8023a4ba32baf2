//! Check execution and outcome classification.

use gatekeeper_core::{CheckDescriptor, CheckOutcome, FailureKind, ProjectContext};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

use crate::invoker::{CollaboratorInvoker, CollaboratorOutput, InvokeError, SystemInvoker};

/// Extra time an invoker gets to honour its own timeout before the runner
/// abandons it.
const TIMEOUT_GRACE: Duration = Duration::from_secs(2);

/// Runs one descriptor against its collaborator and classifies the result.
///
/// Never fails: launch errors, timeouts and panics inside the invoker all
/// become `Failed` outcomes.
pub struct CheckRunner {
    invoker: Arc<dyn CollaboratorInvoker>,
}

impl CheckRunner {
    pub fn new(invoker: Arc<dyn CollaboratorInvoker>) -> Self {
        Self { invoker }
    }

    /// Runner backed by real processes.
    pub fn system() -> Self {
        Self::new(Arc::new(SystemInvoker))
    }

    /// Execute `descriptor` in the project root, bounded by `timeout`.
    pub async fn execute(
        &self,
        descriptor: &CheckDescriptor,
        ctx: &ProjectContext,
        timeout: Duration,
    ) -> CheckOutcome {
        let start = Instant::now();

        let invoker = self.invoker.clone();
        let invocation = descriptor.invocation.clone();
        let cwd = ctx.root().to_path_buf();
        let mut task = tokio::spawn(async move { invoker.invoke(&invocation, &cwd, timeout).await });

        let result = match tokio::time::timeout(timeout.saturating_add(TIMEOUT_GRACE), &mut task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                warn!(check = %descriptor.name, error = %e, "Check task aborted");
                Err(InvokeError::Internal(format!("check task aborted: {e}")))
            }
            Err(_) => {
                task.abort();
                warn!(check = %descriptor.name, "Invoker ignored its timeout");
                Err(InvokeError::Timeout {
                    seconds: timeout.as_secs(),
                })
            }
        };

        classify(descriptor, result, start.elapsed().as_millis() as u64)
    }
}

/// Map an invocation result to an outcome.
///
/// Exit code 0 without findings passes; anything else fails.
pub fn classify(
    descriptor: &CheckDescriptor,
    result: Result<CollaboratorOutput, InvokeError>,
    duration_ms: u64,
) -> CheckOutcome {
    match result {
        Ok(output) if !output.findings.is_empty() => {
            let count = output.findings.len();
            CheckOutcome::failed(
                descriptor,
                duration_ms,
                FailureKind::Findings { count },
                output.stdout,
                output.stderr,
            )
            .with_findings(output.findings)
        }
        Ok(output) if output.exit_code == Some(0) => {
            CheckOutcome::passed(descriptor, duration_ms, output.stdout, output.stderr)
        }
        Ok(output) => CheckOutcome::failed(
            descriptor,
            duration_ms,
            FailureKind::NonZeroExit {
                exit_code: output.exit_code,
            },
            output.stdout,
            output.stderr,
        ),
        Err(InvokeError::Timeout { seconds }) => {
            CheckOutcome::errored(descriptor, duration_ms, FailureKind::Timeout { seconds }, "timeout")
        }
        Err(InvokeError::Launch(message)) => {
            CheckOutcome::errored(descriptor, duration_ms, FailureKind::LaunchError, message)
        }
        Err(InvokeError::Internal(message)) => {
            CheckOutcome::errored(descriptor, duration_ms, FailureKind::Internal, message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gatekeeper_core::{CheckStatus, Finding, Invocation};
    use std::path::{Path, PathBuf};

    fn descriptor() -> CheckDescriptor {
        CheckDescriptor::command("TypeScript Check", "Code Quality", "npx tsc --noEmit", 60).critical()
    }

    #[test]
    fn test_classify_pass() {
        let outcome = classify(&descriptor(), Ok(CollaboratorOutput::exited(0, "ok", "")), 10);
        assert_eq!(outcome.status, CheckStatus::Passed);
        assert_eq!(outcome.stdout, "ok");
        assert!(outcome.failure.is_none());
    }

    #[test]
    fn test_classify_nonzero_exit() {
        let outcome = classify(&descriptor(), Ok(CollaboratorOutput::exited(2, "", "TS2322")), 10);
        assert_eq!(outcome.status, CheckStatus::Failed);
        assert_eq!(outcome.failure, Some(FailureKind::NonZeroExit { exit_code: Some(2) }));
        assert_eq!(outcome.stderr, "TS2322");
        assert!(outcome.error_detail.is_none());
    }

    #[test]
    fn test_classify_signal_is_failure() {
        let output = CollaboratorOutput {
            exit_code: None,
            ..CollaboratorOutput::default()
        };
        let outcome = classify(&descriptor(), Ok(output), 10);
        assert_eq!(outcome.failure, Some(FailureKind::NonZeroExit { exit_code: None }));
    }

    #[test]
    fn test_classify_findings() {
        let output = CollaboratorOutput {
            exit_code: Some(1),
            findings: vec![Finding {
                file: PathBuf::from("a.ts"),
                pattern: "AUTH_SECRET=".to_string(),
            }],
            ..CollaboratorOutput::default()
        };
        let outcome = classify(&descriptor(), Ok(output), 10);
        assert_eq!(outcome.failure, Some(FailureKind::Findings { count: 1 }));
        assert_eq!(outcome.findings.len(), 1);
    }

    #[test]
    fn test_classify_errors() {
        let timeout = classify(&descriptor(), Err(InvokeError::Timeout { seconds: 3 }), 3000);
        assert!(timeout.is_timeout());
        assert_eq!(timeout.error_detail.as_deref(), Some("timeout"));

        let launch = classify(&descriptor(), Err(InvokeError::Launch("npx: not found".into())), 1);
        assert_eq!(launch.failure, Some(FailureKind::LaunchError));
        assert_eq!(launch.error_detail.as_deref(), Some("npx: not found"));

        let internal = classify(&descriptor(), Err(InvokeError::Internal("bad".into())), 1);
        assert_eq!(internal.failure, Some(FailureKind::Internal));
    }

    struct PanickingInvoker;

    #[async_trait]
    impl CollaboratorInvoker for PanickingInvoker {
        async fn invoke(
            &self,
            _invocation: &Invocation,
            _cwd: &Path,
            _timeout: Duration,
        ) -> Result<CollaboratorOutput, InvokeError> {
            panic!("collaborator exploded");
        }
    }

    struct InstantInvoker;

    #[async_trait]
    impl CollaboratorInvoker for InstantInvoker {
        async fn invoke(
            &self,
            _invocation: &Invocation,
            _cwd: &Path,
            _timeout: Duration,
        ) -> Result<CollaboratorOutput, InvokeError> {
            Ok(CollaboratorOutput::exited(0, "done", ""))
        }
    }

    struct StubbornInvoker;

    #[async_trait]
    impl CollaboratorInvoker for StubbornInvoker {
        async fn invoke(
            &self,
            _invocation: &Invocation,
            _cwd: &Path,
            _timeout: Duration,
        ) -> Result<CollaboratorOutput, InvokeError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(CollaboratorOutput::exited(0, "", ""))
        }
    }

    #[tokio::test]
    async fn test_panicking_invoker_becomes_internal_failure() {
        let runner = CheckRunner::new(Arc::new(PanickingInvoker));
        let ctx = ProjectContext::with_capabilities(".", Vec::<String>::new());
        let outcome = runner.execute(&descriptor(), &ctx, Duration::from_secs(5)).await;
        assert_eq!(outcome.status, CheckStatus::Failed);
        assert_eq!(outcome.failure, Some(FailureKind::Internal));
        assert!(outcome.error_detail.unwrap_or_default().contains("aborted"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_runner_enforces_timeout_on_stubborn_invoker() {
        let runner = CheckRunner::new(Arc::new(StubbornInvoker));
        let ctx = ProjectContext::with_capabilities(".", Vec::<String>::new());
        let outcome = runner.execute(&descriptor(), &ctx, Duration::from_secs(1)).await;
        assert!(outcome.is_timeout());
        assert_eq!(outcome.error_detail.as_deref(), Some("timeout"));
    }

    #[tokio::test]
    async fn test_maximum_timeout_does_not_overflow() {
        let runner = CheckRunner::new(Arc::new(InstantInvoker));
        let ctx = ProjectContext::with_capabilities(".", Vec::<String>::new());
        let d = CheckDescriptor::command("Huge Timeout", "Code Quality", "true", u64::MAX);
        let outcome = runner.execute(&d, &ctx, Duration::from_secs(u64::MAX)).await;
        assert_eq!(outcome.status, CheckStatus::Passed);
        assert_eq!(outcome.stdout, "done");
    }
}
