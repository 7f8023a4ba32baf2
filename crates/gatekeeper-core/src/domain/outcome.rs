//! Per-check outcomes.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::availability::SkipReason;
use crate::domain::descriptor::CheckDescriptor;

/// Status of a single check.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Passed,
    Failed,
    Skipped,
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckStatus::Passed => write!(f, "PASSED"),
            CheckStatus::Failed => write!(f, "FAILED"),
            CheckStatus::Skipped => write!(f, "SKIPPED"),
        }
    }
}

/// How a failed check failed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureKind {
    /// Collaborator ran and exited nonzero (`None` when killed by a signal).
    NonZeroExit { exit_code: Option<i32> },

    /// In-process scan reported findings.
    Findings { count: usize },

    /// Collaborator exceeded its timeout and was terminated.
    Timeout { seconds: u64 },

    /// Collaborator could not be started.
    LaunchError,

    /// Unexpected engine error while invoking the check.
    Internal,
}

/// One sensitive-value pattern found in one file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Finding {
    /// Path relative to the project root.
    pub file: PathBuf,
    pub pattern: String,
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Potential secret in: {} ({})", self.file.display(), self.pattern)
    }
}

/// Result of executing (or skipping) one descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckOutcome {
    pub name: String,
    pub category: String,
    pub critical: bool,
    pub status: CheckStatus,

    /// Elapsed time in milliseconds; zero for skipped checks.
    pub duration_ms: u64,

    /// Full captured stdout.
    #[serde(default)]
    pub stdout: String,

    /// Full captured stderr.
    #[serde(default)]
    pub stderr: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,

    /// Populated only for timeouts and launch/internal errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<SkipReason>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub findings: Vec<Finding>,
}

impl CheckOutcome {
    fn base(descriptor: &CheckDescriptor, status: CheckStatus, duration_ms: u64) -> Self {
        Self {
            name: descriptor.name.clone(),
            category: descriptor.category.clone(),
            critical: descriptor.critical,
            status,
            duration_ms,
            stdout: String::new(),
            stderr: String::new(),
            failure: None,
            error_detail: None,
            skip: None,
            findings: Vec::new(),
        }
    }

    /// A check that ran and succeeded.
    pub fn passed(descriptor: &CheckDescriptor, duration_ms: u64, stdout: String, stderr: String) -> Self {
        Self {
            stdout,
            stderr,
            ..Self::base(descriptor, CheckStatus::Passed, duration_ms)
        }
    }

    /// A check that ran and failed with captured output.
    pub fn failed(
        descriptor: &CheckDescriptor,
        duration_ms: u64,
        failure: FailureKind,
        stdout: String,
        stderr: String,
    ) -> Self {
        Self {
            stdout,
            stderr,
            failure: Some(failure),
            ..Self::base(descriptor, CheckStatus::Failed, duration_ms)
        }
    }

    /// A check that never produced output: timeout, launch or internal error.
    pub fn errored(
        descriptor: &CheckDescriptor,
        duration_ms: u64,
        failure: FailureKind,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            failure: Some(failure),
            error_detail: Some(detail.into()),
            ..Self::base(descriptor, CheckStatus::Failed, duration_ms)
        }
    }

    /// A check that was not run.
    pub fn skipped(descriptor: &CheckDescriptor, reason: SkipReason) -> Self {
        Self {
            skip: Some(reason),
            ..Self::base(descriptor, CheckStatus::Skipped, 0)
        }
    }

    /// Attach scan findings.
    pub fn with_findings(mut self, findings: Vec<Finding>) -> Self {
        self.findings = findings;
        self
    }

    pub fn is_failed(&self) -> bool {
        self.status == CheckStatus::Failed
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.failure, Some(FailureKind::Timeout { .. }))
    }
}
