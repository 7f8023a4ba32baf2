//! Gate evaluation for pass/fail criteria.

use gatekeeper_core::{CheckOutcome, FailureKind, RunReport};
use serde::{Deserialize, Serialize};

/// Gate evaluation verdict.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GateVerdict {
    /// Whether the gate passed.
    pub passed: bool,

    /// One entry per failed check, in run order (empty if passed).
    pub violations: Vec<String>,

    /// Summary message.
    pub message: String,
}

/// Gate evaluation rules.
pub struct CiGate;

impl CiGate {
    /// Evaluate a run report.
    ///
    /// Gate rule:
    /// - Every failed check is a violation; critical ones are flagged
    /// - Skipped checks are never violations
    /// - The gate passes iff there are no violations
    pub fn evaluate(report: &RunReport) -> GateVerdict {
        let violations: Vec<String> = report
            .outcomes
            .iter()
            .filter(|o| o.is_failed())
            .map(violation)
            .collect();

        let passed = violations.is_empty();
        let message = if passed {
            if report.skipped > 0 {
                format!("All executed checks passed ({} skipped)", report.skipped)
            } else {
                "All checks passed".to_string()
            }
        } else {
            let critical = report.critical_failures().count();
            format!(
                "Gate failed with {} violation(s), {} critical",
                violations.len(),
                critical
            )
        };

        GateVerdict {
            passed,
            violations,
            message,
        }
    }
}

fn violation(outcome: &CheckOutcome) -> String {
    let cause = match &outcome.failure {
        Some(FailureKind::NonZeroExit { exit_code: Some(code) }) => format!("exited with code {code}"),
        Some(FailureKind::NonZeroExit { exit_code: None }) => "terminated by signal".to_string(),
        Some(FailureKind::Findings { count }) => format!("{count} potential secret(s) found"),
        Some(FailureKind::Timeout { seconds }) => format!("timed out after {seconds}s"),
        Some(FailureKind::LaunchError) | Some(FailureKind::Internal) | None => format!(
            "failed: {}",
            outcome.error_detail.as_deref().unwrap_or("unknown error")
        ),
    };

    let prefix = if outcome.critical { "[critical] " } else { "" };
    format!("{prefix}Check '{}' {cause}", outcome.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatekeeper_core::{CheckDescriptor, SkipKind, SkipReason};

    fn lint() -> CheckDescriptor {
        CheckDescriptor::command("Lint Check", "Code Quality", "npm run lint", 300).critical()
    }

    fn build() -> CheckDescriptor {
        CheckDescriptor::command("Build Check", "Build", "npm run build", 300)
    }

    #[test]
    fn test_empty_report_passes() {
        let verdict = CiGate::evaluate(&RunReport::aggregate(vec![]));
        assert!(verdict.passed);
        assert!(verdict.violations.is_empty());
    }

    #[test]
    fn test_skips_are_not_violations() {
        let report = RunReport::aggregate(vec![
            CheckOutcome::passed(&lint(), 10, String::new(), String::new()),
            CheckOutcome::skipped(&build(), SkipReason::new(SkipKind::MissingCapability, "no build declared")),
        ]);
        let verdict = CiGate::evaluate(&report);
        assert!(verdict.passed);
        assert_eq!(verdict.message, "All executed checks passed (1 skipped)");
    }

    #[test]
    fn test_failures_listed_in_order_with_critical_flag() {
        let report = RunReport::aggregate(vec![
            CheckOutcome::failed(
                &lint(),
                10,
                FailureKind::NonZeroExit { exit_code: Some(1) },
                String::new(),
                String::new(),
            ),
            CheckOutcome::errored(&build(), 3000, FailureKind::Timeout { seconds: 3 }, "timeout"),
        ]);
        let verdict = CiGate::evaluate(&report);
        assert!(!verdict.passed);
        assert_eq!(
            verdict.violations,
            vec![
                "[critical] Check 'Lint Check' exited with code 1".to_string(),
                "Check 'Build Check' timed out after 3s".to_string(),
            ]
        );
        assert_eq!(verdict.message, "Gate failed with 2 violation(s), 1 critical");
    }

    #[test]
    fn test_gate_agrees_with_report_verdict() {
        let report = RunReport::aggregate(vec![CheckOutcome::errored(
            &build(),
            1,
            FailureKind::LaunchError,
            "npm: not found",
        )]);
        let verdict = CiGate::evaluate(&report);
        assert_eq!(verdict.passed, report.verdict);
        assert_eq!(verdict.violations, vec!["Check 'Build Check' failed: npm: not found"]);
    }
}
