//! Structured observability hooks for the run lifecycle.
//!
//! Events are emitted at `info!` (skips and probe failures at `debug!` and
//! `warn!`). All lines inside a run carry the run id through [`run_span`].

use tracing::{debug, info, warn};

/// Span tagged with the run id and profile; instrument the run future with it.
pub fn run_span(run_id: &str, profile: &str) -> tracing::Span {
    tracing::info_span!("gatekeeper.run", run_id = %run_id, profile = %profile)
}

/// Emit event: run started.
pub fn emit_run_started(run_id: &str, project_root: &str, checks: usize) {
    info!(event = "run.started", run_id = %run_id, project = %project_root, checks = checks);
}

/// Emit event: a check is about to execute.
pub fn emit_check_started(name: &str, category: &str, invocation: &str) {
    info!(event = "check.started", check = %name, category = %category, invocation = %invocation);
}

/// Emit event: a check finished executing.
pub fn emit_check_finished(name: &str, status: &str, duration_ms: u64) {
    info!(event = "check.finished", check = %name, status = %status, duration_ms = duration_ms);
}

/// Emit event: a check was skipped.
pub fn emit_check_skipped(name: &str, reason: &str) {
    debug!(event = "check.skipped", check = %name, reason = %reason);
}

/// Emit event: an availability probe could not complete (warning level).
pub fn emit_probe_failed(name: &str, tool: &str, error: &dyn std::fmt::Display) {
    warn!(event = "probe.failed", check = %name, tool = %tool, error = %error);
}

/// Emit event: run finished with totals and verdict.
pub fn emit_run_finished(run_id: &str, duration_ms: u64, passed: usize, failed: usize, skipped: usize, verdict: bool) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        passed = passed,
        failed = failed,
        skipped = skipped,
        verdict = verdict,
    );
}
