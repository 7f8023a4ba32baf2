//! Report rendering: human-readable text and machine-readable JSON.

use anyhow::{Context, Result};
use std::path::Path;

use crate::domain::outcome::{CheckOutcome, CheckStatus};
use crate::domain::report::RunReport;

/// Characters of stderr shown per failed check.
pub const STDERR_EXCERPT_CHARS: usize = 300;

/// Findings listed per failed scan before eliding the rest.
pub const MAX_FINDINGS_SHOWN: usize = 5;

const RULE_WIDTH: usize = 60;

/// First `max_chars` characters of `text`, on a char boundary.
pub fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn status_marker(outcome: &CheckOutcome) -> &'static str {
    match outcome.status {
        CheckStatus::Passed => "✓",
        CheckStatus::Failed => "✗",
        CheckStatus::Skipped => "-",
    }
}

fn seconds(ms: u64) -> String {
    format!("{:.1}s", ms as f64 / 1000.0)
}

fn header(out: &mut String, title: &str) {
    let rule = "=".repeat(RULE_WIDTH);
    out.push_str(&format!("{rule}\n{title:^width$}\n{rule}\n", width = RULE_WIDTH));
}

fn render_outcome(out: &mut String, outcome: &CheckOutcome) {
    let mut line = format!("  {} {}", status_marker(outcome), outcome.name);
    match outcome.status {
        CheckStatus::Skipped => {
            if let Some(reason) = &outcome.skip {
                line.push_str(&format!(" (skipped: {reason})"));
            }
        }
        _ => line.push_str(&format!(" ({})", seconds(outcome.duration_ms))),
    }
    if outcome.critical && outcome.is_failed() {
        line.push_str(" [CRITICAL]");
    }
    out.push_str(&line);
    out.push('\n');

    if !outcome.is_failed() {
        return;
    }

    if let Some(detail) = &outcome.error_detail {
        out.push_str(&format!("      error: {detail}\n"));
    }
    for finding in outcome.findings.iter().take(MAX_FINDINGS_SHOWN) {
        out.push_str(&format!("      {finding}\n"));
    }
    if outcome.findings.len() > MAX_FINDINGS_SHOWN {
        out.push_str(&format!(
            "      ... and {} more\n",
            outcome.findings.len() - MAX_FINDINGS_SHOWN
        ));
    }
    let stderr = outcome.stderr.trim();
    if !stderr.is_empty() {
        out.push_str(&format!("      {}\n", excerpt(stderr, STDERR_EXCERPT_CHARS)));
    }
}

/// Render the report as human-readable text.
///
/// Only the duration figures vary between runs over the same outcomes.
pub fn render_text(report: &RunReport) -> String {
    let mut out = String::new();
    header(&mut out, "VALIDATION REPORT");

    if !report.metadata.profile.is_empty() {
        out.push_str(&format!("Profile: {}\n", report.metadata.profile));
    }
    out.push_str(&format!("Total Duration: {}\n", seconds(report.metadata.duration_ms)));
    out.push_str(&format!("Total Checks: {}\n", report.total));
    out.push_str(&format!("Passed: {}\n", report.passed));
    out.push_str(&format!("Failed: {}\n", report.failed));
    out.push_str(&format!("Skipped: {}\n\n", report.skipped));

    for group in &report.categories {
        out.push_str(&format!("{}:\n", group.category));
        for outcome in report.outcomes_in(&group.category) {
            render_outcome(&mut out, outcome);
        }
        out.push('\n');
    }

    if report.verdict {
        out.push_str("✓ ALL CHECKS PASSED\n");
    } else {
        out.push_str(&format!(
            "✗ VERIFICATION FAILED - {} check(s) need attention\n",
            report.failed
        ));
        let critical: Vec<&str> = report.critical_failures().map(|o| o.name.as_str()).collect();
        if !critical.is_empty() {
            out.push_str(&format!("Critical failures: {}\n", critical.join(", ")));
            out.push_str("Tip: fix critical (security, lint, type) issues first\n");
        }
    }

    out
}

/// Render the report as pretty JSON.
pub fn render_json(report: &RunReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("serialize run report")
}

/// Write the JSON report to `path`.
pub fn write_report_json(path: &Path, report: &RunReport) -> Result<()> {
    let content = render_json(report)?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}
