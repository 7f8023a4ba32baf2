//! Run report: pure aggregation over an ordered outcome sequence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use crate::domain::outcome::{CheckOutcome, CheckStatus};

/// Outcomes of one category, in first-seen order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryGroup {
    pub category: String,

    /// Check names in original relative order.
    pub checks: Vec<String>,

    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Decorative run metadata. Never affects the verdict.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunMetadata {
    pub run_id: Uuid,
    pub profile: String,
    pub project_root: PathBuf,

    /// Digest of the ordered registry the run executed.
    pub registry_digest: String,

    pub started_at: Option<DateTime<Utc>>,

    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Aggregate result of a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunReport {
    #[serde(flatten)]
    pub metadata: RunMetadata,

    /// Overall verdict: true iff no check failed.
    pub verdict: bool,

    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,

    pub categories: Vec<CategoryGroup>,

    /// One outcome per descriptor, in registry order.
    pub outcomes: Vec<CheckOutcome>,
}

impl RunReport {
    /// Aggregate an ordered outcome sequence.
    ///
    /// Deterministic: the same sequence always yields the same counts,
    /// grouping and verdict.
    pub fn aggregate(outcomes: Vec<CheckOutcome>) -> Self {
        let count = |status: CheckStatus| outcomes.iter().filter(|o| o.status == status).count();
        let passed = count(CheckStatus::Passed);
        let failed = count(CheckStatus::Failed);
        let skipped = count(CheckStatus::Skipped);

        let mut categories: Vec<CategoryGroup> = Vec::new();
        for outcome in &outcomes {
            let idx = match categories.iter().position(|g| g.category == outcome.category) {
                Some(idx) => idx,
                None => {
                    categories.push(CategoryGroup {
                        category: outcome.category.clone(),
                        checks: Vec::new(),
                        passed: 0,
                        failed: 0,
                        skipped: 0,
                    });
                    categories.len() - 1
                }
            };
            let group = &mut categories[idx];
            group.checks.push(outcome.name.clone());
            match outcome.status {
                CheckStatus::Passed => group.passed += 1,
                CheckStatus::Failed => group.failed += 1,
                CheckStatus::Skipped => group.skipped += 1,
            }
        }

        let metadata = RunMetadata {
            duration_ms: outcomes.iter().map(|o| o.duration_ms).sum(),
            ..RunMetadata::default()
        };

        Self {
            metadata,
            verdict: failed == 0,
            total: outcomes.len(),
            passed,
            failed,
            skipped,
            categories,
            outcomes,
        }
    }

    /// Replace the decorative metadata.
    pub fn with_metadata(mut self, metadata: RunMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Look up an outcome by check name.
    pub fn outcome(&self, name: &str) -> Option<&CheckOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }

    /// Outcomes of one category in original order.
    pub fn outcomes_in<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a CheckOutcome> + 'a {
        self.outcomes.iter().filter(move |o| o.category == category)
    }

    /// Failed outcomes flagged critical.
    pub fn critical_failures(&self) -> impl Iterator<Item = &CheckOutcome> {
        self.outcomes.iter().filter(|o| o.critical && o.is_failed())
    }

    /// Process exit code for this report: 0 on pass, 1 on fail.
    pub fn exit_code(&self) -> u8 {
        if self.verdict {
            0
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::availability::{SkipKind, SkipReason};
    use crate::domain::descriptor::CheckDescriptor;
    use crate::domain::outcome::FailureKind;

    fn descriptor(name: &str, category: &str) -> CheckDescriptor {
        CheckDescriptor::command(name, category, "true", 10)
    }

    fn passed(name: &str, category: &str) -> CheckOutcome {
        CheckOutcome::passed(&descriptor(name, category), 5, String::new(), String::new())
    }

    fn failed(name: &str, category: &str) -> CheckOutcome {
        CheckOutcome::failed(
            &descriptor(name, category),
            7,
            FailureKind::NonZeroExit { exit_code: Some(1) },
            String::new(),
            "boom".to_string(),
        )
    }

    fn skipped(name: &str, category: &str) -> CheckOutcome {
        CheckOutcome::skipped(
            &descriptor(name, category),
            SkipReason::new(SkipKind::MissingCapability, "no x declared"),
        )
    }

    #[test]
    fn test_counts_and_verdict() {
        let report = RunReport::aggregate(vec![
            passed("a", "A"),
            failed("b", "B"),
            skipped("c", "A"),
        ]);
        assert_eq!(report.total, 3);
        assert_eq!(report.passed, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.skipped, 1);
        assert!(!report.verdict);
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn test_all_skipped_passes() {
        let report = RunReport::aggregate(vec![skipped("a", "A"), skipped("b", "A")]);
        assert!(report.verdict);
        assert_eq!(report.passed, 0);
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_category_grouping_preserves_first_seen_order() {
        let report = RunReport::aggregate(vec![
            passed("a1", "A"),
            passed("b1", "B"),
            failed("a2", "A"),
        ]);
        let names: Vec<&str> = report.categories.iter().map(|g| g.category.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(report.categories[0].checks, vec!["a1", "a2"]);
        assert_eq!(report.categories[0].failed, 1);

        let in_a: Vec<&str> = report.outcomes_in("A").map(|o| o.name.as_str()).collect();
        assert_eq!(in_a, vec!["a1", "a2"]);
    }

    #[test]
    fn test_duration_sums_outcomes_until_metadata_set() {
        let report = RunReport::aggregate(vec![passed("a", "A"), failed("b", "A")]);
        assert_eq!(report.metadata.duration_ms, 12);

        let report = report.with_metadata(RunMetadata {
            profile: "core".to_string(),
            duration_ms: 99,
            ..RunMetadata::default()
        });
        assert_eq!(report.metadata.duration_ms, 99);
        assert_eq!(report.metadata.profile, "core");
    }

    #[test]
    fn test_aggregate_is_deterministic() {
        let outcomes = vec![passed("a", "A"), failed("b", "B"), skipped("c", "C")];
        assert_eq!(
            RunReport::aggregate(outcomes.clone()),
            RunReport::aggregate(outcomes)
        );
    }
}
