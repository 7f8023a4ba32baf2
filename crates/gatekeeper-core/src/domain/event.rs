//! Progress events emitted in execution order while a run is underway.
//!
//! Events are purely observational. Consumers render them as text,
//! structured logs, or JSON lines; none of them can influence an outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle phase of a single check.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProgressPhase {
    Start,
    Success,
    Failure,
    Skip,
    Timeout,
}

/// A single progress event in a run's execution trace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgressEvent {
    /// Monotonically increasing sequence number within the run.
    pub seq: u64,

    pub phase: ProgressPhase,
    pub check_name: String,
    pub category: String,

    /// When the event occurred.
    pub timestamp: DateTime<Utc>,

    /// Elapsed time, present on terminal phases of executed checks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,

    /// Skip reason, error detail or stderr excerpt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ProgressEvent {
    /// Create a new progress event stamped with the current time.
    pub fn new(seq: u64, phase: ProgressPhase, check_name: &str, category: &str) -> Self {
        Self {
            seq,
            phase,
            check_name: check_name.to_string(),
            category: category.to_string(),
            timestamp: Utc::now(),
            duration_ms: None,
            detail: None,
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}
