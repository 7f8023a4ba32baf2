//! Availability decisions produced before a check runs.

use serde::{Deserialize, Serialize};

/// Why a check was skipped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SkipKind {
    /// A required project action is not declared.
    MissingCapability,
    /// A required project file is absent.
    MissingFile,
    /// A required run setting was not provided.
    MissingSetting,
    /// The presence probe ran and reported the tool missing.
    ToolUnavailable,
    /// The presence probe itself could not complete.
    ProbeFailed,
    /// Switched off for this run.
    Disabled,
}

/// A skip decision with its human-readable reason.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkipReason {
    pub kind: SkipKind,
    pub message: String,

    /// Extra context, e.g. the probe error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl SkipReason {
    pub fn new(kind: SkipKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Output of the availability resolver for one descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvailabilityDecision {
    Runnable,
    Skip(SkipReason),
}

impl AvailabilityDecision {
    pub fn skip(kind: SkipKind, message: impl Into<String>) -> Self {
        AvailabilityDecision::Skip(SkipReason::new(kind, message))
    }

    pub fn is_runnable(&self) -> bool {
        matches!(self, AvailabilityDecision::Runnable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_reason_display_is_message() {
        let reason = SkipReason::new(SkipKind::MissingCapability, "no lint declared");
        assert_eq!(reason.to_string(), "no lint declared");
    }

    #[test]
    fn test_decision_helpers() {
        assert!(AvailabilityDecision::Runnable.is_runnable());
        let skip = AvailabilityDecision::skip(SkipKind::ToolUnavailable, "tool unavailable");
        assert!(!skip.is_runnable());
    }
}
