//! Check descriptors: the static definition of one validation step.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

use crate::domain::error::{GatekeeperError, Result};
use crate::scanner::ScanConfig;

/// How the collaborator behind a check is invoked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Invocation {
    /// Shell command executed in the project root.
    Command { command: String },

    /// In-process secret heuristic scan over the project sources.
    SecretScan { config: ScanConfig },
}

impl Invocation {
    /// Short label for logs and reports.
    pub fn label(&self) -> &str {
        match self {
            Invocation::Command { command } => command,
            Invocation::SecretScan { .. } => "in-process",
        }
    }
}

/// A prerequisite that must hold before a check is worth running.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Requirement {
    /// At least one of these project actions must be declared.
    Capability { any_of: Vec<String> },

    /// A file must exist relative to the project root.
    File { path: PathBuf },

    /// A run setting (e.g. a target URL) must have been provided.
    Setting { name: String, provided: bool },

    /// An optional external tool, detected with a presence probe.
    Tool { name: String, probe: Vec<String> },
}

impl Requirement {
    pub fn capability(name: &str) -> Self {
        Requirement::Capability {
            any_of: vec![name.to_string()],
        }
    }

    pub fn any_capability(names: &[&str]) -> Self {
        Requirement::Capability {
            any_of: names.iter().map(|n| n.to_string()).collect(),
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Requirement::File { path: path.into() }
    }

    pub fn setting(name: &str, provided: bool) -> Self {
        Requirement::Setting {
            name: name.to_string(),
            provided,
        }
    }

    pub fn tool(name: &str, probe: &[&str]) -> Self {
        Requirement::Tool {
            name: name.to_string(),
            probe: probe.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Identity and execution recipe for one validation step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckDescriptor {
    /// Human-readable label, unique within a run.
    pub name: String,

    /// Grouping label for reporting.
    pub category: String,

    /// How the collaborator is invoked.
    pub invocation: Invocation,

    /// Failure is flagged as urgent in the report.
    pub critical: bool,

    /// Maximum wall-clock time allowed.
    pub timeout_secs: u64,

    /// Prerequisites checked by the availability resolver.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<Requirement>,

    /// Set when the check was switched off for this run, with the reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<String>,
}

impl CheckDescriptor {
    /// Create a check that runs a shell command.
    pub fn command(name: &str, category: &str, command: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            name: name.to_string(),
            category: category.to_string(),
            invocation: Invocation::Command {
                command: command.into(),
            },
            critical: false,
            timeout_secs,
            requires: Vec::new(),
            disabled: None,
        }
    }

    /// Create the in-process secret scan check.
    pub fn secret_scan(name: &str, category: &str, config: ScanConfig, timeout_secs: u64) -> Self {
        Self {
            name: name.to_string(),
            category: category.to_string(),
            invocation: Invocation::SecretScan { config },
            critical: true,
            timeout_secs,
            requires: Vec::new(),
            disabled: None,
        }
    }

    /// Mark this check as critical.
    pub fn critical(mut self) -> Self {
        self.critical = true;
        self
    }

    /// Add a prerequisite.
    pub fn requires(mut self, requirement: Requirement) -> Self {
        self.requires.push(requirement);
        self
    }

    /// Disable this check for the run.
    pub fn disabled(mut self, reason: impl Into<String>) -> Self {
        self.disabled = Some(reason.into());
        self
    }

    /// Disable this check when `condition` holds.
    pub fn disabled_if(self, condition: bool, reason: &str) -> Self {
        if condition {
            self.disabled(reason)
        } else {
            self
        }
    }

    /// Override the timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Validate an ordered registry: non-empty, unique names, non-empty
/// categories, positive timeouts.
pub fn validate_registry(profile: &str, descriptors: &[CheckDescriptor]) -> Result<()> {
    if descriptors.is_empty() {
        return Err(GatekeeperError::EmptyRegistry(profile.to_string()));
    }

    let mut seen = HashSet::new();
    for descriptor in descriptors {
        if descriptor.category.trim().is_empty() {
            return Err(GatekeeperError::EmptyCategory(descriptor.name.clone()));
        }
        if descriptor.timeout_secs == 0 {
            return Err(GatekeeperError::ZeroTimeout(descriptor.name.clone()));
        }
        if !seen.insert(descriptor.name.as_str()) {
            return Err(GatekeeperError::DuplicateCheck(descriptor.name.clone()));
        }
    }

    Ok(())
}
