//! Gatekeeper Core Library
//!
//! Domain model and in-process building blocks for the validation pipeline:
//! check descriptors, outcomes, run reports, progress events, project
//! context loading, the secret heuristic scanner and report rendering.

pub mod domain;
pub mod obs;
pub mod project;
pub mod reporting;
pub mod scanner;
pub mod telemetry;

pub use domain::{
    validate_registry, AvailabilityDecision, CategoryGroup, CheckDescriptor, CheckOutcome,
    CheckStatus, FailureKind, Finding, GatekeeperError, Invocation, ProgressEvent, ProgressPhase,
    Requirement, Result, RunMetadata, RunReport, SkipKind, SkipReason,
};
pub use project::{ProjectContext, MANIFEST_FILE};
pub use reporting::{excerpt, render_json, render_text, write_report_json};
pub use scanner::{scan, ScanConfig, ScanReport};
pub use telemetry::init_tracing;
