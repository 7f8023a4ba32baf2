//! Domain model: descriptors, availability, outcomes, reports, events, errors.

pub mod availability;
pub mod descriptor;
pub mod error;
pub mod event;
pub mod outcome;
pub mod report;

pub use availability::{AvailabilityDecision, SkipKind, SkipReason};
pub use descriptor::{validate_registry, CheckDescriptor, Invocation, Requirement};
pub use error::{GatekeeperError, Result};
pub use event::{ProgressEvent, ProgressPhase};
pub use outcome::{CheckOutcome, CheckStatus, FailureKind, Finding};
pub use report::{CategoryGroup, RunMetadata, RunReport};
