//! Domain-level error taxonomy for Gatekeeper.
//!
//! Only setup errors live here. Anything that goes wrong while a single
//! check runs is captured into its `CheckOutcome` instead.

use std::path::PathBuf;

/// Errors that prevent a run from starting.
#[derive(Debug, thiserror::Error)]
pub enum GatekeeperError {
    #[error("project path does not exist: {0}")]
    ProjectNotFound(PathBuf),

    #[error("project manifest not found: {0}")]
    ManifestNotFound(PathBuf),

    #[error("project manifest unreadable: {path}: {source}")]
    ManifestUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("project manifest invalid: {path}: {source}")]
    ManifestInvalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no checks registered for profile {0}")]
    EmptyRegistry(String),

    #[error("duplicate check name in registry: {0}")]
    DuplicateCheck(String),

    #[error("check {0} has an empty category")]
    EmptyCategory(String),

    #[error("check {0} has a zero timeout")]
    ZeroTimeout(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for Gatekeeper setup operations.
pub type Result<T> = std::result::Result<T, GatekeeperError>;
