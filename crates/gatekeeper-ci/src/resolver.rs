//! Availability resolution: decide, before running, whether a check's
//! prerequisites hold.
//!
//! The resolver never invokes the check itself. Tool presence probes are
//! bounded, and any error while probing means "unavailable", never a run
//! failure.

use async_trait::async_trait;
use gatekeeper_core::{
    AvailabilityDecision, CheckDescriptor, ProjectContext, Requirement, SkipKind, SkipReason,
};
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;

use crate::profile::DEFAULT_PROBE_TIMEOUT_SECS;

/// Errors raised by a presence probe. Always recovered into a skip.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("probe command is empty")]
    EmptyCommand,

    #[error("failed to launch probe: {0}")]
    Launch(String),

    #[error("probe timed out after {0}s")]
    Timeout(u64),

    #[error("probe did not complete: {0}")]
    Wait(String),
}

/// Presence probe for optional external tools.
#[async_trait]
pub trait ToolProbe: Send + Sync {
    /// `Ok(true)` when the tool is present, `Ok(false)` when the probe ran
    /// and reported it missing.
    async fn probe(&self, command: &[String], cwd: &Path, timeout: Duration) -> Result<bool, ProbeError>;
}

/// Probe that runs the probe command and treats exit code 0 as present.
pub struct CommandProbe;

#[async_trait]
impl ToolProbe for CommandProbe {
    async fn probe(&self, command: &[String], cwd: &Path, timeout: Duration) -> Result<bool, ProbeError> {
        let (exe, args) = command.split_first().ok_or(ProbeError::EmptyCommand)?;

        let mut child = Command::new(exe)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ProbeError::Launch(e.to_string()))?;

        match tokio::time::timeout(timeout, child.wait()).await {
            Ok(Ok(status)) => Ok(status.success()),
            Ok(Err(e)) => Err(ProbeError::Wait(e.to_string())),
            Err(_) => {
                let _ = child.kill().await;
                Err(ProbeError::Timeout(timeout.as_secs()))
            }
        }
    }
}

/// Resolves each descriptor to `Runnable` or a skip reason.
pub struct AvailabilityResolver {
    probe: Arc<dyn ToolProbe>,
    probe_timeout: Duration,
}

impl AvailabilityResolver {
    pub fn new(probe: Arc<dyn ToolProbe>, probe_timeout: Duration) -> Self {
        Self { probe, probe_timeout }
    }

    /// Resolver backed by real probe processes.
    pub fn system() -> Self {
        Self::new(
            Arc::new(CommandProbe),
            Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS),
        )
    }

    pub fn with_probe_timeout(mut self, probe_timeout: Duration) -> Self {
        self.probe_timeout = probe_timeout;
        self
    }

    /// Decide whether `descriptor` can run against `ctx`.
    ///
    /// Cheap checks (disabled, capabilities, files, settings) are evaluated
    /// before any tool probe is launched.
    pub async fn resolve(&self, descriptor: &CheckDescriptor, ctx: &ProjectContext) -> AvailabilityDecision {
        if let Some(reason) = &descriptor.disabled {
            return AvailabilityDecision::skip(SkipKind::Disabled, reason.clone());
        }

        for requirement in &descriptor.requires {
            match requirement {
                Requirement::Capability { any_of } => {
                    if !any_of.iter().any(|c| ctx.has_capability(c)) {
                        return AvailabilityDecision::skip(
                            SkipKind::MissingCapability,
                            format!("no {} declared", any_of.join(" or ")),
                        );
                    }
                }
                Requirement::File { path } => {
                    if !ctx.has_file(path) {
                        return AvailabilityDecision::skip(
                            SkipKind::MissingFile,
                            format!("no {} found", path.display()),
                        );
                    }
                }
                Requirement::Setting { name, provided } => {
                    if !provided {
                        return AvailabilityDecision::skip(
                            SkipKind::MissingSetting,
                            format!("no {name} provided"),
                        );
                    }
                }
                Requirement::Tool { .. } => {}
            }
        }

        for requirement in &descriptor.requires {
            if let Requirement::Tool { name, probe } = requirement {
                match self.probe.probe(probe, ctx.root(), self.probe_timeout).await {
                    Ok(true) => {}
                    Ok(false) => {
                        return AvailabilityDecision::Skip(
                            SkipReason::new(SkipKind::ToolUnavailable, "tool unavailable")
                                .with_detail(format!("{name} not installed")),
                        );
                    }
                    Err(e) => {
                        gatekeeper_core::obs::emit_probe_failed(&descriptor.name, name, &e);
                        return AvailabilityDecision::Skip(
                            SkipReason::new(SkipKind::ProbeFailed, "tool unavailable")
                                .with_detail(format!("{name}: {e}")),
                        );
                    }
                }
            }
        }

        AvailabilityDecision::Runnable
    }
}
