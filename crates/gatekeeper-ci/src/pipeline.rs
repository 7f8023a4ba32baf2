//! Run orchestration: resolve, execute and aggregate a registry in order.

use chrono::Utc;
use gatekeeper_core::obs;
use gatekeeper_core::{
    excerpt, validate_registry, AvailabilityDecision, CheckDescriptor, CheckOutcome, CheckStatus,
    ProgressEvent, ProgressPhase, ProjectContext, Result, RunMetadata, RunReport,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, Instrument};
use uuid::Uuid;

use crate::fingerprint::registry_digest;
use crate::observer::{NullObserver, ProgressObserver};
use crate::resolver::AvailabilityResolver;
use crate::runner::CheckRunner;

/// Characters of stderr carried on a failure event.
const EVENT_DETAIL_CHARS: usize = 300;

/// Sequential orchestrator.
///
/// Checks run one at a time in registry order; a failing check never stops
/// the run. Every descriptor yields exactly one outcome.
pub struct CiPipeline {
    resolver: AvailabilityResolver,
    runner: CheckRunner,
    observer: Arc<dyn ProgressObserver>,
}

impl CiPipeline {
    pub fn new(resolver: AvailabilityResolver, runner: CheckRunner, observer: Arc<dyn ProgressObserver>) -> Self {
        Self {
            resolver,
            runner,
            observer,
        }
    }

    /// Pipeline backed by real probes and processes, with no observer.
    pub fn system() -> Self {
        Self::new(
            AvailabilityResolver::system(),
            CheckRunner::system(),
            Arc::new(NullObserver),
        )
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Execute `descriptors` against `ctx` and aggregate the report.
    ///
    /// Only an invalid registry is an error; per-check failures are
    /// recorded as outcomes.
    pub async fn run(
        &self,
        ctx: &ProjectContext,
        profile: &str,
        descriptors: &[CheckDescriptor],
    ) -> Result<RunReport> {
        validate_registry(profile, descriptors)?;

        let run_id = Uuid::new_v4();
        let span = obs::run_span(&run_id.to_string(), profile);

        self.run_validated(ctx, profile, descriptors, run_id)
            .instrument(span)
            .await
    }

    async fn run_validated(
        &self,
        ctx: &ProjectContext,
        profile: &str,
        descriptors: &[CheckDescriptor],
        run_id: Uuid,
    ) -> Result<RunReport> {
        let started_at = Utc::now();
        let start = Instant::now();
        let run_id_str = run_id.to_string();
        let registry_digest = registry_digest(descriptors);

        obs::emit_run_started(&run_id_str, &ctx.root().display().to_string(), descriptors.len());

        let mut seq = 0u64;
        let mut outcomes = Vec::with_capacity(descriptors.len());

        for descriptor in descriptors {
            let outcome = self.run_one(descriptor, ctx, &mut seq).await;
            outcomes.push(outcome);
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        let report = RunReport::aggregate(outcomes).with_metadata(RunMetadata {
            run_id,
            profile: profile.to_string(),
            project_root: ctx.root().to_path_buf(),
            registry_digest,
            started_at: Some(started_at),
            duration_ms,
        });

        obs::emit_run_finished(
            &run_id_str,
            duration_ms,
            report.passed,
            report.failed,
            report.skipped,
            report.verdict,
        );
        info!(run_id = %run_id_str, verdict = report.verdict, "Validation run completed");

        Ok(report)
    }

    async fn run_one(&self, descriptor: &CheckDescriptor, ctx: &ProjectContext, seq: &mut u64) -> CheckOutcome {
        let mut emit = |phase: ProgressPhase| {
            *seq += 1;
            ProgressEvent::new(*seq, phase, &descriptor.name, &descriptor.category)
        };

        if let AvailabilityDecision::Skip(reason) = self.resolver.resolve(descriptor, ctx).await {
            obs::emit_check_skipped(&descriptor.name, &reason.message);
            self.observer
                .on_event(&emit(ProgressPhase::Skip).with_detail(reason.message.clone()));
            return CheckOutcome::skipped(descriptor, reason);
        }

        obs::emit_check_started(&descriptor.name, &descriptor.category, descriptor.invocation.label());
        self.observer.on_event(&emit(ProgressPhase::Start));

        let timeout = Duration::from_secs(descriptor.timeout_secs);
        let outcome = self.runner.execute(descriptor, ctx, timeout).await;

        obs::emit_check_finished(&descriptor.name, &outcome.status.to_string(), outcome.duration_ms);
        let event = finish_event(emit(terminal_phase(&outcome)), &outcome);
        self.observer.on_event(&event);

        outcome
    }
}

fn terminal_phase(outcome: &CheckOutcome) -> ProgressPhase {
    match outcome.status {
        CheckStatus::Passed => ProgressPhase::Success,
        CheckStatus::Skipped => ProgressPhase::Skip,
        CheckStatus::Failed if outcome.is_timeout() => ProgressPhase::Timeout,
        CheckStatus::Failed => ProgressPhase::Failure,
    }
}

fn finish_event(event: ProgressEvent, outcome: &CheckOutcome) -> ProgressEvent {
    let event = event.with_duration(outcome.duration_ms);
    if !outcome.is_failed() {
        return event;
    }

    if let Some(detail) = &outcome.error_detail {
        return event.with_detail(detail.clone());
    }
    if !outcome.findings.is_empty() {
        return event.with_detail(format!("{} finding(s)", outcome.findings.len()));
    }
    let stderr = outcome.stderr.trim();
    if stderr.is_empty() {
        event
    } else {
        event.with_detail(excerpt(stderr, EVENT_DETAIL_CHARS))
    }
}
