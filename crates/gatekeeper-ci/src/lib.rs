//! Gatekeeper CI - validation pipeline engine
//!
//! Provides the check orchestrator that:
//! - Builds the ordered check registry of a profile
//! - Resolves each check's prerequisites before running it
//! - Executes checks sequentially under per-check timeouts
//! - Aggregates outcomes into a report and evaluates the gate

pub mod fingerprint;
pub mod gate;
pub mod invoker;
pub mod observer;
pub mod pipeline;
pub mod profile;
pub mod resolver;
pub mod runner;

// Re-export key types
pub use fingerprint::registry_digest;
pub use gate::{CiGate, GateVerdict};
pub use invoker::{CollaboratorInvoker, CollaboratorOutput, InvokeError, SystemInvoker};
pub use observer::{
    ConsoleObserver, FanoutObserver, JsonLinesObserver, NullObserver, ProgressObserver,
    RecordingObserver,
};
pub use pipeline::CiPipeline;
pub use profile::{Profile, RunOptions, DEFAULT_PROBE_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS, LONG_TIMEOUT_SECS};
pub use resolver::{AvailabilityResolver, CommandProbe, ProbeError, ToolProbe};
pub use runner::{classify, CheckRunner};
