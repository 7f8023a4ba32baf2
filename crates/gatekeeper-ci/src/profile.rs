//! Check registries: the ordered check sequence of each profile.
//!
//! Order is execution and report order, and encodes priority: the security
//! scan first, later-stage checks (build, performance, E2E) last.

use gatekeeper_core::{CheckDescriptor, ProjectContext, Requirement, ScanConfig};
use serde::{Deserialize, Serialize};

/// Default timeout for most checks.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Timeout for long-running checks (test suite, production build, E2E).
pub const LONG_TIMEOUT_SECS: u64 = 600;

/// Bound on an availability probe.
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 30;

const SKIPPED_BY_FLAG: &str = "skipped by flag";

const LIGHTHOUSE_PROBE: &[&str] = &["npx", "lighthouse", "--version"];

/// Orchestration profiles.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    /// Fast, deploy-agnostic checks.
    #[default]
    Core,

    /// Pre-deploy suite: adds dependency audit, performance audit and E2E.
    Full,
}

impl Profile {
    /// Get the profile name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            Profile::Core => "core",
            Profile::Full => "full",
        }
    }

    /// Build the ordered check sequence for this profile.
    pub fn descriptors(&self, options: &RunOptions, ctx: &ProjectContext) -> Vec<CheckDescriptor> {
        let mut descriptors = match self {
            Profile::Core => core_checks(options),
            Profile::Full => full_checks(options, ctx),
        };

        if let Some(timeout_secs) = options.timeout_override {
            for descriptor in &mut descriptors {
                descriptor.timeout_secs = timeout_secs;
            }
        }

        descriptors
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "core" => Ok(Profile::Core),
            "full" => Ok(Profile::Full),
            other => Err(format!("unknown profile: {other} (expected core or full)")),
        }
    }
}

/// Run-wide settings, built once and read-only for the duration of a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunOptions {
    pub profile: Profile,

    /// URL audited by the performance check.
    pub target_url: Option<String>,

    pub skip_tests: bool,
    pub skip_build: bool,
    pub no_e2e: bool,

    /// Replaces every check's timeout when set.
    pub timeout_override: Option<u64>,

    /// Bound on each availability probe.
    pub probe_timeout_secs: u64,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            profile: Profile::Core,
            target_url: None,
            skip_tests: false,
            skip_build: false,
            no_e2e: false,
            timeout_override: None,
            probe_timeout_secs: DEFAULT_PROBE_TIMEOUT_SECS,
        }
    }
}

/// Quote a value for inclusion in an `sh -c` command line.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

fn lighthouse_command(url: &str) -> String {
    format!(
        "npx lighthouse {} --output=json --chrome-flags=\"--headless\" --only-categories=performance,accessibility,best-practices,seo",
        shell_quote(url)
    )
}

fn lighthouse(options: &RunOptions, url: &str) -> CheckDescriptor {
    CheckDescriptor::command(
        "Lighthouse Audit",
        "Performance",
        lighthouse_command(url),
        DEFAULT_TIMEOUT_SECS,
    )
    .requires(Requirement::setting("target-url", options.target_url.is_some()))
    .requires(Requirement::tool("lighthouse", LIGHTHOUSE_PROBE))
}

fn core_checks(options: &RunOptions) -> Vec<CheckDescriptor> {
    let mut checks = vec![
        // P0
        CheckDescriptor::secret_scan("Security Scan", "Security", ScanConfig::default(), DEFAULT_TIMEOUT_SECS),
        // P1
        CheckDescriptor::command("Lint Check", "Code Quality", "npm run lint", DEFAULT_TIMEOUT_SECS)
            .critical()
            .requires(Requirement::capability("lint")),
        CheckDescriptor::command("TypeScript Check", "Code Quality", "npx tsc --noEmit", DEFAULT_TIMEOUT_SECS)
            .critical(),
        // P2
        CheckDescriptor::command("Schema Validation", "Data Layer", "npx drizzle-kit check", DEFAULT_TIMEOUT_SECS)
            .requires(Requirement::any_capability(&["db:push", "db:generate"])),
        // P3
        CheckDescriptor::command("Test Runner", "Testing", "npm run test", DEFAULT_TIMEOUT_SECS)
            .requires(Requirement::capability("test"))
            .disabled_if(options.skip_tests, SKIPPED_BY_FLAG),
        // P4
        CheckDescriptor::command("Build Check", "Build", "npm run build", DEFAULT_TIMEOUT_SECS)
            .critical()
            .requires(Requirement::capability("build"))
            .disabled_if(options.skip_build, SKIPPED_BY_FLAG),
    ];

    // Performance checks only join the core profile when a URL is given.
    if let Some(url) = &options.target_url {
        checks.push(lighthouse(options, url));
    }

    checks
}

fn full_checks(options: &RunOptions, ctx: &ProjectContext) -> Vec<CheckDescriptor> {
    let url = options.target_url.as_deref().unwrap_or_default();

    let mut checks = vec![
        CheckDescriptor::secret_scan("Security Scan", "Security", ScanConfig::extended(), DEFAULT_TIMEOUT_SECS),
        CheckDescriptor::command(
            "Dependency Audit",
            "Security",
            "npm audit --audit-level=high",
            DEFAULT_TIMEOUT_SECS,
        ),
        CheckDescriptor::command("Lint Check", "Code Quality", "npm run lint", DEFAULT_TIMEOUT_SECS)
            .critical()
            .requires(Requirement::capability("lint")),
        CheckDescriptor::command("TypeScript Check", "Code Quality", "npx tsc --noEmit", DEFAULT_TIMEOUT_SECS)
            .critical(),
        CheckDescriptor::command("Drizzle Schema Check", "Data Layer", "npx drizzle-kit check", DEFAULT_TIMEOUT_SECS)
            .requires(Requirement::any_capability(&["db:push", "db:generate"])),
        CheckDescriptor::command("Test Suite", "Testing", "npm run test", LONG_TIMEOUT_SECS)
            .requires(Requirement::capability("test"))
            .disabled_if(options.skip_tests, SKIPPED_BY_FLAG),
        CheckDescriptor::command("Production Build", "Build", "npm run build", LONG_TIMEOUT_SECS)
            .critical()
            .requires(Requirement::capability("build"))
            .disabled_if(options.skip_build, SKIPPED_BY_FLAG),
        lighthouse(options, url),
    ];

    if !options.no_e2e {
        let e2e = if ctx.has_capability("test:e2e") {
            CheckDescriptor::command("Playwright E2E", "E2E Testing", "npm run test:e2e", LONG_TIMEOUT_SECS)
                .requires(Requirement::capability("test:e2e"))
        } else {
            CheckDescriptor::command("Playwright E2E", "E2E Testing", "npx playwright test", LONG_TIMEOUT_SECS)
                .requires(Requirement::file("playwright.config.ts"))
        };
        checks.push(e2e);
    }

    checks
}
