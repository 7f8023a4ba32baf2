//! Gatekeeper - validation pipeline CLI
//!
//! The `gatekeeper` command runs an ordered set of quality gates against a
//! project and exits with a single verdict.
//!
//! ## Commands
//!
//! - `run`: Validate a project with the core or full profile
//! - `profiles`: List the checks each profile runs
//!
//! ## Exit codes
//!
//! - `0`: every executed check passed
//! - `1`: at least one check failed
//! - `2`: the run could not start (missing project or manifest, bad arguments)

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};

use gatekeeper_ci::{
    AvailabilityResolver, CheckRunner, CiGate, CiPipeline, ConsoleObserver, JsonLinesObserver,
    NullObserver, ProgressObserver, Profile, RunOptions, DEFAULT_PROBE_TIMEOUT_SECS,
};
use gatekeeper_core::{render_json, render_text, write_report_json, ProjectContext, RunReport};

/// Exit code when the run could not start.
const SETUP_ERROR_EXIT: u8 = 2;

#[derive(Parser)]
#[command(name = "gatekeeper")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Validation pipeline orchestrator", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the validation pipeline against a project
    Run(RunArgs),

    /// List the checks each profile runs, in execution order
    Profiles {
        /// Print the check registries as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Project directory (default: current directory)
    #[arg(default_value = ".")]
    project: PathBuf,

    /// Check profile to run
    #[arg(short, long, default_value = "core", env = "GATEKEEPER_PROFILE")]
    profile: Profile,

    /// URL audited by the performance check
    #[arg(long, env = "GATEKEEPER_TARGET_URL")]
    target_url: Option<String>,

    /// Skip the test suite
    #[arg(long)]
    skip_tests: bool,

    /// Skip the build check
    #[arg(long)]
    skip_build: bool,

    /// Omit the end-to-end suite (full profile)
    #[arg(long)]
    no_e2e: bool,

    /// Override every check's timeout, in seconds
    #[arg(long, env = "GATEKEEPER_TIMEOUT", value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// Bound on each tool presence probe, in seconds
    #[arg(long, default_value_t = DEFAULT_PROBE_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..))]
    probe_timeout: u64,

    /// Report format written to stdout
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    format: ReportFormat,

    /// Also write the JSON report to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Progress event stream
    #[arg(long, value_enum, default_value_t = EventFormat::Text)]
    events: EventFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EventFormat {
    Text,
    Json,
    None,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    gatekeeper_core::init_tracing(cli.log_json, level);

    match cli.command {
        Commands::Run(args) => match cmd_run(&args).await {
            Ok(code) => ExitCode::from(code),
            Err(e) => {
                eprintln!("Error: {e:#}");
                ExitCode::from(SETUP_ERROR_EXIT)
            }
        },
        Commands::Profiles { json } => match cmd_profiles(json) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {e:#}");
                ExitCode::from(SETUP_ERROR_EXIT)
            }
        },
    }
}

fn run_options(args: &RunArgs) -> RunOptions {
    RunOptions {
        profile: args.profile,
        target_url: args.target_url.clone(),
        skip_tests: args.skip_tests,
        skip_build: args.skip_build,
        no_e2e: args.no_e2e,
        timeout_override: args.timeout,
        probe_timeout_secs: args.probe_timeout,
    }
}

/// Progress goes to stderr when stdout carries the JSON report.
fn progress_observer(args: &RunArgs) -> Arc<dyn ProgressObserver> {
    let to_stderr = args.format == ReportFormat::Json;
    match (args.events, to_stderr) {
        (EventFormat::None, _) => Arc::new(NullObserver),
        (EventFormat::Text, false) => Arc::new(ConsoleObserver::stdout()),
        (EventFormat::Text, true) => Arc::new(ConsoleObserver::stderr()),
        (EventFormat::Json, false) => Arc::new(JsonLinesObserver::stdout()),
        (EventFormat::Json, true) => Arc::new(JsonLinesObserver::stderr()),
    }
}

fn system_pipeline(options: &RunOptions, observer: Arc<dyn ProgressObserver>) -> CiPipeline {
    let resolver = AvailabilityResolver::system()
        .with_probe_timeout(Duration::from_secs(options.probe_timeout_secs));
    CiPipeline::new(resolver, CheckRunner::system(), observer)
}

/// Load the project, build the profile's registry and run it.
async fn run_checks(args: &RunArgs, pipeline: &CiPipeline) -> Result<RunReport> {
    let ctx = ProjectContext::load(&args.project)
        .with_context(|| format!("cannot validate project {:?}", args.project))?;

    let options = run_options(args);
    let descriptors = options.profile.descriptors(&options, &ctx);
    info!(
        profile = %options.profile,
        checks = descriptors.len(),
        project = %ctx.root().display(),
        "Starting validation run"
    );

    let report = pipeline
        .run(&ctx, options.profile.name(), &descriptors)
        .await
        .context("validation run could not start")?;
    Ok(report)
}

async fn cmd_run(args: &RunArgs) -> Result<u8> {
    let options = run_options(args);
    let pipeline = system_pipeline(&options, progress_observer(args));

    if args.format == ReportFormat::Text && args.events != EventFormat::Json {
        println!("Running {} validation for project: {:?}", options.profile, args.project);
        if let Some(url) = &options.target_url {
            println!("Target URL: {url}");
        }
    }

    let report = run_checks(args, &pipeline).await?;

    match args.format {
        ReportFormat::Text => {
            println!();
            print!("{}", render_text(&report));
            let gate = CiGate::evaluate(&report);
            println!("Gate: {}", gate.message);
        }
        ReportFormat::Json => println!("{}", render_json(&report)?),
    }

    if let Some(path) = &args.output {
        write_report_json(path, &report)?;
        info!(path = %path.display(), "Wrote JSON report");
    }

    Ok(report.exit_code())
}

fn cmd_profiles(json: bool) -> Result<()> {
    // Registries are listed without a target project: every capability absent.
    let ctx = ProjectContext::with_capabilities(".", Vec::<String>::new());
    let options = RunOptions::default();

    if json {
        let registries = [Profile::Core, Profile::Full]
            .iter()
            .map(|profile| {
                let descriptors = profile.descriptors(&options, &ctx);
                serde_json::to_value(descriptors).map(|value| (profile.name().to_string(), value))
            })
            .collect::<std::result::Result<serde_json::Map<String, serde_json::Value>, serde_json::Error>>()
            .context("serialize profiles")?;
        println!("{}", serde_json::to_string_pretty(&registries)?);
        return Ok(());
    }

    for profile in [Profile::Core, Profile::Full] {
        println!("{profile}:");
        for descriptor in profile.descriptors(&options, &ctx) {
            let critical = if descriptor.critical { " [critical]" } else { "" };
            println!(
                "  {:<22} {:<14} {:>4}s  {}{}",
                descriptor.name,
                descriptor.category,
                descriptor.timeout_secs,
                descriptor.invocation.label(),
                critical
            );
        }
        println!();
    }
    Ok(())
}
