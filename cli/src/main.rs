//! CLI entrypoint for the council deliberation engine
//!
//! This is the main binary that wires together all layers using
//! dependency injection: config loading and validation, the filesystem
//! stores, the HTTP model gateway, and the RunSession use case.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use council_application::{MemoryStore, RunSessionUseCase};
use council_domain::{CouncilConfig, OutputKind};
use council_infrastructure::{
    ConfigLoader, FsMemoryStore, FsSessionStoreProvider, ModelRouter, SessionIdGenerator,
    SystemClock,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Format timestamps using local time (via chrono).
struct LocalTimer;

impl tracing_subscriber::fmt::time::FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[derive(Parser)]
#[command(name = "council", about = "Run deliberation sessions over a fixed council of LLM members")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase console log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Directory for operation log files
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Disable the file log layer
    #[arg(long, global = true)]
    no_log_file: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one deliberation session
    Run {
        /// Path to the council configuration (JSON)
        #[arg(long)]
        config: PathBuf,

        /// The question or task the council deliberates on
        #[arg(long)]
        prompt: String,

        /// Approve execution of the outcome, if the leader declares it
        /// executable and the config requires human approval
        #[arg(long)]
        approve_execution: bool,

        /// Override the configured output type (none | documentation)
        #[arg(long)]
        output_type: Option<String>,
    },

    /// Validate a configuration and seed the storage layout
    Onboard {
        /// Path to the council configuration (JSON)
        #[arg(long)]
        config: PathBuf,
    },
}

/// Resolve the log directory path.
///
/// Priority: CLI `--log-dir`, then `dirs::data_dir()/council/logs/`, then
/// `.council/logs/`.
fn resolve_log_dir(override_path: Option<&Path>) -> PathBuf {
    if let Some(path) = override_path {
        return path.to_path_buf();
    }
    if let Some(data_dir) = dirs::data_dir() {
        return data_dir.join("council").join("logs");
    }
    PathBuf::from(".council").join("logs")
}

/// Initialize multi-layer logging (console + optional file).
///
/// The console layer is quiet by default (warn) and opens up with `-v`;
/// the file layer always records debug (trace at `-vvv`).
fn init_logging(verbose: u8, log_dir_override: Option<&Path>, no_log_file: bool) -> Option<WorkerGuard> {
    let console_filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let console_layer = fmt::layer()
        .with_timer(LocalTimer)
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(console_filter);

    if no_log_file {
        tracing_subscriber::registry().with(console_layer).init();
        return None;
    }

    let log_dir = resolve_log_dir(log_dir_override);
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!(
            "Warning: Could not create log directory {}: {}",
            log_dir.display(),
            e
        );
        tracing_subscriber::registry().with(console_layer).init();
        return None;
    }

    let log_filename = format!(
        "council-{}-{}.log",
        chrono::Local::now().format("%Y-%m-%dT%H-%M-%S"),
        std::process::id()
    );
    let file_appender = tracing_appender::rolling::never(&log_dir, &log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_filter = match verbose {
        0..=2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let file_layer = fmt::layer()
        .with_timer(LocalTimer)
        .with_ansi(false)
        .with_writer(non_blocking)
        .with_filter(file_filter);

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    Some(guard)
}

fn load_config(path: &Path) -> Result<CouncilConfig> {
    ConfigLoader::load(path).with_context(|| format!("loading config {}", path.display()))
}

async fn run_session(
    config_path: &Path,
    prompt: &str,
    approve_execution: bool,
    output_type: Option<&str>,
) -> Result<()> {
    let mut config = load_config(config_path)?;

    if let Some(kind) = output_type {
        config.output.kind = match kind {
            "none" => OutputKind::None,
            "documentation" => OutputKind::Documentation,
            other => bail!("unknown output type \"{}\" (expected none | documentation)", other),
        };
    }

    let config = Arc::new(config);
    let models = Arc::new(ModelRouter::from_config(&config)?);
    let stores = Arc::new(FsSessionStoreProvider::new(&config.storage.root_dir));
    let memory = Arc::new(FsMemoryStore::new(&config.storage.memory_dir));

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_cancel.cancel();
        }
    });

    let use_case = RunSessionUseCase::new(
        Arc::clone(&config),
        models,
        stores,
        memory,
        Arc::new(SystemClock),
        Arc::new(SessionIdGenerator::new()),
    )
    .with_cancellation(cancel);

    let result = use_case.run(prompt, approve_execution).await?;

    let session_dir = config
        .storage
        .root_dir
        .join("sessions")
        .join(&result.session_id);
    println!();
    println!("{}", "Session complete.".green().bold());
    println!("  leader:     {}", result.leader_id);
    println!(
        "  phases:     {}",
        result
            .phase_results
            .iter()
            .map(|r| format!("{} ({})", r.phase_id, r.ended_by.as_str()))
            .collect::<Vec<_>>()
            .join(" -> ")
    );
    println!("  resolution: {}", result.summary.final_resolution.bold());
    if let Some(doc) = &result.documentation {
        let status = if doc.approved {
            "approved".green()
        } else {
            "not approved".red()
        };
        println!("  documentation: {} (v{})", status, doc.final_version);
    }
    if let Some(handoff) = &result.execution_handoff {
        let status = if handoff.approved {
            "approved".green()
        } else {
            "awaiting approval".yellow()
        };
        println!("  execution: {}", status);
    }
    println!("  artifacts:  {}", session_dir.display());

    Ok(())
}

fn onboard(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;

    std::fs::create_dir_all(config.storage.root_dir.join("sessions"))
        .with_context(|| format!("creating {}", config.storage.root_dir.display()))?;
    let memory = FsMemoryStore::new(&config.storage.memory_dir);
    memory.prepare(&config)?;

    println!("{}", "Council ready.".green().bold());
    println!("  name:     {}", config.name);
    println!("  members:  {}", config.members.len());
    println!("  phases:   {}", config.phases.len());
    println!("  sessions: {}", config.storage.root_dir.join("sessions").display());
    println!("  memory:   {}", config.storage.memory_dir.display());

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.verbose, cli.log_dir.as_deref(), cli.no_log_file);

    match &cli.command {
        Commands::Run {
            config,
            prompt,
            approve_execution,
            output_type,
        } => {
            info!(config = %config.display(), "starting session");
            run_session(config, prompt, *approve_execution, output_type.as_deref()).await
        }
        Commands::Onboard { config } => onboard(config),
    }
}
