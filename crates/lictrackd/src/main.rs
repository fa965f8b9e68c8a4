//! lictrackd - The lictrack service and operator tool
//!
//! This is the main entry point for lictrack. It wires together:
//! - Configuration loading
//! - The HTTP license endpoint client
//! - Alert sinks (log, webhook)
//! - The sync engine and refresh scheduler
//!
//! `serve` runs the scheduler until signalled; the other subcommands run a
//! single operation against the configured instances and exit.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use lictrack_api::{DATE_FORMAT, LicenseAgreement, LicenseRecord};
use lictrack_config::{Settings, load_config};
use lictrack_core::{Alert, Notifier, RefreshReport, Scheduler, StatusClassifier, SyncEngine, alert_for};
use lictrack_remote::HttpLicenseClient;
use lictrack_util::{InstanceId, SystemClock, default_config_path, format_datetime_full, is_mock_time_active};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// lictrackd - License state synchronization across managed instances
#[derive(Parser, Debug)]
#[command(name = "lictrackd", version)]
#[command(about = "License state synchronization across managed instances", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/lictrack/config.toml)
    #[arg(short, long, env = "LICTRACK_CONFIG", default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Refresh on a fixed period until SIGINT/SIGTERM/SIGHUP
    Serve,

    /// Refresh, then print the cached license records
    Status {
        /// Only refresh and show this instance
        #[arg(short, long)]
        instance: Option<String>,

        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Refresh every instance and print a summary with alert lines
    Refresh,

    /// Upload a license file to one instance
    Apply {
        #[arg(short, long)]
        instance: String,

        /// License file to upload
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Show or accept an instance's license agreement
    Agreement {
        #[command(subcommand)]
        action: AgreementAction,
    },
}

#[derive(Subcommand, Debug)]
enum AgreementAction {
    Show {
        #[arg(short, long)]
        instance: String,
    },
    Accept {
        #[arg(short, long)]
        instance: String,
    },
}

/// Build the engine for the loaded settings, talking HTTP to real instances
fn build_engine(settings: &Settings) -> Result<Arc<SyncEngine>> {
    let client = HttpLicenseClient::new(settings.sync.request_timeout)
        .context("Failed to create HTTP client")?;

    let notifier = Notifier::from_settings(&settings.notifier, settings.sync.request_timeout)
        .context("Failed to set up alert delivery")?;

    Ok(Arc::new(SyncEngine::new(
        settings.directory.clone(),
        Arc::new(client),
        StatusClassifier::new(settings.sync.warning_threshold_days),
        notifier,
        Arc::new(SystemClock),
    )))
}

async fn serve(engine: Arc<SyncEngine>, settings: &Settings) -> Result<()> {
    let mut sigterm = signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;
    let mut sighup = signal(SignalKind::hangup()).context("Failed to create SIGHUP handler")?;

    let scheduler = Scheduler::spawn(engine, &settings.sync);

    info!("Service running");

    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM, shutting down gracefully"),
        _ = sigint.recv() => info!("Received SIGINT, shutting down gracefully"),
        _ = sighup.recv() => info!("Received SIGHUP, shutting down gracefully"),
    }

    let completed = scheduler.cycles_completed();
    let skipped = scheduler.ticks_skipped();
    scheduler.shutdown().await;

    info!(cycles_completed = completed, ticks_skipped = skipped, "lictrackd stopped");
    Ok(())
}

fn print_record(record: &LicenseRecord) {
    println!(
        "{:<12} {:<12} {:<8} {:>6}d  {}  {:<20} {}",
        record.instance_id,
        record.environment,
        record.status,
        record.days_to_expiry,
        record.expiry_date.format(DATE_FORMAT),
        record.license_key_id,
        record.issued_to,
    );
}

fn print_report(report: &RefreshReport) {
    println!("Refresh {}: {}", report.cycle_id, report.summary());

    let alerts: Vec<Alert> = report.records().filter_map(alert_for).collect();
    if !alerts.is_empty() {
        println!();
        println!("Alerts:");
        for alert in &alerts {
            println!("  {}", alert.message);
        }
    }

    if report.failed() > 0 {
        println!();
        println!("Failures:");
        for (id, error) in report.failures() {
            println!("  {} [{}]: {}", id, error.kind(), error);
        }
    }
}

async fn status(engine: Arc<SyncEngine>, instance: Option<String>, json: bool) -> Result<()> {
    let records = match instance {
        Some(id) => {
            let id = InstanceId::new(id);
            if let Err(e) = engine.refresh_one(&id).await {
                warn!(instance = %id, error = %e, "Showing cached state only");
            }
            vec![engine.get_license(&id).await?]
        }
        None => {
            let report = engine.refresh_all().await?;
            for (id, error) in report.failures() {
                eprintln!("warning: {} could not be refreshed: {}", id, error);
            }
            engine.get_all_licenses().await
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    for record in &records {
        print_record(record);
    }
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let settings = load_config(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;

    info!(
        config_path = %args.config.display(),
        instance_count = settings.directory.len(),
        "Configuration loaded"
    );

    let engine = build_engine(&settings)?;

    match args.command {
        Command::Serve => serve(engine, &settings).await,

        Command::Status { instance, json } => status(engine, instance, json).await,

        Command::Refresh => {
            let report = engine.refresh_all().await?;
            print_report(&report);
            if report.succeeded() == 0 {
                bail!("No instance could be refreshed");
            }
            Ok(())
        }

        Command::Apply { instance, file } => {
            let id = InstanceId::new(instance);
            let record = engine
                .apply_license(&id, &file)
                .await
                .with_context(|| format!("Failed to apply {:?} to {}", file, id))?;

            println!("License applied to {}", id);
            print_record(&record);
            if let Some(alert) = alert_for(&record) {
                println!("{}", alert.message);
            }
            Ok(())
        }

        Command::Agreement { action } => match action {
            AgreementAction::Show { instance } => {
                let agreement = engine.get_agreement(&InstanceId::new(instance)).await?;
                println!("{}", serde_json::to_string_pretty(&agreement)?);
                Ok(())
            }
            AgreementAction::Accept { instance } => {
                let id = InstanceId::new(instance);
                let current = engine.get_agreement(&id).await?;
                let updated = engine
                    .set_agreement(
                        &id,
                        &LicenseAgreement {
                            accepted: true,
                            ..current
                        },
                    )
                    .await?;
                println!("{}", serde_json::to_string_pretty(&updated)?);
                Ok(())
            }
        },
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    // Operator output goes to stdout, so logs go to stderr
    if args.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }

    info!(version = env!("CARGO_PKG_VERSION"), "lictrackd starting");

    if is_mock_time_active() {
        warn!(
            now = %format_datetime_full(&lictrack_util::now()),
            "Mock time is active"
        );
    }

    run(args).await
}
