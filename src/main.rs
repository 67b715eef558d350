use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod assemble;
mod config;
mod diff;
mod key;
mod output;
mod snapshot;
mod usage;

use assemble::{assemble, EnvironmentDiff, EnvironmentOutcome, RunSummary};
use snapshot::{EnvironmentScan, KeyCollision};

#[derive(Parser, Debug)]
#[command(
    name = "rrecon",
    version,
    about = "Report inventory reconciliation across environments"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a run config stub to fill in
    Init(InitArgs),
    /// Reconcile all environments and publish the inventory report
    Run(RunArgs),
    /// Process only the usage log and publish the attribution index
    Usage(UsageArgs),
}

#[derive(Parser, Debug)]
struct InitArgs {
    /// Destination for the config stub
    #[arg(long, value_name = "PATH", default_value = "recon.json")]
    config: PathBuf,
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Path to the run config
    #[arg(long, value_name = "PATH")]
    config: PathBuf,

    /// Output path for the inventory report JSON
    #[arg(long, value_name = "PATH", default_value = "inventory_report.json")]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct UsageArgs {
    /// Path to the run config
    #[arg(long, value_name = "PATH")]
    config: PathBuf,

    /// Output path for the usage index JSON
    #[arg(long, value_name = "PATH", default_value = "usage_index.json")]
    out: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Init(args) => cmd_init(args),
        Commands::Run(args) => cmd_run(args),
        Commands::Usage(args) => cmd_usage(args),
    }
}

fn cmd_init(args: InitArgs) -> Result<()> {
    if args.config.exists() {
        return Err(anyhow!(
            "refusing to overwrite existing config {}",
            args.config.display()
        ));
    }
    config::write_config(&args.config, &config::default_config())?;
    println!("Wrote config stub to {}", args.config.display());
    println!("Fill in master_root, environments, and usage_log before running.");
    Ok(())
}

fn cmd_run(args: RunArgs) -> Result<()> {
    let config = config::load_config(&args.config)?;
    config::validate_config(&config)?;

    let master_scan = snapshot::scan_environment(&config.master_root, &config.excluded_folders)
        .with_context(|| format!("scan master root {}", config.master_root.display()))?;
    println!("Master inventory: {} reports.", master_scan.snapshot.len());

    let EnvironmentScan {
        snapshot: master,
        extras: mut all_extras,
        collisions: mut all_collisions,
    } = master_scan;
    note_collisions("master", &all_collisions);

    let mut diffs = Vec::new();
    let mut outcomes = Vec::new();
    for env in &config.environments {
        match snapshot::scan_environment(&env.root, &config.excluded_folders) {
            Ok(scan) => {
                note_collisions(&env.name, &scan.collisions);
                let (statuses, added) = diff::diff_environment(&master, &scan.snapshot);
                let missing = count_status(&statuses, diff::DiffStatus::Missing);
                let stale = count_status(&statuses, diff::DiffStatus::WrongDate);
                println!(
                    "{}: {} reports, {} missing, {} wrong date, {} added.",
                    env.name,
                    scan.snapshot.len(),
                    missing,
                    stale,
                    added.len()
                );
                all_extras.merge(scan.extras);
                all_collisions.extend(scan.collisions);
                diffs.push(EnvironmentDiff {
                    name: env.name.clone(),
                    statuses,
                    added,
                });
                outcomes.push(EnvironmentOutcome {
                    environment: env.name.clone(),
                    compared: true,
                    error: None,
                });
            }
            // A failed secondary scan aborts that comparison only; an empty
            // snapshot would falsely mark every master key missing.
            Err(err) => {
                tracing::error!(
                    environment = %env.name,
                    root = %env.root.display(),
                    "environment scan failed: {err:#}"
                );
                outcomes.push(EnvironmentOutcome {
                    environment: env.name.clone(),
                    compared: false,
                    error: Some(format!("{err:#}")),
                });
            }
        }
    }

    let log = usage::process_log(
        &config.usage_log,
        &config.excluded_users,
        &config.excluded_folders,
    )?;
    print_log_stats(&log.stats);

    let summary = RunSummary {
        master_reports: master.len(),
        environments: outcomes,
        log: log.stats,
        key_collisions: all_collisions,
    };
    let report = assemble(&master, &diffs, &log.index, all_extras, summary);
    output::write_report_json(&args.out, &report)?;
    println!("Wrote inventory report to {}", args.out.display());
    Ok(())
}

fn cmd_usage(args: UsageArgs) -> Result<()> {
    let config = config::load_config(&args.config)?;
    config::validate_config(&config)?;

    let log = usage::process_log(
        &config.usage_log,
        &config.excluded_users,
        &config.excluded_folders,
    )?;
    print_log_stats(&log.stats);
    println!(
        "Attributed {} production and {} closing reports.",
        log.index.production.len(),
        log.index.closing.len()
    );

    output::write_report_json(&args.out, &log.index)?;
    println!("Wrote usage index to {}", args.out.display());
    Ok(())
}

fn note_collisions(environment: &str, collisions: &[KeyCollision]) {
    for collision in collisions {
        tracing::warn!(
            environment,
            key = %collision.key,
            path = %collision.path,
            "report key collision; last artifact wins"
        );
    }
}

fn count_status(statuses: &[diff::DiffStatus], status: diff::DiffStatus) -> usize {
    statuses.iter().filter(|s| **s == status).count()
}

fn print_log_stats(stats: &usage::LogStats) {
    println!(
        "Usage log: {} events kept, {} filtered, {} skipped.",
        stats.parsed, stats.dropped, stats.skipped
    );
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
