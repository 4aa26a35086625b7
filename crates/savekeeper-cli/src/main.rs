use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{ArgAction, ColorChoice, Parser};
use console::style;
use savekeeper_core::{Keeper, Operations, Outcome, ProjectsFile, RunReport, Settings};
use tracing::debug;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;

/// Back up and restore save-data directories as timestamped zip archives.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Archive every project's save data.
    #[arg(long)]
    save: bool,

    /// Replace every project's save data with its latest archive.
    #[arg(long)]
    restore: bool,

    /// List the archives available for every project.
    #[arg(long)]
    list: bool,

    /// Path to the projects file.
    #[arg(long, short, value_name = "FILE", default_value = "./config.json")]
    config: PathBuf,

    /// Directory holding the per-project archive folders.
    #[arg(long, value_name = "DIR")]
    archive_root: Option<PathBuf>,

    /// Also write logs to a daily rolling file in this directory.
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Set the verbosity level. Use -v for debug, -vv for trace.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Control when to use color output.
    #[arg(long, value_name = "WHEN", default_value_t = ColorChoice::Auto)]
    color: ColorChoice,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.verbose, cli.color, cli.log_dir.as_deref())?;
    debug!(?cli, "Parsed arguments.");

    let mut settings = Settings::new().context("Failed to load settings")?;
    if let Some(root) = cli.archive_root {
        settings.archive_root = root;
    }
    let projects = ProjectsFile::load(&cli.config)
        .with_context(|| format!("Failed to load projects from '{}'", cli.config.display()))?
        .projects;
    let keeper = Keeper::new(settings);

    if cli.list {
        handle_list(&keeper, &projects);
    }

    let ops = Operations {
        save: cli.save,
        restore: cli.restore,
    };
    if ops.is_empty() && cli.list {
        return Ok(());
    }

    let report = keeper.run(&projects, ops);
    print_report(&report);
    if !report.is_success() {
        bail!("{} project(s) failed", report.failures.len());
    }
    Ok(())
}

fn init_tracing(
    verbosity: u8,
    color: ColorChoice,
    log_dir: Option<&Path>,
) -> Result<Option<WorkerGuard>> {
    let level = match verbosity {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_ansi(color != ColorChoice::Never)
        .with_filter(level);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Could not create log directory '{}'", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, "savekeeper.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(level);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .init();
    Ok(guard)
}

fn handle_list(keeper: &Keeper, projects: &[savekeeper_core::Project]) {
    for project in projects {
        println!("{}", style(&project.name).cyan().bold());
        match keeper.list_archives(&project.name) {
            Ok(entries) if entries.is_empty() => println!("  No archives."),
            Ok(entries) => {
                let last = entries.len() - 1;
                for (i, entry) in entries.iter().enumerate() {
                    let when = entry
                        .created_at
                        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                        .unwrap_or_else(|| "unknown time".to_string());
                    let marker = if i == last { style("(latest)").green().to_string() } else { String::new() };
                    println!("  - {:<24} {} {}", entry.file_name, style(when).dim(), marker);
                }
            }
            Err(e) => println!("  {}", style(e).yellow()),
        }
    }
}

fn print_report(report: &RunReport) {
    for outcome in &report.outcomes {
        match outcome {
            Outcome::Saved { project_name, archive } => println!(
                "{} saved to {}",
                style(project_name).cyan(),
                style(archive.display()).yellow()
            ),
            Outcome::Restored { project_name, restore } => {
                println!(
                    "{} restored from {}",
                    style(project_name).cyan(),
                    style(restore.archive.display()).yellow()
                );
                if let Some(backup) = &restore.safety_backup {
                    println!("  previous save data kept in {}", style(backup.display()).yellow());
                }
            }
            Outcome::Nothing { project_name } => println!(
                "{} nothing to do (pass --save and/or --restore)",
                style(project_name).cyan()
            ),
        }
    }
    for failure in &report.failures {
        eprintln!(
            "{} {}: {}",
            style("error:").red().bold(),
            style(&failure.project_name).cyan(),
            failure.error
        );
    }
}
