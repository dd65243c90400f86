mod commands;
mod logging;
mod progress;

use std::env;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use commands::{Cli, Commands};
use dotenv::dotenv;
use progress::CliReporter;
use snap_merge_core::config::load_configuration;
use snap_merge_core::i18n::{Lang, Text};
use snap_merge_core::{AppConfig, BatchProcessor, RunReport};
use tracing::{debug, error, info};

fn main() {
    dotenv().ok();

    let args = Cli::parse();

    let _guard = logging::init_logger(args.verbose);

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {:#}", err);
            eprintln!("{} {:#}", "Error loading configuration:".red().bold(), err);
            process::exit(1);
        }
    };
    let lang = Lang::from_env(&config.lang);

    let result = match args.command.unwrap_or(Commands::Run) {
        Commands::Run => run_process(config, lang, args.verbose),
        Commands::PrintConfig => print_config(&config),
    };

    if let Err(err) = result {
        error!("Error: {:#}", err);
        eprintln!("{} {:#}", lang.text(Text::Failure).red().bold(), err);
        process::exit(1);
    }
}

/// File/env configuration with command-line flags layered on top.
fn build_config(args: &Cli) -> Result<AppConfig> {
    let mut config = load_configuration(args.config.as_deref())?;

    if let Some(dir) = &args.work_dir {
        config.work_dir = dir.clone();
    }
    if let Some(lang) = &args.lang {
        config.lang = lang.clone();
    }
    if let Some(backend) = args.backend {
        config.backend = backend;
    }
    config.work_dir = absolute(config.work_dir)?;
    config.validate()?;

    debug!("Configuration: {:?}", config);
    Ok(config)
}

fn absolute(path: PathBuf) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = env::current_dir().context("cannot determine current directory")?;
    Ok(cwd.join(path))
}

fn run_process(config: AppConfig, lang: Lang, verbose: bool) -> Result<()> {
    println!("{}", lang.text(Text::AppTitle).blue().bold());
    println!("{}", "=".repeat(50).dimmed());
    println!(
        "{}: {}",
        lang.text(Text::WorkDir),
        config.work_dir.display().to_string().cyan()
    );
    info!("Processing {} with the {} backend", config.work_dir.display(), config.backend);

    let processor = BatchProcessor::from_config(config, lang)?;
    let reporter = CliReporter::new(lang, !verbose);
    let report = processor
        .run(&reporter)
        .context("batch run aborted")?;

    print_summary(&report, lang);
    println!("{}", lang.text(Text::Success).green().bold());
    Ok(())
}

fn print_summary(report: &RunReport, lang: Lang) {
    let stats = &report.stats;
    println!();
    println!("{}", lang.text(Text::StatsTitle).blue().bold());
    println!("{}", "-".repeat(30).dimmed());
    println!("{}: {}", lang.text(Text::StatsTotal), stats.total.to_string().cyan());
    println!("{}: {}", lang.text(Text::StatsMerged), stats.merged.to_string().green());
    println!("{}: {}", lang.text(Text::StatsErrors), stats.errors.to_string().red());
    println!("{}: {}", lang.text(Text::StatsSkipped), stats.skipped.to_string().yellow());
    println!("{}: {}", lang.text(Text::StatsEvaluated), stats.evaluated.to_string().yellow());
    println!(
        "{}: {}",
        lang.text(Text::StatsDuration),
        format!("{:.2}s", report.duration.as_secs_f64()).green()
    );

    info!(
        "total={} merged={} errors={} skipped={} evaluated={}",
        stats.total, stats.merged, stats.errors, stats.skipped, stats.evaluated
    );
}

fn print_config(config: &AppConfig) -> Result<()> {
    let rendered = toml::to_string_pretty(config).context("cannot render configuration")?;
    println!("{}", rendered);
    Ok(())
}
