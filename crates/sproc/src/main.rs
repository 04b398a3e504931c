// src/main.rs

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use log::LevelFilter;
use std::path::{Path, PathBuf};

use sproc::{
    load_and_close, prepare, Config, DocBlockParser, LoadSummary, MySqlGateway, ReplacePairs,
    Severity, CONFIG_FILE,
};

#[derive(Parser)]
#[command(name = "sproc")]
#[command(about = "Load stored routines into MySQL and compile their metadata", long_about = None)]
#[command(version)]
struct Cli {
    /// Print debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load routines into the database (all sources when no files are given)
    Load {
        /// Configuration file
        #[arg(long, value_name = "FILE", default_value = CONFIG_FILE)]
        config: PathBuf,

        #[arg(value_name = "FILES")]
        files: Vec<PathBuf>,
    },
    /// Check routine sources without connecting to the database
    Check {
        /// Configuration file providing placeholder values
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let success = match cli.command {
        Commands::Load { config, files } => load(&config, &files)?,
        Commands::Check { config, files } => check(config.as_deref(), &files)?,
    };

    if !success {
        std::process::exit(1);
    }

    Ok(())
}

fn load(config_path: &Path, files: &[PathBuf]) -> Result<bool> {
    let config = Config::load(config_path)?;

    let gateway = MySqlGateway::connect(&config.database).with_context(|| {
        format!("Failed to connect to database '{}'", config.database.database)
    })?;

    let summary = load_and_close(gateway, &config, files, MySqlGateway::disconnect)?;

    print_summary(&summary);

    Ok(!summary.has_failures())
}

fn print_summary(summary: &LoadSummary) {
    for name in &summary.loaded {
        println!("{} {}", "loaded ".green(), name);
    }
    for name in &summary.dropped {
        println!("{} {}", "dropped".yellow(), name);
    }
    for (name, diagnostic) in &summary.warnings {
        println!("{} {}: {}", "warning".yellow(), name, diagnostic.message);
    }
    for failure in &summary.failed {
        let location = failure
            .path
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| failure.routine.clone());
        println!("{} {}: {}", "failed ".red(), location, failure.message);
        for diagnostic in &failure.diagnostics {
            println!("        {}", diagnostic);
        }
    }

    println!(
        "\n{} loaded, {} skipped, {} failed, {} dropped",
        summary.loaded.len(),
        summary.skipped.len(),
        summary.failed.len(),
        summary.dropped.len()
    );
}

fn check(config_path: Option<&Path>, files: &[PathBuf]) -> Result<bool> {
    let replace_pairs = match config_path {
        Some(path) => Config::load(path)?.replace_pairs(),
        None => ReplacePairs::new(),
    };

    let mut success = true;
    for path in files {
        match prepare(path, &replace_pairs, &DocBlockParser) {
            Ok(prepared) => {
                println!("{} {} ({})", "ok".green(), path.display(), prepared.designation);
                for diagnostic in &prepared.diagnostics {
                    let line = diagnostic.to_string();
                    match diagnostic.severity {
                        Severity::Error => println!("  {}", line.red()),
                        Severity::Warning => println!("  {}", line.yellow()),
                    }
                }
            }
            Err(err) => {
                success = false;
                println!("{} {}: {}", "error".red(), path.display(), err);
                for diagnostic in err.diagnostics() {
                    println!("  {}", diagnostic);
                }
            }
        }
    }

    Ok(success)
}
