mod commands;
mod display;
mod logging;
mod progress;

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::process;

use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands};
use dotenv::dotenv;
use dupe_triage_core::fingerprint::FingerprintCache;
use dupe_triage_core::storage::Database;
use dupe_triage_core::{Status, TriageEngine};
use progress::CliReporter;
use tracing::{error, info};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match dupe_triage_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();

    match args.command {
        Some(Commands::Process) => {
            if let Err(err) = run_process(config) {
                error!("Error: {}", err);
            }
        }
        Some(Commands::Classify { path }) => {
            if let Err(err) = run_classify(config, &path) {
                error!("Error: {}", err);
            }
        }
        Some(Commands::Bless { path }) => {
            if let Err(err) = run_mark(config, &path, Status::Blessed) {
                error!("Error: {}", err);
            }
        }
        Some(Commands::Curse { path }) => {
            if let Err(err) = run_mark(config, &path, Status::Cursed) {
                error!("Error: {}", err);
            }
        }
        Some(Commands::LsFiles) => {
            if let Err(err) = run_ls_files(config) {
                error!("Error: {}", err);
            }
        }
        Some(Commands::LsDirs) => {
            if let Err(err) = run_ls_dirs(config) {
                error!("Error: {}", err);
            }
        }
        Some(Commands::Remove { path }) => {
            if let Err(err) = run_remove(config, &path) {
                error!("Error: {}", err);
            }
        }
        Some(Commands::CountFingerprintCache) => {
            info!("Counting fingerprint cache entries...");
            match FingerprintCache::open(&config.fingerprint_cache_path) {
                Ok(cache) => info!("Total keys in fingerprint cache: {}", cache.count()),
                Err(e) => error!("Error opening fingerprint cache: {}", e),
            }
        }
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:?}", config);
        }
        Some(Commands::TruncateDb) => {
            match prompt_confirm(
                "Are you SURE you want to COMPLETELY DELETE the catalog?",
                Some(false),
            ) {
                Ok(true) => match Database::open(&config.catalog_path) {
                    Ok(db) => {
                        if let Err(e) = db.truncate_all() {
                            error!("Error truncating catalog: {}", e);
                        } else {
                            println!("All tables truncated");
                        }
                    }
                    Err(e) => error!("Error opening catalog: {}", e),
                },
                _ => {
                    process::exit(0);
                }
            }
        }
        None => {
            let _ = Cli::command().print_long_help();
        }
    }

    Ok(())
}

fn run_process(config: dupe_triage_core::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let engine = TriageEngine::new(config)?;
    let reporter = CliReporter::new();
    let result = engine.run_pass(&reporter)?;

    println!();
    info!(
        "Walk: {}, Fingerprint: {}, Classify: {}, Persist: {}",
        format!("{:.2}s", result.walk_duration.as_secs_f64()).green(),
        format!("{:.2}s", result.fingerprint_duration.as_secs_f64()).green(),
        format!("{:.2}s", result.classify_duration.as_secs_f64()).green(),
        format!("{:.2}s", result.persist_duration.as_secs_f64()).green(),
    );
    info!(
        "{} files classified: {} nuke, {} check, {} not sure, {} good, {} unknown",
        result.files_classified,
        format!("{}", result.counts.nuke).red(),
        format!("{}", result.counts.check).yellow(),
        format!("{}", result.counts.not_sure).magenta(),
        format!("{}", result.counts.good).green(),
        result.counts.unknown,
    );
    if result.counts.blessed + result.counts.cursed > 0 {
        info!(
            "{} blessed, {} cursed records held",
            format!("{}", result.counts.blessed).bright_green(),
            format!("{}", result.counts.cursed).bright_red(),
        );
    }
    if result.io_errors + result.persist_errors > 0 {
        error!(
            "{} files unreadable, {} catalog writes failed",
            result.io_errors, result.persist_errors,
        );
    }

    Ok(())
}

fn run_classify(
    config: dupe_triage_core::AppConfig,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = TriageEngine::new(config)?;
    let (status, score) = engine.classify_path(path, None)?;
    println!(
        "{} {:>6}  {}",
        display::paint_status(status),
        score,
        path.display()
    );
    Ok(())
}

fn run_mark(
    config: dupe_triage_core::AppConfig,
    path: &Path,
    status: Status,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = TriageEngine::new(config)?;
    let verb = match status {
        Status::Blessed => "Blessing",
        _ => "Cursing",
    };

    if path.is_dir() {
        println!("{} / {}", verb, path.display());
        let marked = engine.mark_tree(path, status)?;
        println!("...{} files {}", marked, status);
    } else {
        let record = engine.set_authoritative_status(path, status)?;
        println!("{} > {}", display::paint_status(status), record.abs_path);
    }
    Ok(())
}

fn run_ls_files(config: dupe_triage_core::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let engine = TriageEngine::new(config)?;
    let records = engine.catalog().list_files()?;
    println!("Listing <files> stored in the catalog:");
    for record in &records {
        println!("{}", display::render_file(record));
    }
    println!("{} records", records.len());
    Ok(())
}

fn run_ls_dirs(config: dupe_triage_core::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let engine = TriageEngine::new(config)?;
    let records = engine.catalog().list_dirs()?;
    println!("Listing <dirs> stored in the catalog:");
    for record in &records {
        println!("{}", display::render_dir(record));
    }
    println!("{} records", records.len());
    Ok(())
}

fn run_remove(
    config: dupe_triage_core::AppConfig,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = TriageEngine::new(config)?;
    // Records are keyed by canonical path, but the file may already be gone
    // from disk; fall back to the argument as given.
    let key = fs::canonicalize(path)
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|_| path.to_string_lossy().into_owned());

    if engine.remove(&key)? {
        println!("Removed {}", key);
    } else {
        println!("No record for {}", key);
    }
    Ok(())
}

fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        io::stdin().read_line(&mut input)?;

        match input.trim().to_uppercase().as_str() {
            "Y" => return Ok(true),
            "N" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}
