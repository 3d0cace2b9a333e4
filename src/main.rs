//! cpj CLI - copy a file or directory tree with parallel jobs

use clap::Parser;
use cpj::config::{CliArgs, CopyConfig, OutputFormat};
use cpj::core::CopyEngine;
use cpj::error::{CpjError, Result};
use cpj::progress::{ObserverSet, ProgressReporter, TracingObserver};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            std::process::exit(CliArgs::usage_exit_code(&e));
        }
    };

    let config = match CopyConfig::from_cli(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", CpjError::ConfigError(e));
            std::process::exit(1);
        }
    };

    // Logs go to stderr so stdout carries only the summary
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(config) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Returns whether every file was copied
fn run(config: CopyConfig) -> Result<bool> {
    if config.debug {
        print_config(&config);
    }

    let mut observers = ObserverSet::new().with(Arc::new(TracingObserver::new(config.verbose)));
    if config.progress {
        observers = observers.with(Arc::new(ProgressReporter::new()));
    }

    let engine = CopyEngine::new(config.clone()).with_observer(Arc::new(observers));
    let result = engine.execute()?;

    if config.useful {
        match config.output_format {
            OutputFormat::Text => result.print_summary(),
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(&result.summary())
                    .map_err(|e| CpjError::config(format!("cannot encode summary: {}", e)))?;
                println!("{}", json);
            }
        }
    } else {
        for failure in &result.failures {
            eprintln!("Error: {}", failure);
        }
        for error in &result.pool_errors {
            eprintln!("Error: {}", error);
        }
    }

    Ok(result.is_success())
}

fn print_config(config: &CopyConfig) {
    println!("=== Configuration ===");
    println!("Source:      {:?}", config.source);
    println!("Destination: {:?}", config.destination);
    println!("Jobs:        {}", config.effective_jobs());
    println!("Recurse:     {}", config.recurse);
    println!("Hard link:   {}", config.hardlink);
    println!("Continue:    {}", config.continue_on_error);
    println!();
}
