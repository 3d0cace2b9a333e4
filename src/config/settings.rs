//! Configuration settings for cpj
//!
//! Defines the command line surface and the runtime configuration
//! derived from it.

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// cpj - copy a file or directory tree with a pool of parallel jobs
#[derive(Parser, Debug, Clone)]
#[command(name = "cpj")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Copy a directory tree using parallel jobs")]
#[command(long_about = r#"
cpj copies a single file, or with --recurse a whole directory tree, into a
destination directory. Files are copied by a fixed pool of worker threads
draining a shared job list.

Examples:
  cpj notes.txt /backup/notes.txt             # Single file
  cpj --recurse --jobs 8 /data /backup        # Tree copy with 8 workers
  cpj -r --link --continue /data /snapshot    # Hard link where possible
"#)]
pub struct CliArgs {
    /// Source file or directory
    #[arg(value_name = "SOURCE")]
    pub source: String,

    /// Destination file, or an existing directory when recursing
    #[arg(value_name = "DEST")]
    pub destination: String,

    /// Hard link copied files if able
    #[arg(long)]
    pub link: bool,

    /// Recurse the supplied directory
    #[arg(short = 'r', long)]
    pub recurse: bool,

    /// Number of jobs to run in parallel (0 = one per CPU)
    #[arg(short = 'j', long, default_value = "1", value_name = "N")]
    pub jobs: usize,

    /// Continue the parallel copy even if individual files fail
    #[arg(long = "continue")]
    pub continue_on_error: bool,

    /// Print some useful statistics
    #[arg(long)]
    pub useful: bool,

    /// Print each copy attempt and error as it happens (implies --useful)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Print debug messages (implies --verbose)
    #[arg(long)]
    pub debug: bool,

    /// Show a progress bar
    #[arg(short = 'p', long)]
    pub progress: bool,

    /// Output format for the statistics report
    #[arg(long, value_enum, default_value = "text")]
    pub output_format: OutputFormat,
}

impl CliArgs {
    /// Process exit code for a failed parse: 1 for usage errors, 0 when
    /// clap only displayed `--help` or `--version`
    pub fn usage_exit_code(err: &clap::Error) -> i32 {
        if err.use_stderr() {
            1
        } else {
            0
        }
    }
}

/// Output format for reports
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON format
    Json,
}

/// Runtime configuration derived from CLI args
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyConfig {
    /// Source path
    pub source: PathBuf,
    /// Destination path
    pub destination: PathBuf,
    /// Hard link instead of copying where possible
    pub hardlink: bool,
    /// Allow a directory source
    pub recurse: bool,
    /// Keep claiming jobs after a copy fails
    pub continue_on_error: bool,
    /// Worker count (0 = auto-detect)
    pub jobs: usize,
    /// Print statistics
    pub useful: bool,
    /// Report every copy attempt
    pub verbose: bool,
    /// Debug logging
    pub debug: bool,
    /// Progress bar
    pub progress: bool,
    /// Statistics format
    pub output_format: OutputFormat,
}

impl Default for CopyConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            destination: PathBuf::new(),
            hardlink: false,
            recurse: false,
            continue_on_error: false,
            jobs: 1,
            useful: false,
            verbose: false,
            debug: false,
            progress: false,
            output_format: OutputFormat::Text,
        }
    }
}

impl CopyConfig {
    /// Create config from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self, String> {
        if args.source.trim().is_empty() {
            return Err("Source path must not be empty".to_string());
        }
        if args.destination.trim().is_empty() {
            return Err("Destination path must not be empty".to_string());
        }

        // --debug implies --verbose, which implies --useful
        let verbose = args.verbose || args.debug;
        let useful = args.useful || verbose;

        Ok(Self {
            source: PathBuf::from(&args.source),
            destination: PathBuf::from(&args.destination),
            hardlink: args.link,
            recurse: args.recurse,
            continue_on_error: args.continue_on_error,
            jobs: args.jobs,
            useful,
            verbose,
            debug: args.debug,
            progress: args.progress,
            output_format: args.output_format,
        })
    }

    /// Worker count with 0 resolved to the number of CPUs
    pub fn effective_jobs(&self) -> usize {
        if self.jobs == 0 {
            num_cpus::get()
        } else {
            self.jobs
        }
    }

    /// Default `tracing` filter directive for this configuration
    pub fn log_filter(&self) -> &'static str {
        if self.debug {
            "debug"
        } else if self.useful {
            "info"
        } else {
            "warn"
        }
    }
}
