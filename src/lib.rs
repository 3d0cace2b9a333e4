//! # cpj - parallel tree copy
//!
//! cpj replicates a directory tree from a source to a destination, copying
//! (or hard linking) every file while mirroring the relative directory
//! structure. A fixed pool of worker threads drains one shared job queue.
//!
//! ## Features
//!
//! - **Bounded worker pool**: at most one worker per pending file
//! - **Claim-exactly-once queue**: every file is handed to exactly one worker
//! - **Continue-on-error**: keep copying past individual failures, or stop
//!   each worker at its first error
//! - **Aggregated errors**: per-file failures are collected, never fatal
//! - **Hard links**: link instead of copying where the filesystem allows it
//!
//! ## Quick Start
//!
//! ```no_run
//! use cpj::core::parallel_copy;
//! use std::path::Path;
//!
//! let result = parallel_copy(Path::new("/source"), Path::new("/destination"), 8).unwrap();
//!
//! println!("Copied {} files ({} bytes)", result.files_copied, result.bytes_copied);
//! ```
//!
//! ## Advanced Usage
//!
//! ```no_run
//! use cpj::config::CopyConfig;
//! use cpj::core::CopyEngine;
//! use cpj::progress::TracingObserver;
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! let config = CopyConfig {
//!     source: PathBuf::from("/source"),
//!     destination: PathBuf::from("/destination"),
//!     recurse: true,
//!     jobs: 4,
//!     continue_on_error: true,
//!     ..Default::default()
//! };
//!
//! let engine = CopyEngine::new(config).with_observer(Arc::new(TracingObserver::new(true)));
//! let result = engine.execute().unwrap();
//! result.print_summary();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod error;
pub mod fs;
pub mod progress;

// Re-export commonly used types
pub use crate::config::CopyConfig;
pub use crate::core::{CopyEngine, CopyResult};
pub use crate::error::{CpjError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    //! Convenient re-exports for common usage
    //!
    //! ```no_run
    //! use cpj::prelude::*;
    //! ```

    pub use crate::config::{CliArgs, CopyConfig, OutputFormat};
    pub use crate::core::{
        parallel_copy, ClaimQueue, CopyEngine, CopyResult, DispatchResult, Dispatcher, Job,
        JobQueue, WorkerPolicy,
    };
    pub use crate::error::{CpjError, JobFailure, Result};
    pub use crate::fs::{CopyPrimitive, FileCopier, PathMapper, TreeEnumerator};
    pub use crate::progress::{CopyObserver, ObserverSet, ProgressReporter, TracingObserver};
}
