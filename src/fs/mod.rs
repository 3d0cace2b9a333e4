//! File system operations module
//!
//! Tree enumeration, source/destination path mapping and the
//! single-file copy primitive used by the workers.

mod mapper;
mod operations;
mod scanner;

pub use mapper::*;
pub use operations::*;
pub use scanner::*;
