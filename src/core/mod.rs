//! Core copy engine module
//!
//! Provides the shared job queue, the copy workers, the dispatcher that
//! runs them as a fixed pool and the engine orchestrating a whole copy.

mod copier;
mod dispatcher;
mod queue;
mod worker;

pub use copier::*;
pub use dispatcher::*;
pub use queue::*;
pub use worker::*;
