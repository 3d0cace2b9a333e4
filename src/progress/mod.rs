//! Progress and observability module
//!
//! Lifecycle events are delivered to an injected [`CopyObserver`]; the
//! implementations here log them through `tracing` or drive an indicatif
//! progress bar.

mod observer;
mod reporter;

pub use observer::*;
pub use reporter::*;
