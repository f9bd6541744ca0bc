//! # Async Task Coordination Library
//!
//! Single-shot deferred results for work that completes exactly once, plus a
//! helper that moves CPU-bound work off the caller's thread. No `async_trait`,
//! no blocking on the caller side.

pub mod executor;
pub mod task;

pub use executor::spawn_blocking;
pub use task::{deferred, Completion, Deferred, TaskError, TaskResult};

/// Re-export common types
pub type Result<T> = std::result::Result<T, TaskError>;
