//! Off-thread execution for CPU-bound work
//!
//! Work runs on tokio's blocking pool when a runtime is active, and on a
//! dedicated OS thread otherwise. The result crosses back to the caller through
//! a [`Deferred`].

use crate::task::{deferred, Completion, Deferred, TaskError};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Run `work` away from the calling thread and deliver its return value once.
pub fn spawn_blocking<T, F>(work: F) -> Deferred<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (completion, result) = deferred();
    let job = move || run_to_completion(completion, work);

    if let Ok(handle) = tokio::runtime::Handle::try_current() {
        // The JoinHandle is not needed: the Completion carries the result.
        drop(handle.spawn_blocking(job));
    } else if let Err(e) = std::thread::Builder::new()
        .name("async-task-worker".to_string())
        .spawn(job)
    {
        // The closure (and its Completion) is dropped, so the Deferred
        // resolves to TaskError::Dropped.
        log::error!("Failed to spawn worker thread: {e}");
    }

    result
}

fn run_to_completion<T, F>(completion: Completion<T>, work: F)
where
    F: FnOnce() -> T,
{
    if completion.is_abandoned() {
        log::debug!("Deferred result abandoned before work started; running anyway");
    }

    match catch_unwind(AssertUnwindSafe(work)) {
        Ok(value) => {
            if !completion.complete(value) {
                log::debug!("Deferred result discarded by consumer");
            }
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            log::error!("Worker panicked: {message}");
            completion.fail(TaskError::Panicked(message));
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
