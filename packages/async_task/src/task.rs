//! Single-shot deferred results
//!
//! A [`Completion`] is the producer half and a [`Deferred`] the consumer half of
//! one result. Completing consumes the producer, so a result is reported at most
//! once; dropping the producer without completing surfaces as [`TaskError::Dropped`].

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// Error types for deferred result delivery
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    /// The producer went away without reporting a result
    #[error("Task dropped before completion")]
    Dropped,
    /// The worker closure panicked
    #[error("Task panicked: {0}")]
    Panicked(String),
}

/// Result type for deferred tasks
pub type TaskResult<T> = Result<T, TaskError>;

/// Create a connected producer/consumer pair
#[must_use]
pub fn deferred<T>() -> (Completion<T>, Deferred<T>) {
    let (sender, receiver) = oneshot::channel();
    (
        Completion { sender },
        Deferred {
            receiver: Some(receiver),
        },
    )
}

/// Producer half of a deferred result
#[derive(Debug)]
pub struct Completion<T> {
    sender: oneshot::Sender<TaskResult<T>>,
}

impl<T> Completion<T> {
    /// Report the result.
    ///
    /// Returns `false` when the consumer has already lost interest; the value is
    /// dropped in that case.
    pub fn complete(self, value: T) -> bool {
        self.sender.send(Ok(value)).is_ok()
    }

    pub(crate) fn fail(self, error: TaskError) -> bool {
        self.sender.send(Err(error)).is_ok()
    }

    /// Whether the consumer half has been dropped
    #[must_use]
    pub fn is_abandoned(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Consumer half of a deferred result
///
/// Resolves exactly once. Polling again after it resolved returns `Pending`
/// instead of panicking.
#[derive(Debug)]
pub struct Deferred<T> {
    receiver: Option<oneshot::Receiver<TaskResult<T>>>,
}

impl<T> Deferred<T> {
    /// Create a `Deferred` that is already resolved
    #[must_use]
    pub fn ready(value: T) -> Self {
        let (completion, deferred) = deferred();
        completion.complete(value);
        deferred
    }

    /// Whether the result has already been handed out
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.receiver.is_none()
    }
}

impl<T> Future for Deferred<T> {
    type Output = TaskResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        let Some(receiver) = this.receiver.as_mut() else {
            return Poll::Pending;
        };

        match Pin::new(receiver).poll(cx) {
            Poll::Ready(outcome) => {
                this.receiver = None;
                Poll::Ready(outcome.unwrap_or(Err(TaskError::Dropped)))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
