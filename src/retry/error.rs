//! Error types flowing in and out of the retry loop.

use std::time::Duration;
use thiserror::Error;

use super::cancel::CancelReason;

/// Error returned by one attempt of the work closure.
///
/// Wraps the real cause and, optionally, a delay that replaces the schedule
/// for the next wait only. Any `E` converts into a `WorkError<E>` without an
/// override, so `?` works inside work closures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{cause}")]
pub struct WorkError<E> {
    cause: E,
    backoff: Option<Duration>,
}

impl<E> WorkError<E> {
    pub fn new(cause: E) -> Self {
        Self {
            cause,
            backoff: None,
        }
    }

    /// Wait exactly `backoff` (no jitter) before the next attempt.
    pub fn with_backoff(cause: E, backoff: Duration) -> Self {
        Self {
            cause,
            backoff: Some(backoff),
        }
    }

    pub fn cause(&self) -> &E {
        &self.cause
    }

    pub fn backoff(&self) -> Option<Duration> {
        self.backoff
    }

    pub fn into_parts(self) -> (E, Option<Duration>) {
        (self.cause, self.backoff)
    }
}

impl<E> From<E> for WorkError<E> {
    fn from(cause: E) -> Self {
        Self::new(cause)
    }
}

/// Shorthand for [`WorkError::with_backoff`].
pub fn err_with_backoff<E>(cause: E, backoff: Duration) -> WorkError<E> {
    WorkError::with_backoff(cause, backoff)
}

/// Final error of a retried call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetryError<E> {
    /// The last work error: terminal, schedule exhausted, or surfaced on cancel.
    #[error("{0}")]
    Work(E),
    /// The cancellation signal fired between attempts.
    #[error("{0}")]
    Cancelled(CancelReason),
}

impl<E> RetryError<E> {
    pub fn work(&self) -> Option<&E> {
        match self {
            RetryError::Work(e) => Some(e),
            RetryError::Cancelled(_) => None,
        }
    }

    pub fn into_work(self) -> Option<E> {
        match self {
            RetryError::Work(e) => Some(e),
            RetryError::Cancelled(_) => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RetryError::Cancelled(_))
    }
}
