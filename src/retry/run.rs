//! Retry loop: run work until success, a terminal error, exhaustion or cancel.

use std::time::Duration;

use super::cancel::{CancelReason, Cancellation};
use super::error::{RetryError, WorkError};
use super::policy::Retrier;

impl<E> Retrier<E> {
    /// Runs `work` until it succeeds or the retrier says to stop.
    /// Waits between attempts block the calling thread.
    pub fn run<T, F>(&self, mut work: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Result<T, WorkError<E>>,
    {
        self.run_loop(None, |_| work())
    }

    /// Like [`run`](Self::run), but `work` receives `signal`, and the loop
    /// stops early once it fires.
    pub fn run_ctx<T, S, F>(&self, signal: &S, mut work: F) -> Result<T, RetryError<E>>
    where
        S: Cancellation,
        F: FnMut(&S) -> Result<T, WorkError<E>>,
    {
        self.run_loop(Some(signal), |_| work(signal))
    }

    /// Like [`run_ctx`](Self::run_ctx), and `work` also receives the
    /// 0-based attempt index.
    pub fn run_fn<T, S, F>(&self, signal: &S, mut work: F) -> Result<T, RetryError<E>>
    where
        S: Cancellation,
        F: FnMut(&S, usize) -> Result<T, WorkError<E>>,
    {
        self.run_loop(Some(signal), |attempt| work(signal, attempt))
    }

    fn run_loop<T, F>(
        &self,
        signal: Option<&dyn Cancellation>,
        mut work: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut(usize) -> Result<T, WorkError<E>>,
    {
        let mut attempt = 0usize;
        loop {
            let (cause, backoff) = match work(attempt) {
                Ok(value) => return Ok(value),
                Err(e) => e.into_parts(),
            };

            if let Some(classifier) = &self.classifier {
                if !classifier.classify(&cause) {
                    tracing::debug!(attempt, "error classified as not retryable");
                    return Err(RetryError::Work(cause));
                }
            }

            if attempt >= self.backoff.len() && !self.infinite_retry {
                if !self.backoff.is_empty() {
                    tracing::warn!(attempts = attempt + 1, "retry schedule exhausted");
                }
                return Err(RetryError::Work(cause));
            }

            let delay = self.next_delay(attempt, backoff);
            tracing::debug!(
                attempt,
                ?delay,
                overridden = backoff.is_some(),
                "attempt failed, retrying"
            );

            if let Some(reason) = wait(signal, delay) {
                tracing::info!(attempt, %reason, "retry cancelled");
                return Err(if self.surface_work_errors {
                    RetryError::Work(cause)
                } else {
                    RetryError::Cancelled(reason)
                });
            }
            attempt += 1;
        }
    }

    /// The override wins verbatim; otherwise the jittered schedule entry.
    fn next_delay(&self, attempt: usize, backoff: Option<Duration>) -> Duration {
        backoff.unwrap_or_else(|| self.calc_sleep(attempt))
    }
}

/// Sleeps for `delay`, returning early with the reason if `signal` fires.
/// A signal that already fired wins even over a zero delay.
fn wait(signal: Option<&dyn Cancellation>, delay: Duration) -> Option<CancelReason> {
    match signal {
        Some(signal) => signal
            .cancelled()
            .or_else(|| signal.wait_timeout(delay)),
        None => {
            std::thread::sleep(delay);
            None
        }
    }
}
