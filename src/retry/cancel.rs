//! Cancellation signals consulted between attempts.
//!
//! The retry loop only needs two questions answered: has the signal fired, and
//! can it wait for a while but wake up early if it fires. [`CancelToken`] is a
//! shared token that a control thread flips to stop a retry loop; its waits are
//! interruptible so a long backoff ends promptly.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Why a signal fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CancelReason {
    #[error("operation canceled")]
    Canceled,
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// External cancellation contract.
pub trait Cancellation {
    /// The reason if the signal has already fired.
    fn cancelled(&self) -> Option<CancelReason>;

    /// Blocks for up to `timeout`. Returns early with the reason if the signal
    /// fires; returns `None` once the full timeout has elapsed.
    fn wait_timeout(&self, timeout: Duration) -> Option<CancelReason>;
}

impl<C: Cancellation + ?Sized> Cancellation for &C {
    fn cancelled(&self) -> Option<CancelReason> {
        (**self).cancelled()
    }

    fn wait_timeout(&self, timeout: Duration) -> Option<CancelReason> {
        (**self).wait_timeout(timeout)
    }
}

#[derive(Debug, Default)]
struct Inner {
    cancelled: Mutex<bool>,
    wake: Condvar,
    deadline: Option<Instant>,
}

/// Cloneable cancellation token; all clones share one state.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that fires with [`CancelReason::DeadlineExceeded`] at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            inner: Arc::new(Inner {
                deadline: Some(deadline),
                ..Inner::default()
            }),
        }
    }

    /// Token whose deadline is `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => Self::with_deadline(deadline),
            None => Self::new(),
        }
    }

    /// Fire the token and wake every waiter.
    pub fn cancel(&self) {
        *self.lock() = true;
        self.inner.wake.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled().is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.inner
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn reason(&self, cancelled: bool, now: Instant) -> Option<CancelReason> {
        if cancelled {
            return Some(CancelReason::Canceled);
        }
        match self.inner.deadline {
            Some(d) if now >= d => Some(CancelReason::DeadlineExceeded),
            _ => None,
        }
    }
}

impl Cancellation for CancelToken {
    fn cancelled(&self) -> Option<CancelReason> {
        let cancelled = *self.lock();
        self.reason(cancelled, Instant::now())
    }

    fn wait_timeout(&self, timeout: Duration) -> Option<CancelReason> {
        let end = Instant::now().checked_add(timeout);
        let mut guard = self.lock();
        loop {
            let now = Instant::now();
            if let Some(reason) = self.reason(*guard, now) {
                return Some(reason);
            }
            if end.is_some_and(|end| now >= end) {
                return None;
            }
            // Wake at whichever comes first: the end of the wait or the deadline.
            let wake_at = match (end, self.inner.deadline) {
                (Some(e), Some(d)) => Some(e.min(d)),
                (e, d) => e.or(d),
            };
            guard = match wake_at {
                Some(at) => {
                    self.inner
                        .wake
                        .wait_timeout(guard, at.saturating_duration_since(now))
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
                None => self
                    .inner
                    .wake
                    .wait(guard)
                    .unwrap_or_else(PoisonError::into_inner),
            };
        }
    }
}
