//! Shared helpers for integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Once;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Install a test-friendly subscriber once per test binary.
/// Honors `RUST_LOG`; defaults to `retrier=debug`.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("retrier=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_test_writer()
            .with_ansi(false)
            .try_init();
    });
}

/// Errors a flaky remote call might produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("connection reset")]
    Reset,
    #[error("timed out")]
    Timeout,
    #[error("throttled")]
    Throttled,
    #[error("not found")]
    NotFound,
}

/// Scripted work: hands out `errors` in order, then succeeds. Safe to share
/// across threads; counts every call.
pub struct Script {
    errors: Vec<FetchError>,
    calls: AtomicUsize,
}

impl Script {
    pub fn new(errors: impl IntoIterator<Item = FetchError>) -> Self {
        Self {
            errors: errors.into_iter().collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call(&self) -> Result<(), FetchError> {
        let i = self.calls.fetch_add(1, Ordering::SeqCst);
        match self.errors.get(i) {
            Some(e) => Err(*e),
            None => Ok(()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}
