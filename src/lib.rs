//! Retry fallible work with a backoff schedule, jitter, error classification
//! and cancellation.
//!
//! ```
//! use std::time::Duration;
//! use retrier::retry::{constant_backoff, Retrier};
//!
//! let r: Retrier<std::io::Error> =
//!     Retrier::new(constant_backoff(3, Duration::from_millis(1)), None);
//! let res = r.run(|| {
//!     // do some work
//!     Ok(())
//! });
//! assert!(res.is_ok());
//! ```

pub mod config;
pub mod retry;

pub use config::{BackoffConfig, RetryConfig};
pub use retry::{
    err_with_backoff, Blacklist, CancelReason, CancelToken, Cancellation, Classifier, RetryError,
    Retrier, WorkError, Whitelist,
};
