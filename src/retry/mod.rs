//! Retry with backoff.
//!
//! [`Retrier`] re-runs fallible work according to a backoff schedule, with
//! optional jitter, error classification and cancellation. Work may return a
//! [`WorkError`] carrying a one-off delay that overrides the schedule.

mod cancel;
mod classify;
mod error;
mod policy;
mod run;
mod schedule;

pub use cancel::{CancelReason, CancelToken, Cancellation};
pub use classify::{Blacklist, Classifier, Whitelist};
pub use error::{err_with_backoff, RetryError, WorkError};
pub use policy::Retrier;
pub use schedule::{constant_backoff, exponential_backoff, limited_exponential_backoff};
