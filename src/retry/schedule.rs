//! Backoff schedules: the ordered delays a retrier waits between attempts.
//!
//! A schedule is a plain `Vec<Duration>`; entry `n` is the wait before the
//! attempt that follows the `n`-th failure. These helpers build the common
//! shapes.

use std::time::Duration;

/// `n` copies of `delay`.
pub fn constant_backoff(n: usize, delay: Duration) -> Vec<Duration> {
    vec![delay; n]
}

/// `n` delays starting at `initial` and doubling each step.
///
/// Saturates at `Duration::MAX` instead of overflowing.
pub fn exponential_backoff(n: usize, initial: Duration) -> Vec<Duration> {
    limited_exponential_backoff(n, initial, Duration::MAX)
}

/// Like [`exponential_backoff`], but no entry exceeds `limit`.
pub fn limited_exponential_backoff(n: usize, initial: Duration, limit: Duration) -> Vec<Duration> {
    let mut next = initial;
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        out.push(next.min(limit));
        next = next.saturating_mul(2);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_repeats_delay() {
        let s = constant_backoff(3, Duration::from_millis(100));
        assert_eq!(s, vec![Duration::from_millis(100); 3]);
        assert!(constant_backoff(0, Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn exponential_doubles() {
        let s = exponential_backoff(4, Duration::from_millis(10));
        assert_eq!(
            s,
            vec![
                Duration::from_millis(10),
                Duration::from_millis(20),
                Duration::from_millis(40),
                Duration::from_millis(80),
            ]
        );
    }

    #[test]
    fn exponential_saturates_instead_of_overflowing() {
        let s = exponential_backoff(3, Duration::MAX / 2 + Duration::from_secs(1));
        assert_eq!(s[1], Duration::MAX);
        assert_eq!(s[2], Duration::MAX);
    }

    #[test]
    fn limited_exponential_is_capped() {
        let s = limited_exponential_backoff(
            5,
            Duration::from_millis(100),
            Duration::from_millis(300),
        );
        assert_eq!(
            s,
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(300),
                Duration::from_millis(300),
                Duration::from_millis(300),
            ]
        );
    }
}
