use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use super::classify::Classifier;

/// Retry policy: backoff schedule, jitter, optional classifier and modes.
///
/// Configure it with the `with_*` methods, which take `self` by value, then
/// share it (e.g. behind an `Arc`) for concurrent runs. Each run keeps its
/// own attempt counter; the retrier holds no per-call state.
pub struct Retrier<E> {
    pub(super) backoff: Vec<Duration>,
    pub(super) classifier: Option<Box<dyn Classifier<E>>>,
    pub(super) jitter: f64,
    pub(super) infinite_retry: bool,
    pub(super) surface_work_errors: bool,
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl<E> Retrier<E> {
    /// Create a retrier. An empty `backoff` means work runs exactly once;
    /// `None` for `classifier` retries every error.
    pub fn new(backoff: Vec<Duration>, classifier: Option<Box<dyn Classifier<E>>>) -> Self {
        Self {
            backoff,
            classifier,
            jitter: 0.0,
            infinite_retry: false,
            surface_work_errors: false,
            rng: Mutex::new(Box::new(SmallRng::from_os_rng())),
        }
    }

    /// Keep retrying after the schedule runs out, reusing its last delay
    /// (zero for an empty schedule).
    pub fn with_infinite_retry(mut self) -> Self {
        self.infinite_retry = true;
        self
    }

    /// On cancellation, return the last work error instead of the
    /// cancellation reason.
    pub fn with_surface_work_errors(mut self) -> Self {
        self.surface_work_errors = true;
        self
    }

    pub fn with_classifier(mut self, classifier: impl Classifier<E> + 'static) -> Self {
        self.classifier = Some(Box::new(classifier));
        self
    }

    /// Replace the random source used for jitter (e.g. a seeded generator).
    pub fn with_rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        *self.rng.get_mut().unwrap_or_else(PoisonError::into_inner) = Box::new(rng);
        self
    }

    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.set_jitter(jitter);
        self
    }

    /// Set the jitter fraction. Values outside `[0, 1]` (and NaN) are ignored.
    pub fn set_jitter(&mut self, jitter: f64) {
        if (0.0..=1.0).contains(&jitter) {
            self.jitter = jitter;
        }
    }

    pub fn jitter(&self) -> f64 {
        self.jitter
    }

    pub fn backoff(&self) -> &[Duration] {
        &self.backoff
    }

    pub fn is_infinite_retry(&self) -> bool {
        self.infinite_retry
    }

    pub fn surfaces_work_errors(&self) -> bool {
        self.surface_work_errors
    }

    /// Scheduled delay for `attempt` (0-based) with jitter applied.
    ///
    /// Past the end of the schedule the last entry repeats.
    pub(super) fn calc_sleep(&self, attempt: usize) -> Duration {
        let delay = match self.backoff.get(attempt) {
            Some(d) => *d,
            None => self.backoff.last().copied().unwrap_or(Duration::ZERO),
        };
        if self.jitter == 0.0 || delay.is_zero() {
            return delay;
        }
        let offset: f64 = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            rng.random_range(-self.jitter..=self.jitter)
        };
        let factor = (1.0 + offset).max(0.0);
        Duration::try_from_secs_f64(delay.as_secs_f64() * factor).unwrap_or(Duration::MAX)
    }
}

impl<E> fmt::Debug for Retrier<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retrier")
            .field("backoff", &self.backoff)
            .field("classifier", &self.classifier.is_some())
            .field("jitter", &self.jitter)
            .field("infinite_retry", &self.infinite_retry)
            .field("surface_work_errors", &self.surface_work_errors)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::Whitelist;

    fn retrier(backoff: Vec<Duration>) -> Retrier<&'static str> {
        Retrier::new(backoff, None)
    }

    #[test]
    fn calc_sleep_without_jitter_is_exact() {
        let r = retrier(vec![
            Duration::ZERO,
            Duration::from_millis(10),
            Duration::from_secs(4 * 3600),
        ]);
        assert_eq!(r.calc_sleep(0), Duration::ZERO);
        assert_eq!(r.calc_sleep(1), Duration::from_millis(10));
        assert_eq!(r.calc_sleep(2), Duration::from_secs(4 * 3600));
    }

    #[test]
    fn calc_sleep_with_jitter_stays_in_bounds() {
        let mut r = retrier(vec![
            Duration::ZERO,
            Duration::from_millis(10),
            Duration::from_secs(4 * 3600),
        ]);
        r.set_jitter(0.25);
        for _ in 0..100 {
            assert_eq!(r.calc_sleep(0), Duration::ZERO);

            let d = r.calc_sleep(1);
            assert!(
                d >= Duration::from_micros(7_500) && d <= Duration::from_micros(12_500),
                "{:?} outside jitter bounds",
                d
            );

            let d = r.calc_sleep(2);
            assert!(
                d >= Duration::from_secs(3 * 3600) && d <= Duration::from_secs(5 * 3600),
                "{:?} outside jitter bounds",
                d
            );
        }
    }

    #[test]
    fn full_jitter_never_goes_negative() {
        let r = retrier(vec![Duration::from_millis(100)]).with_jitter(1.0);
        for _ in 0..100 {
            assert!(r.calc_sleep(0) <= Duration::from_millis(200));
        }
    }

    #[test]
    fn invalid_jitter_is_ignored() {
        let mut r = retrier(vec![Duration::from_millis(10)]);
        r.set_jitter(0.25);
        assert_eq!(r.jitter(), 0.25);

        r.set_jitter(-1.0);
        assert_eq!(r.jitter(), 0.25);
        r.set_jitter(2.0);
        assert_eq!(r.jitter(), 0.25);
        r.set_jitter(f64::NAN);
        assert_eq!(r.jitter(), 0.25);

        r.set_jitter(0.0);
        assert_eq!(r.jitter(), 0.0);
        r.set_jitter(1.0);
        assert_eq!(r.jitter(), 1.0);
    }

    #[test]
    fn past_the_schedule_repeats_last_delay() {
        let r = retrier(vec![Duration::ZERO, Duration::from_millis(10)]);
        assert_eq!(r.calc_sleep(2), Duration::from_millis(10));
        assert_eq!(r.calc_sleep(50), Duration::from_millis(10));

        let empty = retrier(Vec::new());
        assert_eq!(empty.calc_sleep(0), Duration::ZERO);
        assert_eq!(empty.calc_sleep(7), Duration::ZERO);
    }

    #[test]
    fn seeded_rng_gives_reproducible_jitter() {
        let make = || {
            retrier(vec![Duration::from_secs(1); 8])
                .with_jitter(0.5)
                .with_rng(SmallRng::seed_from_u64(42))
        };
        let a = make();
        let b = make();
        let sa: Vec<_> = (0..8).map(|i| a.calc_sleep(i)).collect();
        let sb: Vec<_> = (0..8).map(|i| b.calc_sleep(i)).collect();
        assert_eq!(sa, sb);
    }

    #[test]
    fn builder_sets_modes() {
        let r = retrier(vec![Duration::ZERO])
            .with_infinite_retry()
            .with_surface_work_errors()
            .with_classifier(Whitelist::new(["retry me"]));
        assert!(r.is_infinite_retry());
        assert!(r.surfaces_work_errors());
        assert!(r.classifier.is_some());
        assert_eq!(r.backoff(), &[Duration::ZERO]);
    }

    #[test]
    fn retrier_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Retrier<String>>();
    }
}
