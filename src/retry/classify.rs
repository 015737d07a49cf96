//! Classify work errors into retryable and terminal.

/// Decides whether an error permits another attempt.
///
/// A retrier without a classifier treats every error as retryable. Any
/// `Fn(&E) -> bool` closure that is `Send + Sync` is also a classifier.
pub trait Classifier<E>: Send + Sync {
    /// Returns `true` if another attempt may follow `err`.
    fn classify(&self, err: &E) -> bool;
}

impl<E, F> Classifier<E> for F
where
    F: Fn(&E) -> bool + Send + Sync,
{
    fn classify(&self, err: &E) -> bool {
        self(err)
    }
}

/// Retries only the listed errors; anything else is terminal.
///
/// An empty whitelist retries nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Whitelist<E>(Vec<E>);

impl<E> Whitelist<E> {
    pub fn new(errors: impl IntoIterator<Item = E>) -> Self {
        Self(errors.into_iter().collect())
    }
}

impl<E> FromIterator<E> for Whitelist<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<E> Classifier<E> for Whitelist<E>
where
    E: PartialEq + Send + Sync,
{
    fn classify(&self, err: &E) -> bool {
        self.0.contains(err)
    }
}

/// Retries everything except the listed errors.
///
/// An empty blacklist retries everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blacklist<E>(Vec<E>);

impl<E> Blacklist<E> {
    pub fn new(errors: impl IntoIterator<Item = E>) -> Self {
        Self(errors.into_iter().collect())
    }
}

impl<E> FromIterator<E> for Blacklist<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<E> Classifier<E> for Blacklist<E>
where
    E: PartialEq + Send + Sync,
{
    fn classify(&self, err: &E) -> bool {
        !self.0.contains(err)
    }
}
