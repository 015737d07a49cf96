use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::retry::{self, Classifier, Retrier};

/// Upper bound on `attempts` in a `[backoff]` table.
pub const MAX_ATTEMPTS: usize = 100_000;

/// Shape of the backoff schedule (the `[backoff]` table in TOML).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackoffConfig {
    /// No retries: work runs once.
    #[default]
    None,
    /// `attempts` retries, each after `delay_secs`.
    Constant { attempts: usize, delay_secs: f64 },
    /// `attempts` retries doubling from `initial_secs`, optionally capped.
    Exponential {
        attempts: usize,
        initial_secs: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limit_secs: Option<f64>,
    },
    /// Delays spelled out one by one (e.g. 0.5 = 500ms).
    Explicit { delays_secs: Vec<f64> },
}

/// Retrier settings loadable from a TOML file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Jitter fraction in `[0, 1]`.
    #[serde(default)]
    pub jitter: f64,
    #[serde(default)]
    pub infinite_retry: bool,
    /// On cancellation, report the last work error instead of the cancel reason.
    #[serde(default)]
    pub surface_work_errors: bool,
    #[serde(default)]
    pub backoff: BackoffConfig,
}

impl RetryConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: RetryConfig = toml::from_str(s).context("invalid retry config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading retry config {}", path.display()))?;
        let cfg = Self::from_toml_str(&data)
            .with_context(|| format!("loading retry config {}", path.display()))?;
        tracing::debug!("loaded retry config from {}", path.display());
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.jitter) {
            bail!("jitter must be within [0, 1], got {}", self.jitter);
        }
        self.schedule().map(|_| ())
    }

    /// Expand the `[backoff]` table into a concrete schedule.
    pub fn schedule(&self) -> Result<Vec<Duration>> {
        let attempts = match &self.backoff {
            BackoffConfig::Constant { attempts, .. }
            | BackoffConfig::Exponential { attempts, .. } => *attempts,
            BackoffConfig::None | BackoffConfig::Explicit { .. } => 0,
        };
        if attempts > MAX_ATTEMPTS {
            bail!("attempts must be at most {}, got {}", MAX_ATTEMPTS, attempts);
        }
        Ok(match &self.backoff {
            BackoffConfig::None => Vec::new(),
            BackoffConfig::Constant {
                attempts,
                delay_secs,
            } => retry::constant_backoff(*attempts, secs("delay_secs", *delay_secs)?),
            BackoffConfig::Exponential {
                attempts,
                initial_secs,
                limit_secs: None,
            } => retry::exponential_backoff(*attempts, secs("initial_secs", *initial_secs)?),
            BackoffConfig::Exponential {
                attempts,
                initial_secs,
                limit_secs: Some(limit),
            } => retry::limited_exponential_backoff(
                *attempts,
                secs("initial_secs", *initial_secs)?,
                secs("limit_secs", *limit)?,
            ),
            BackoffConfig::Explicit { delays_secs } => delays_secs
                .iter()
                .map(|d| secs("delays_secs", *d))
                .collect::<Result<Vec<_>>>()?,
        })
    }

    /// Build a configured retrier.
    pub fn build_retrier<E>(
        &self,
        classifier: Option<Box<dyn Classifier<E>>>,
    ) -> Result<Retrier<E>> {
        self.validate()?;
        let mut r = Retrier::new(self.schedule()?, classifier);
        r.set_jitter(self.jitter);
        if self.infinite_retry {
            r = r.with_infinite_retry();
        }
        if self.surface_work_errors {
            r = r.with_surface_work_errors();
        }
        Ok(r)
    }
}

fn secs(field: &str, value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value).with_context(|| format!("invalid {}: {}", field, value))
}
