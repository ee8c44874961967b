use std::time::Duration;

use chrono::TimeDelta;

use crate::error::AppError;

/// Retry budget for one interaction with the remote UI.
///
/// The defaults are empirically tuned values, not invariants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one.
    pub max_try: u32,
    /// Fixed sleep between attempts.
    pub backoff: Duration,
    /// Upper bound for a single attempt's wait on the remote UI.
    pub wait_timeout: Duration,
    /// Polling interval inside one attempt.
    pub poll_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_try: 3,
            backoff: Duration::from_secs(5),
            wait_timeout: Duration::from_secs(3),
            poll_interval: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_try(mut self, max_try: u32) -> Self {
        self.max_try = max_try;
        self
    }

    /// Worst-case time a caller can be blocked by one retried interaction.
    pub fn worst_case(&self) -> Duration {
        (self.backoff + self.wait_timeout) * self.max_try
    }
}

/// Tunables for the whole acquisition pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub retry: RetryPolicy,
    /// Maximum cached-record age before a fresh scrape is required.
    pub freshness: TimeDelta,
    /// Upper bound on scroll-and-requery iterations in collection loops.
    pub scroll_ceiling: usize,
    /// Quiet period the page must stay idle before a read.
    pub settle_delay: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            freshness: TimeDelta::days(1),
            scroll_ceiling: 10,
            settle_delay: Duration::from_millis(500),
        }
    }
}

impl PipelineConfig {
    /// Read configuration from environment variables, falling back to the
    /// defaults for anything unset.
    ///
    /// - `DOSSIER_MAX_TRY` (attempts, at least 1)
    /// - `DOSSIER_BACKOFF_SECS`
    /// - `DOSSIER_WAIT_TIMEOUT_SECS`
    /// - `DOSSIER_FRESHNESS_DAYS` (at least 1)
    /// - `DOSSIER_SCROLL_CEILING`
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Self::default();

        let max_try = parse_var(&lookup, "DOSSIER_MAX_TRY", defaults.retry.max_try)?;
        if max_try == 0 {
            return Err(AppError::ConfigError(
                "DOSSIER_MAX_TRY must be at least 1".into(),
            ));
        }
        let backoff = parse_var(
            &lookup,
            "DOSSIER_BACKOFF_SECS",
            defaults.retry.backoff.as_secs(),
        )?;
        let wait_timeout = parse_var(
            &lookup,
            "DOSSIER_WAIT_TIMEOUT_SECS",
            defaults.retry.wait_timeout.as_secs(),
        )?;
        let freshness_days = parse_var(
            &lookup,
            "DOSSIER_FRESHNESS_DAYS",
            defaults.freshness.num_days(),
        )?;
        let freshness = TimeDelta::try_days(freshness_days)
            .filter(|_| freshness_days > 0)
            .ok_or_else(|| {
                AppError::ConfigError(format!(
                    "DOSSIER_FRESHNESS_DAYS must be a positive number of days, got {freshness_days}"
                ))
            })?;
        let scroll_ceiling = parse_var(&lookup, "DOSSIER_SCROLL_CEILING", defaults.scroll_ceiling)?;

        Ok(Self {
            retry: RetryPolicy {
                max_try,
                backoff: Duration::from_secs(backoff),
                wait_timeout: Duration::from_secs(wait_timeout),
                ..defaults.retry
            },
            freshness,
            scroll_ceiling,
            ..defaults
        })
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, AppError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            AppError::ConfigError(format!("Invalid {key} '{raw}': expected a number"))
        }),
    }
}
