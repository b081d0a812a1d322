//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into the matcher and the registry client. Library code never reads environment
//! variables; binaries collect the raw values and hand them to [`MatchConfig::from_env_values`].

use crate::constants::{
    DEFAULT_INITIAL_BACKOFF_MS, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_BACKOFF_MS,
    DEFAULT_MAX_CONCURRENT_PATIENTS, DEFAULT_MAX_CONCURRENT_QUERIES, DEFAULT_REGISTRY_BASE_URL,
    DEFAULT_REQUEST_TIMEOUT_SECS, ENV_DEDUPLICATE_TRIALS, ENV_INITIAL_BACKOFF_MS,
    ENV_MAX_ATTEMPTS, ENV_MAX_CONCURRENT_PATIENTS, ENV_MAX_CONCURRENT_QUERIES, ENV_PAGE_SIZE,
    ENV_REGISTRY_URL, ENV_REQUEST_TIMEOUT_SECS,
};
use crate::retry::RetryPolicy;
use crate::{MatchError, MatchResult};
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Largest page the ClinicalTrials.gov v2 API serves.
const MAX_PAGE_SIZE: u32 = 1_000;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct MatchConfig {
    registry_base_url: String,
    request_timeout: Duration,
    retry: RetryPolicy,
    max_concurrent_queries: usize,
    max_concurrent_patients: usize,
    deduplicate_trials: bool,
    page_size: Option<u32>,
}

/// Raw, unparsed configuration values, typically read from the environment.
#[derive(Clone, Debug, Default)]
pub struct MatchConfigValues {
    pub registry_url: Option<String>,
    pub request_timeout_secs: Option<String>,
    pub max_attempts: Option<String>,
    pub initial_backoff_ms: Option<String>,
    pub max_concurrent_queries: Option<String>,
    pub max_concurrent_patients: Option<String>,
    pub page_size: Option<String>,
    pub deduplicate_trials: Option<String>,
}

impl MatchConfigValues {
    /// Collects raw values by variable name, e.g. `|name| std::env::var(name).ok()`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            registry_url: lookup(ENV_REGISTRY_URL),
            request_timeout_secs: lookup(ENV_REQUEST_TIMEOUT_SECS),
            max_attempts: lookup(ENV_MAX_ATTEMPTS),
            initial_backoff_ms: lookup(ENV_INITIAL_BACKOFF_MS),
            max_concurrent_queries: lookup(ENV_MAX_CONCURRENT_QUERIES),
            max_concurrent_patients: lookup(ENV_MAX_CONCURRENT_PATIENTS),
            page_size: lookup(ENV_PAGE_SIZE),
            deduplicate_trials: lookup(ENV_DEDUPLICATE_TRIALS),
        }
    }
}

impl MatchConfig {
    /// Create a new `MatchConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::InvalidInput`] if the registry URL is not http(s), the timeout
    /// is zero, a concurrency limit is zero, or the page size is outside `1..=1000`.
    pub fn new(
        registry_base_url: String,
        request_timeout: Duration,
        retry: RetryPolicy,
        max_concurrent_queries: usize,
        max_concurrent_patients: usize,
        deduplicate_trials: bool,
        page_size: Option<u32>,
    ) -> MatchResult<Self> {
        let registry_base_url = registry_base_url.trim().to_string();
        if !(registry_base_url.starts_with("http://") || registry_base_url.starts_with("https://"))
        {
            return Err(MatchError::InvalidInput(format!(
                "registry URL must be http(s), got {registry_base_url:?}"
            )));
        }
        if request_timeout.is_zero() {
            return Err(MatchError::InvalidInput(
                "request timeout cannot be zero".into(),
            ));
        }
        for limit in [max_concurrent_queries, max_concurrent_patients] {
            if limit == 0 || limit > Semaphore::MAX_PERMITS {
                return Err(MatchError::InvalidInput(format!(
                    "concurrency limits must be between 1 and {}, got {limit}",
                    Semaphore::MAX_PERMITS
                )));
            }
        }
        if let Some(size) = page_size {
            if size == 0 || size > MAX_PAGE_SIZE {
                return Err(MatchError::InvalidInput(format!(
                    "page size must be between 1 and {MAX_PAGE_SIZE}, got {size}"
                )));
            }
        }

        Ok(Self {
            registry_base_url,
            request_timeout,
            retry,
            max_concurrent_queries,
            max_concurrent_patients,
            deduplicate_trials,
            page_size,
        })
    }

    /// Build a `MatchConfig` from optional raw values, applying defaults for anything
    /// missing or blank.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::InvalidInput`] if a present value cannot be parsed or the
    /// resulting configuration is invalid.
    pub fn from_env_values(values: MatchConfigValues) -> MatchResult<Self> {
        let registry_base_url = non_blank(values.registry_url)
            .unwrap_or_else(|| DEFAULT_REGISTRY_BASE_URL.to_string());
        let timeout_secs: u64 = parse_or("request timeout", values.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS)?;
        let max_attempts: u32 = parse_or("max attempts", values.max_attempts, DEFAULT_MAX_ATTEMPTS)?;
        let initial_backoff_ms: u64 = parse_or("initial backoff", values.initial_backoff_ms, DEFAULT_INITIAL_BACKOFF_MS)?;
        let max_concurrent_queries: usize = parse_or(
            "max concurrent queries",
            values.max_concurrent_queries,
            DEFAULT_MAX_CONCURRENT_QUERIES,
        )?;
        let max_concurrent_patients: usize = parse_or(
            "max concurrent patients",
            values.max_concurrent_patients,
            DEFAULT_MAX_CONCURRENT_PATIENTS,
        )?;
        let page_size: Option<u32> = non_blank(values.page_size)
            .map(|v| parse_value("page size", &v))
            .transpose()?;
        let deduplicate_trials = non_blank(values.deduplicate_trials)
            .map(|v| parse_flag(&v))
            .transpose()?
            .unwrap_or(true);

        let initial_backoff = Duration::from_millis(initial_backoff_ms);
        let max_backoff = Duration::from_millis(DEFAULT_MAX_BACKOFF_MS).max(initial_backoff);
        let retry = RetryPolicy::new(max_attempts, initial_backoff, max_backoff)?;

        Self::new(
            registry_base_url,
            Duration::from_secs(timeout_secs),
            retry,
            max_concurrent_queries,
            max_concurrent_patients,
            deduplicate_trials,
            page_size,
        )
    }

    pub fn registry_base_url(&self) -> &str {
        &self.registry_base_url
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn retry(&self) -> RetryPolicy {
        self.retry
    }

    pub fn max_concurrent_queries(&self) -> usize {
        self.max_concurrent_queries
    }

    pub fn max_concurrent_patients(&self) -> usize {
        self.max_concurrent_patients
    }

    /// Whether a trial surfacing under several conditions is reported once per patient.
    pub fn deduplicate_trials(&self) -> bool {
        self.deduplicate_trials
    }

    pub fn page_size(&self) -> Option<u32> {
        self.page_size
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            registry_base_url: DEFAULT_REGISTRY_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
            max_concurrent_queries: DEFAULT_MAX_CONCURRENT_QUERIES,
            max_concurrent_patients: DEFAULT_MAX_CONCURRENT_PATIENTS,
            deduplicate_trials: true,
            page_size: None,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_value<T: FromStr>(name: &str, value: &str) -> MatchResult<T> {
    value
        .parse::<T>()
        .map_err(|_| MatchError::InvalidInput(format!("invalid {name}: {value:?}")))
}

fn parse_or<T: FromStr>(name: &str, value: Option<String>, default: T) -> MatchResult<T> {
    match non_blank(value) {
        Some(v) => parse_value(name, &v),
        None => Ok(default),
    }
}

fn parse_flag(value: &str) -> MatchResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(MatchError::InvalidInput(format!(
            "invalid boolean flag: {value:?}"
        ))),
    }
}
