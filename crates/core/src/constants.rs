//! Constants used throughout the trialmatch core crate.
//!
//! Registry wire values, criteria markers and configuration defaults live here so the
//! evaluators and the HTTP boundary agree on them.

/// Default ClinicalTrials.gov v2 studies endpoint.
pub const DEFAULT_REGISTRY_BASE_URL: &str = "https://clinicaltrials.gov/api/v2/studies";

/// Overall-status filter applied to every registry query.
pub const RECRUITING_STATUS: &str = "RECRUITING";

/// Marker that starts the exclusion section of an eligibility-criteria blob.
pub const EXCLUSION_MARKER: &str = "Exclusion Criteria";

/// Prefix that identifies a criteria blob consisting of an inclusion section only.
pub const INCLUSION_MARKER: &str = "Inclusion Criteria";

/// Substring whose presence in the inclusion section activates the age rule.
pub const AGE_KEYWORD: &str = "age";

/// Line prefix of an exclusion clause.
pub const BULLET_MARKER: char = '*';

/// Default per-request timeout for registry queries, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default number of attempts per registry query (first try included).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the first retry, in milliseconds.
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 500;

/// Upper bound on the delay between retries, in milliseconds.
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 8_000;

/// Default number of registry queries in flight per patient.
pub const DEFAULT_MAX_CONCURRENT_QUERIES: usize = 4;

/// Default number of patients matched concurrently.
pub const DEFAULT_MAX_CONCURRENT_PATIENTS: usize = 2;

/// Default JSON output filename.
pub const DEFAULT_JSON_OUTPUT: &str = "matchings.json";

/// Default tabular output filename.
pub const DEFAULT_CSV_OUTPUT: &str = "Patient_Trial_Matchings.csv";

/// Environment variables read by the binaries into [`crate::MatchConfigValues`].
pub const ENV_REGISTRY_URL: &str = "TRIALMATCH_REGISTRY_URL";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "TRIALMATCH_REQUEST_TIMEOUT_SECS";
pub const ENV_MAX_ATTEMPTS: &str = "TRIALMATCH_MAX_ATTEMPTS";
pub const ENV_INITIAL_BACKOFF_MS: &str = "TRIALMATCH_INITIAL_BACKOFF_MS";
pub const ENV_MAX_CONCURRENT_QUERIES: &str = "TRIALMATCH_MAX_CONCURRENT_QUERIES";
pub const ENV_MAX_CONCURRENT_PATIENTS: &str = "TRIALMATCH_MAX_CONCURRENT_PATIENTS";
pub const ENV_PAGE_SIZE: &str = "TRIALMATCH_PAGE_SIZE";
pub const ENV_DEDUPLICATE_TRIALS: &str = "TRIALMATCH_DEDUPLICATE_TRIALS";
