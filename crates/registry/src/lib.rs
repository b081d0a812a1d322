//! # trialmatch registry
//!
//! [`TrialRegistry`](trialmatch_core::TrialRegistry) implementation over the
//! ClinicalTrials.gov v2 REST API. Transport policy (timeouts, retries) lives here; the
//! matcher sees only decoded [`TrialRecord`](trialmatch_core::TrialRecord)s or a
//! registry-unavailable error.

pub mod client;
pub mod error;
pub mod studies;

pub use client::ClinicalTrialsClient;
pub use error::{RegistryError, RegistryResult};
pub use studies::decode_studies;
