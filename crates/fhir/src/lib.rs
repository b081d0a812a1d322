//! FHIR boundary support for patient-attribute extraction.
//!
//! This crate reads FHIR R4 `Bundle` documents (as exported by Synthea) and extracts the
//! attributes trial matching needs:
//! - patient identifier, administrative sex and birth date
//! - active, confirmed conditions and findings
//! - medications
//!
//! The wire structs are lenient: bundles carry many resource kinds this crate has no use for,
//! and those are skipped rather than rejected.

pub mod bundle;

pub use bundle::{Bundle, BundlePatient};

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid birth date: {0}")]
    InvalidBirthDate(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;
