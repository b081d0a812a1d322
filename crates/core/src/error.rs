#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("malformed duration: {0:?}")]
    MalformedDuration(String),
    #[error("registry unavailable for condition {condition:?}: {reason}")]
    RegistryUnavailable { condition: String, reason: String },
    #[error("judgment unavailable: {0}")]
    JudgmentUnavailable(String),

    #[error("FHIR error: {0}")]
    Fhir(#[from] fhir::FhirError),
    #[error("failed to write output file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to serialize results: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to write CSV: {0}")]
    Csv(csv::Error),
}

pub type MatchResult<T> = std::result::Result<T, MatchError>;
