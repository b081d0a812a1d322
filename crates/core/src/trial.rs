//! Trial records and the registry seam.

use crate::constants::RECRUITING_STATUS;
use crate::duration::AgeBound;
use crate::MatchResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use trialmatch_types::{NonEmptyText, SexEligibility};

/// One candidate trial as returned by the registry.
///
/// Age limits are kept as the registry's raw strings; they are normalised per evaluation
/// so that a malformed limit only affects this trial.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialRecord {
    pub trial_id: NonEmptyText,
    pub title: String,
    #[serde(default)]
    pub sex: SexEligibility,
    #[serde(default)]
    pub minimum_age: Option<String>,
    #[serde(default)]
    pub maximum_age: Option<String>,
    #[serde(default)]
    pub eligibility_criteria: String,
}

impl TrialRecord {
    /// Normalised `(minimum, maximum)` age bounds.
    ///
    /// # Errors
    ///
    /// Returns [`crate::MatchError::MalformedDuration`] if either limit has an unrecognised
    /// unit.
    pub fn age_range(&self) -> MatchResult<(AgeBound, AgeBound)> {
        let min = AgeBound::parse(self.minimum_age.as_deref())?;
        let max = AgeBound::parse(self.maximum_age.as_deref())?;
        Ok((min, max))
    }
}

/// Parameters of one registry search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryQuery {
    /// Condition keyword.
    pub condition: String,
    /// Overall-status filter.
    pub overall_status: &'static str,
}

impl RegistryQuery {
    /// Query for trials currently recruiting for `condition`.
    pub fn recruiting(condition: impl Into<String>) -> Self {
        Self {
            condition: condition.into(),
            overall_status: RECRUITING_STATUS,
        }
    }
}

/// Source of candidate trials.
///
/// Implementations own their transport policy (timeouts, retries). An `Err` means the
/// candidate set for this query could not be obtained; the caller treats it as empty.
#[async_trait]
pub trait TrialRegistry: Send + Sync {
    async fn search(&self, query: &RegistryQuery) -> MatchResult<Vec<TrialRecord>>;
}
