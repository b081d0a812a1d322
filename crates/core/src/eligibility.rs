//! Per-trial eligibility pipeline: structured rules, then exclusion clauses.

use crate::criteria::split_criteria;
use crate::exclusion::evaluate_exclusions;
use crate::judge::ClauseJudge;
use crate::patient::PatientProfile;
use crate::structured::evaluate_structured;
use crate::trial::TrialRecord;
use crate::MatchResult;

/// Why a trial was removed from a patient's result set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Disqualification {
    AgeOutOfRange,
    SexMismatch,
    /// The patient meets this exclusion clause.
    ExcludedBy(String),
}

impl std::fmt::Display for Disqualification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Disqualification::AgeOutOfRange => f.write_str("age outside the study's range"),
            Disqualification::SexMismatch => f.write_str("sex does not match the study's requirement"),
            Disqualification::ExcludedBy(clause) => write!(f, "meets exclusion criterion {clause:?}"),
        }
    }
}

/// Result of evaluating one trial for one patient.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Every rule and clause passed; justifications are in evaluation order.
    Passed(Vec<String>),
    Disqualified(Disqualification),
}

impl Verdict {
    pub fn is_passed(&self) -> bool {
        matches!(self, Verdict::Passed(_))
    }

    /// Justifications of a passing verdict that has at least one; `None` otherwise.
    pub fn into_justifications(self) -> Option<Vec<String>> {
        match self {
            Verdict::Passed(j) if !j.is_empty() => Some(j),
            _ => None,
        }
    }
}

/// Runs the structured rules and, if they pass, the exclusion clauses for one trial.
///
/// # Errors
///
/// Returns [`crate::MatchError::MalformedDuration`] if the trial's age limits cannot be
/// normalised. No rule is evaluated in that case.
pub async fn evaluate_trial<J>(
    patient: &PatientProfile,
    trial: &TrialRecord,
    judge: &J,
) -> MatchResult<Verdict>
where
    J: ClauseJudge + ?Sized,
{
    let (min_age, max_age) = trial.age_range()?;
    let sections = split_criteria(&trial.eligibility_criteria);

    let structured = evaluate_structured(
        patient.age(),
        patient.sex(),
        min_age,
        max_age,
        trial.sex,
        sections.inclusion,
    );

    let verdict = match structured {
        Verdict::Passed(justifications) => {
            evaluate_exclusions(sections.exclusion, patient.facts(), judge, justifications).await
        }
        disqualified => disqualified,
    };

    Ok(verdict)
}
