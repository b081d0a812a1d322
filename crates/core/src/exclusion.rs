//! Evaluation of free-text exclusion clauses.
//!
//! The exclusion section is split into bullet clauses (lines starting with `*`). Each clause
//! is judged in source order; the first disqualifying clause ends evaluation.

use crate::constants::BULLET_MARKER;
use crate::eligibility::{Disqualification, Verdict};
use crate::judge::{ClauseJudge, Judgment};
use crate::patient::ClinicalFacts;

/// Extracts the bullet clauses of an exclusion section, in source order.
///
/// A clause is a line starting with `*`. The marker and one following whitespace character
/// are stripped; indented (nested) bullets and blank clauses are ignored.
pub fn exclusion_clauses(section: &str) -> Vec<&str> {
    section
        .lines()
        .filter_map(|line| line.strip_prefix(BULLET_MARKER))
        .map(|rest| {
            rest.strip_prefix(|c: char| c.is_whitespace())
                .unwrap_or(rest)
                .trim_end()
        })
        .filter(|clause| !clause.is_empty())
        .collect()
}

/// Judges every exclusion clause and appends the resulting justifications to
/// `justifications`.
///
/// A missing exclusion section passes `justifications` through unchanged. A
/// [`Judgment::Disqualified`] stops evaluation and discards everything accumulated so
/// far. Judge errors are logged and treated as [`Judgment::NoOpinion`].
pub async fn evaluate_exclusions<J>(
    exclusion: Option<&str>,
    facts: ClinicalFacts<'_>,
    judge: &J,
    mut justifications: Vec<String>,
) -> Verdict
where
    J: ClauseJudge + ?Sized,
{
    let Some(section) = exclusion else {
        return Verdict::Passed(justifications);
    };

    for clause in exclusion_clauses(section) {
        match judge.judge(clause, facts).await {
            Ok(Judgment::Disqualified) => {
                return Verdict::Disqualified(Disqualification::ExcludedBy(clause.to_string()));
            }
            Ok(Judgment::Justification(text)) => {
                let text = text.trim();
                if !text.is_empty() {
                    justifications.push(text.to_string());
                }
            }
            Ok(Judgment::NoOpinion) => {}
            Err(e) => {
                tracing::warn!(clause, error = %e, "clause judgment unavailable; recording no opinion");
            }
        }
    }

    Verdict::Passed(justifications)
}
