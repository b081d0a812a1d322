//! Pluggable judgment of free-text exclusion clauses.
//!
//! The exclusion evaluator hands each clause to a [`ClauseJudge`]. Implementations may be
//! rule-based, a trained classifier or a language model; the evaluator only sees the
//! [`Judgment`].

use crate::patient::ClinicalFacts;
use crate::MatchResult;
use async_trait::async_trait;

/// Decision on a single exclusion clause.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Judgment {
    /// The patient is clear of the clause; the text explains why.
    Justification(String),
    /// The patient meets the exclusion clause.
    Disqualified,
    /// The judge could not decide. Nothing is recorded for the clause.
    NoOpinion,
}

/// Decides whether a patient is caught by an exclusion clause.
///
/// An `Err` means the judge was unavailable (timeout, transport failure, unusable reply);
/// the evaluator records it as [`Judgment::NoOpinion`], never as cleared.
#[async_trait]
pub trait ClauseJudge: Send + Sync {
    async fn judge(&self, clause: &str, facts: ClinicalFacts<'_>) -> MatchResult<Judgment>;
}

/// Judge that never forms an opinion.
#[derive(Clone, Copy, Debug, Default)]
pub struct AbstainingJudge;

#[async_trait]
impl ClauseJudge for AbstainingJudge {
    async fn judge(&self, _clause: &str, _facts: ClinicalFacts<'_>) -> MatchResult<Judgment> {
        Ok(Judgment::NoOpinion)
    }
}

/// Rule-based judge that screens clauses for the patient's recorded history.
///
/// A clause that names (case-insensitively, on word boundaries) any of the patient's
/// conditions, findings or medications disqualifies. Any other clause is cleared with a
/// justification naming the clause. Negated clauses ("patients without ...") are not
/// recognised.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeywordJudge;

impl KeywordJudge {
    /// First recorded name mentioned by `clause`, if any.
    pub fn first_mention<'a>(clause: &str, facts: &ClinicalFacts<'a>) -> Option<&'a str> {
        let haystack = clause.to_lowercase();
        facts
            .all_names()
            .find(|name| mentions(&haystack, &name.to_lowercase()))
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric()
}

/// `true` when `needle` occurs in `haystack` with no word character on either side.
fn mentions(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(start, _)| {
        let end = start + needle.len();
        let before_ok = haystack[..start].chars().next_back().is_none_or(|c| !is_word_char(c));
        let after_ok = haystack[end..].chars().next().is_none_or(|c| !is_word_char(c));
        before_ok && after_ok
    })
}

#[async_trait]
impl ClauseJudge for KeywordJudge {
    async fn judge(&self, clause: &str, facts: ClinicalFacts<'_>) -> MatchResult<Judgment> {
        match Self::first_mention(clause, &facts) {
            Some(name) => {
                tracing::debug!(clause, mentioned = name, "clause names patient history");
                Ok(Judgment::Disqualified)
            }
            None => Ok(Judgment::Justification(format!(
                "Patient has no recorded condition, finding or medication named in the exclusion criterion \"{clause}\""
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn mentions_respects_word_boundaries() {
        assert!(mentions("history of asthma.", "asthma"));
        assert!(mentions("asthma", "asthma"));
        assert!(!mentions("chemotherapy", "therapy"));
        assert!(!mentions("anything", ""));
    }

    #[test]
    fn first_mention_searches_conditions_then_findings_then_medications() {
        let conditions = set(&["Asthma"]);
        let findings = set(&["Smoker"]);
        let meds = set(&["Warfarin"]);
        let facts = ClinicalFacts {
            conditions: &conditions,
            findings: &findings,
            medications: &meds,
        };
        assert_eq!(
            KeywordJudge::first_mention("Warfarin users or smokers with asthma", &facts),
            Some("Asthma")
        );
        assert_eq!(
            KeywordJudge::first_mention("Current WARFARIN therapy", &facts),
            Some("Warfarin")
        );
        assert_eq!(KeywordJudge::first_mention("Pregnancy", &facts), None);
    }

    #[tokio::test]
    async fn keyword_judge_disqualifies_on_named_condition() {
        let conditions = set(&["Hypertension"]);
        let empty = BTreeSet::new();
        let facts = ClinicalFacts {
            conditions: &conditions,
            findings: &empty,
            medications: &empty,
        };
        let judgment = KeywordJudge
            .judge("Uncontrolled hypertension", facts)
            .await
            .unwrap();
        assert_eq!(judgment, Judgment::Disqualified);
    }

    #[tokio::test]
    async fn keyword_judge_clears_unrelated_clause() {
        let meds = set(&["Metformin"]);
        let empty = BTreeSet::new();
        let facts = ClinicalFacts {
            conditions: &empty,
            findings: &empty,
            medications: &meds,
        };
        let judgment = KeywordJudge.judge("Pregnancy", facts).await.unwrap();
        match judgment {
            Judgment::Justification(text) => assert!(text.contains("\"Pregnancy\"")),
            other => panic!("expected justification, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn abstaining_judge_has_no_opinion() {
        let empty = BTreeSet::new();
        let facts = ClinicalFacts {
            conditions: &empty,
            findings: &empty,
            medications: &empty,
        };
        assert_eq!(
            AbstainingJudge.judge("anything", facts).await.unwrap(),
            Judgment::NoOpinion
        );
    }
}
