//! Deterministic evaluation of a trial's structured age and sex rules.
//!
//! Rules are evaluated age first, then sex. The first failing rule disqualifies the trial
//! and no further rules are considered.

use crate::constants::AGE_KEYWORD;
use crate::duration::AgeBound;
use crate::eligibility::{Disqualification, Verdict};
use trialmatch_types::{Sex, SexEligibility};

pub const ACCEPTS_ALL_AGES: &str = "Study accepts all ages";
pub const ACCEPTS_ALL_GENDERS: &str = "Study accepts all genders";
pub const GENDER_MATCHES: &str = "Patient's gender matches the study's gender";

/// Outcome of the age rule alone.
#[derive(Debug, PartialEq)]
enum AgeRule {
    /// The rule does not apply to this trial.
    Skipped,
    Satisfied(String),
    Failed,
}

/// Whole years of age used in justification text.
fn whole_years(age: f64) -> u64 {
    age.trunc() as u64
}

fn evaluate_age(patient_age: f64, min: AgeBound, max: AgeBound, inclusion: &str) -> AgeRule {
    if min.is_unbounded() && max.is_unbounded() {
        return AgeRule::Satisfied(ACCEPTS_ALL_AGES.to_string());
    }
    if !inclusion.contains(AGE_KEYWORD) {
        return AgeRule::Skipped;
    }

    let infant = patient_age <= 1.0;
    let years = whole_years(patient_age);

    match (min.years(), max.years()) {
        (Some(lo), Some(hi)) => {
            if patient_age < lo || patient_age > hi {
                return AgeRule::Failed;
            }
            if infant {
                AgeRule::Satisfied(
                    "Patient's age is at or below 1 year but is within the study's age range"
                        .to_string(),
                )
            } else {
                AgeRule::Satisfied(format!(
                    "Patient's age of {years} years old is within the study's age range of {lo} years and {hi} years"
                ))
            }
        }
        (Some(lo), None) => {
            if patient_age < lo {
                return AgeRule::Failed;
            }
            if infant {
                AgeRule::Satisfied(format!(
                    "Patient's age is at or below 1 year but meets the study's minimum age requirement of {lo} years."
                ))
            } else {
                AgeRule::Satisfied(format!(
                    "Patient's age of {years} years is above study's minimum age requirement of {lo} years."
                ))
            }
        }
        (None, Some(hi)) => {
            if patient_age > hi {
                return AgeRule::Failed;
            }
            if infant {
                AgeRule::Satisfied(format!(
                    "Patient's age is at or below 1 year but is within the study's maximum age requirement of {hi} years."
                ))
            } else {
                AgeRule::Satisfied(format!(
                    "Patient's age of {years} years is below study's maximum age requirement of {hi} years."
                ))
            }
        }
        // Both unbounded was handled above.
        (None, None) => AgeRule::Satisfied(ACCEPTS_ALL_AGES.to_string()),
    }
}

/// Evaluates the age rule and then the sex rule.
///
/// The age rule applies when both bounds are unbounded (it passes with
/// [`ACCEPTS_ALL_AGES`]) or when the inclusion section mentions `age` and at least one
/// bound is finite. Bounds are inclusive.
///
/// # Returns
///
/// `Verdict::Passed` with the age justification (if the rule applied) followed by the sex
/// justification, or `Verdict::Disqualified` naming the first failing rule.
pub fn evaluate_structured(
    patient_age: f64,
    patient_sex: Sex,
    min_age: AgeBound,
    max_age: AgeBound,
    sex_requirement: SexEligibility,
    inclusion: &str,
) -> Verdict {
    let mut justifications = Vec::with_capacity(2);

    match evaluate_age(patient_age, min_age, max_age, inclusion) {
        AgeRule::Skipped => {}
        AgeRule::Satisfied(text) => justifications.push(text),
        AgeRule::Failed => return Verdict::Disqualified(Disqualification::AgeOutOfRange),
    }

    match sex_requirement {
        SexEligibility::All => justifications.push(ACCEPTS_ALL_GENDERS.to_string()),
        required if required.admits(patient_sex) => {
            justifications.push(GENDER_MATCHES.to_string())
        }
        _ => return Verdict::Disqualified(Disqualification::SexMismatch),
    }

    Verdict::Passed(justifications)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WITH_AGE: &str = "Inclusion Criteria:\n* Adults aged 18 to 65\n";

    fn years(y: f64) -> AgeBound {
        AgeBound::Years(y)
    }

    #[test]
    fn adult_within_range_gets_age_and_gender_justifications() {
        let verdict = evaluate_structured(
            45.0,
            Sex::Female,
            years(18.0),
            years(65.0),
            SexEligibility::All,
            WITH_AGE,
        );
        assert_eq!(
            verdict,
            Verdict::Passed(vec![
                "Patient's age of 45 years old is within the study's age range of 18 years and 65 years".into(),
                ACCEPTS_ALL_GENDERS.into(),
            ])
        );
    }

    #[test]
    fn bounds_are_inclusive() {
        for age in [18.0, 65.0] {
            let verdict = evaluate_structured(
                age,
                Sex::Male,
                years(18.0),
                years(65.0),
                SexEligibility::All,
                WITH_AGE,
            );
            assert!(verdict.is_passed(), "age {age}");
        }
        let verdict = evaluate_structured(
            17.99,
            Sex::Male,
            years(18.0),
            years(65.0),
            SexEligibility::All,
            WITH_AGE,
        );
        assert_eq!(verdict, Verdict::Disqualified(Disqualification::AgeOutOfRange));
    }

    #[test]
    fn infant_within_range_uses_infant_phrasing() {
        let verdict = evaluate_structured(
            0.5,
            Sex::Female,
            years(0.08),
            years(2.0),
            SexEligibility::All,
            "Inclusion Criteria: infants aged 1 month to 2 years",
        );
        let Verdict::Passed(j) = verdict else {
            panic!("expected pass");
        };
        assert_eq!(
            j[0],
            "Patient's age is at or below 1 year but is within the study's age range"
        );
    }

    #[test]
    fn infant_above_minimum_only_uses_infant_phrasing() {
        let verdict = evaluate_structured(
            0.5,
            Sex::Female,
            years(0.25),
            AgeBound::Unbounded,
            SexEligibility::All,
            "Inclusion Criteria: infants of age 3 months or older",
        );
        assert_eq!(
            verdict,
            Verdict::Passed(vec![
                "Patient's age is at or below 1 year but meets the study's minimum age requirement of 0.25 years.".into(),
                ACCEPTS_ALL_GENDERS.into(),
            ])
        );
    }

    #[test]
    fn infant_below_maximum_only_uses_infant_phrasing() {
        let verdict = evaluate_structured(
            1.0,
            Sex::Male,
            AgeBound::Unbounded,
            years(2.0),
            SexEligibility::Male,
            "Inclusion Criteria: age under 2 years",
        );
        assert_eq!(
            verdict,
            Verdict::Passed(vec![
                "Patient's age is at or below 1 year but is within the study's maximum age requirement of 2 years.".into(),
                GENDER_MATCHES.into(),
            ])
        );
    }

    #[test]
    fn infant_below_minimum_is_disqualified() {
        let verdict = evaluate_structured(
            0.5,
            Sex::Male,
            years(1.0),
            AgeBound::Unbounded,
            SexEligibility::All,
            "Inclusion Criteria: age over one",
        );
        assert_eq!(verdict, Verdict::Disqualified(Disqualification::AgeOutOfRange));
    }

    #[test]
    fn open_ended_ranges() {
        let Verdict::Passed(j) = evaluate_structured(
            30.4,
            Sex::Male,
            years(18.0),
            AgeBound::Unbounded,
            SexEligibility::All,
            WITH_AGE,
        ) else {
            panic!("expected pass");
        };
        assert_eq!(
            j[0],
            "Patient's age of 30 years is above study's minimum age requirement of 18 years."
        );

        let Verdict::Passed(j) = evaluate_structured(
            10.0,
            Sex::Male,
            AgeBound::Unbounded,
            years(17.0),
            SexEligibility::All,
            WITH_AGE,
        ) else {
            panic!("expected pass");
        };
        assert_eq!(
            j[0],
            "Patient's age of 10 years is below study's maximum age requirement of 17 years."
        );

        let verdict = evaluate_structured(
            18.0,
            Sex::Male,
            AgeBound::Unbounded,
            years(17.0),
            SexEligibility::All,
            WITH_AGE,
        );
        assert!(!verdict.is_passed());
    }

    #[test]
    fn fully_unbounded_accepts_any_age_regardless_of_text() {
        for age in [0.0, 0.9, 40.0, 120.0] {
            let Verdict::Passed(j) = evaluate_structured(
                age,
                Sex::Female,
                AgeBound::Unbounded,
                AgeBound::Unbounded,
                SexEligibility::All,
                "",
            ) else {
                panic!("expected pass");
            };
            assert_eq!(j[0], ACCEPTS_ALL_AGES);
        }
    }

    #[test]
    fn age_rule_skipped_without_keyword() {
        let verdict = evaluate_structured(
            90.0,
            Sex::Female,
            years(18.0),
            years(65.0),
            SexEligibility::All,
            "Inclusion Criteria:\n* Diagnosed with asthma",
        );
        assert_eq!(verdict, Verdict::Passed(vec![ACCEPTS_ALL_GENDERS.into()]));
    }

    #[test]
    fn sex_rule() {
        let matching = evaluate_structured(
            40.0,
            Sex::Female,
            AgeBound::Unbounded,
            AgeBound::Unbounded,
            SexEligibility::Female,
            "",
        );
        assert_eq!(
            matching,
            Verdict::Passed(vec![ACCEPTS_ALL_AGES.into(), GENDER_MATCHES.into()])
        );

        let mismatch = evaluate_structured(
            40.0,
            Sex::Male,
            AgeBound::Unbounded,
            AgeBound::Unbounded,
            SexEligibility::Female,
            "",
        );
        assert_eq!(mismatch, Verdict::Disqualified(Disqualification::SexMismatch));
    }

    #[test]
    fn evaluation_is_repeatable() {
        let run = || {
            evaluate_structured(
                45.0,
                Sex::Female,
                years(18.0),
                years(65.0),
                SexEligibility::Female,
                WITH_AGE,
            )
        };
        assert_eq!(run(), run());
    }
}
