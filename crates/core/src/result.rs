//! Matching output records.

use serde::{Deserialize, Serialize};

/// A trial the patient is eligible for, with the rules and clauses it satisfied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityResult {
    pub trial_id: String,
    pub trial_name: String,
    /// Age rule, then sex rule, then each exclusion clause in source order.
    pub eligibility_criteria_meet: Vec<String>,
}

/// Every eligible trial found for one patient.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingSummary {
    pub patient_id: String,
    pub eligible_trials: Vec<EligibilityResult>,
}

impl MatchingSummary {
    pub fn new(patient_id: impl Into<String>) -> Self {
        Self {
            patient_id: patient_id.into(),
            eligible_trials: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.eligible_trials.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialises_with_wire_field_names() {
        let summary = MatchingSummary {
            patient_id: "p1".into(),
            eligible_trials: vec![EligibilityResult {
                trial_id: "NCT01234567".into(),
                trial_name: "A study".into(),
                eligibility_criteria_meet: vec!["Study accepts all genders".into()],
            }],
        };
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "patientId": "p1",
                "eligibleTrials": [{
                    "trialId": "NCT01234567",
                    "trialName": "A study",
                    "eligibilityCriteriaMeet": ["Study accepts all genders"]
                }]
            })
        );
    }
}
