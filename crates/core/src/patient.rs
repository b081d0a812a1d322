//! Patient profile used as matching input.
//!
//! A profile is built once per patient record and is read-only for the rest of matching.

use crate::{MatchError, MatchResult};
use chrono::NaiveDate;
use fhir::{Bundle, BundlePatient};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use trialmatch_types::{NonEmptyText, Sex};

/// Structured patient attributes consumed by the eligibility evaluators.
///
/// Condition, finding and medication names are deduplicated on their trimmed text
/// (exact case) and iterate in lexicographic order, so every derived output is
/// deterministic.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "PatientProfileWire")]
pub struct PatientProfile {
    patient_id: NonEmptyText,
    age: f64,
    sex: Sex,
    conditions: BTreeSet<String>,
    findings: BTreeSet<String>,
    medications: BTreeSet<String>,
}

/// Borrowed view of a patient's clinical history, handed to clause judges.
#[derive(Clone, Copy, Debug)]
pub struct ClinicalFacts<'a> {
    pub conditions: &'a BTreeSet<String>,
    pub findings: &'a BTreeSet<String>,
    pub medications: &'a BTreeSet<String>,
}

impl<'a> ClinicalFacts<'a> {
    /// Every condition, finding and medication name, in that order.
    pub fn all_names(&self) -> impl Iterator<Item = &'a str> + 'a {
        let Self {
            conditions,
            findings,
            medications,
        } = *self;
        conditions
            .iter()
            .chain(findings)
            .chain(medications)
            .map(String::as_str)
    }
}

fn dedup_names(names: impl IntoIterator<Item = String>) -> BTreeSet<String> {
    names
        .into_iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect()
}

impl PatientProfile {
    /// Creates a validated profile.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::InvalidInput`] if `age` is negative or not finite.
    pub fn new(
        patient_id: NonEmptyText,
        age: f64,
        sex: Sex,
        conditions: impl IntoIterator<Item = String>,
        findings: impl IntoIterator<Item = String>,
        medications: impl IntoIterator<Item = String>,
    ) -> MatchResult<Self> {
        if !age.is_finite() || age < 0.0 {
            return Err(MatchError::InvalidInput(format!(
                "patient age must be a non-negative number of years, got {age}"
            )));
        }

        Ok(Self {
            patient_id,
            age,
            sex,
            conditions: dedup_names(conditions),
            findings: dedup_names(findings),
            medications: dedup_names(medications),
        })
    }

    /// Builds a profile from attributes extracted from a FHIR bundle, computing the age on
    /// `today`.
    pub fn from_bundle(patient: BundlePatient, today: NaiveDate) -> MatchResult<Self> {
        let age = patient.age_on(today)?;
        Self::new(
            patient.id,
            age,
            patient.sex,
            patient.conditions,
            patient.findings,
            patient.medications,
        )
    }

    /// Parses a FHIR bundle JSON document and builds the profile.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::Fhir`] if the bundle is malformed or lacks the patient's id,
    /// gender or birth date.
    pub fn from_bundle_json(json_text: &str, today: NaiveDate) -> MatchResult<Self> {
        Self::from_bundle(Bundle::parse(json_text)?, today)
    }

    pub fn patient_id(&self) -> &NonEmptyText {
        &self.patient_id
    }

    /// Age in fractional years.
    pub fn age(&self) -> f64 {
        self.age
    }

    pub fn sex(&self) -> Sex {
        self.sex
    }

    pub fn conditions(&self) -> &BTreeSet<String> {
        &self.conditions
    }

    pub fn findings(&self) -> &BTreeSet<String> {
        &self.findings
    }

    pub fn medications(&self) -> &BTreeSet<String> {
        &self.medications
    }

    pub fn facts(&self) -> ClinicalFacts<'_> {
        ClinicalFacts {
            conditions: &self.conditions,
            findings: &self.findings,
            medications: &self.medications,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PatientProfileWire {
    patient_id: NonEmptyText,
    age: f64,
    sex: Sex,
    #[serde(default)]
    conditions: Vec<String>,
    #[serde(default)]
    findings: Vec<String>,
    #[serde(default)]
    medications: Vec<String>,
}

impl TryFrom<PatientProfileWire> for PatientProfile {
    type Error = MatchError;

    fn try_from(wire: PatientProfileWire) -> Result<Self, Self::Error> {
        PatientProfile::new(
            wire.patient_id,
            wire.age,
            wire.sex,
            wire.conditions,
            wire.findings,
            wire.medications,
        )
    }
}
