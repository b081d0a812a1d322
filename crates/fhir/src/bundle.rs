//! FHIR `Bundle` wire models and patient-attribute extraction.
//!
//! Responsibilities:
//! - Define a lenient wire model for the resource kinds matching cares about
//! - Translate the wire model into a flat [`BundlePatient`]
//! - Enforce the fields without which a patient cannot be matched (id, sex, birth date)
//!
//! Notes:
//! - Conditions are coded with a SNOMED semantic tag suffix in `code.text`, for example
//!   `Hypertension (disorder)` or `Body mass index 30+ - obesity (finding)`. The tag decides
//!   whether the entry is a condition or a finding; the tag itself is stripped.
//! - Only `active` + `confirmed` conditions are kept.

use crate::{FhirError, FhirResult};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeSet;
use trialmatch_types::{NonEmptyText, Sex};

const DISORDER_TAG: &str = "(disorder)";
const FINDING_TAG: &str = "(finding)";
const ACTIVE_STATUS: &str = "active";
const CONFIRMED_STATUS: &str = "confirmed";

// ============================================================================
// Public domain-level types
// ============================================================================

/// Flat carrier for the attributes extracted from one patient bundle.
///
/// Name collections are deduplicated on the trimmed name (exact case) and iterate in
/// lexicographic order.
#[derive(Clone, Debug, PartialEq)]
pub struct BundlePatient {
    pub id: NonEmptyText,
    pub sex: Sex,
    pub birth_date: NaiveDate,
    pub conditions: BTreeSet<String>,
    pub findings: BTreeSet<String>,
    pub medications: BTreeSet<String>,
}

impl BundlePatient {
    /// Age in fractional years on `today`: whole days elapsed divided by 365, rounded to
    /// two decimal places.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::InvalidBirthDate`] if the birth date is after `today`.
    pub fn age_on(&self, today: NaiveDate) -> FhirResult<f64> {
        let days = (today - self.birth_date).num_days();
        if days < 0 {
            return Err(FhirError::InvalidBirthDate(format!(
                "{} is after {}",
                self.birth_date, today
            )));
        }
        Ok((days as f64 / 365.0 * 100.0).round() / 100.0)
    }
}

/// Bundle operations.
///
/// Zero-sized namespace for bundle parsing.
pub struct Bundle;

impl Bundle {
    /// Parse a FHIR `Bundle` JSON document and extract the patient attributes.
    ///
    /// This uses `serde_path_to_error` to surface the path of the failing field when a
    /// resource of interest does not match the wire schema.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if:
    /// - the JSON is malformed or a Patient/Condition/Medication resource has unexpected types,
    /// - `resourceType` is not `Bundle`,
    /// - the bundle has no Patient resource, or the patient lacks an id, gender or birth date,
    /// - the gender or birth date cannot be parsed.
    pub fn parse(json_text: &str) -> FhirResult<BundlePatient> {
        let mut deserializer = serde_json::Deserializer::from_str(json_text);

        let wire = match serde_path_to_error::deserialize::<_, BundleWire>(&mut deserializer) {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() || path == "." {
                    "<root>"
                } else {
                    path.as_str()
                };
                return Err(FhirError::InvalidJson(format!(
                    "Bundle schema mismatch at {path}: {source}"
                )));
            }
        };

        if wire.resource_type != "Bundle" {
            return Err(FhirError::InvalidInput(format!(
                "Expected resourceType 'Bundle', got '{}'",
                wire.resource_type
            )));
        }

        wire_to_domain(wire)
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Debug, Deserialize)]
struct BundleWire {
    #[serde(rename = "resourceType")]
    resource_type: String,

    #[serde(default)]
    entry: Vec<EntryWire>,
}

#[derive(Debug, Deserialize)]
struct EntryWire {
    resource: Option<ResourceWire>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "resourceType")]
enum ResourceWire {
    Patient(PatientWire),
    Condition(ConditionWire),
    Medication(MedicationWire),
    MedicationRequest(MedicationRequestWire),
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PatientWire {
    id: Option<String>,
    gender: Option<String>,
    birth_date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConditionWire {
    code: Option<CodeableConceptWire>,
    clinical_status: Option<CodeableConceptWire>,
    verification_status: Option<CodeableConceptWire>,
}

#[derive(Debug, Deserialize)]
struct MedicationWire {
    code: Option<CodeableConceptWire>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MedicationRequestWire {
    medication_codeable_concept: Option<CodeableConceptWire>,
}

#[derive(Debug, Deserialize)]
struct CodeableConceptWire {
    #[serde(default)]
    coding: Vec<CodingWire>,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CodingWire {
    code: Option<String>,
}

impl CodeableConceptWire {
    fn first_code(&self) -> Option<&str> {
        self.coding.first().and_then(|c| c.code.as_deref())
    }

    fn text(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

/// Classification of a condition's `code.text` by its semantic tag.
#[derive(Debug, PartialEq, Eq)]
enum Diagnosis<'a> {
    Condition(&'a str),
    Finding(&'a str),
}

fn classify_diagnosis(text: &str) -> Option<Diagnosis<'_>> {
    if let Some(name) = text.strip_suffix(DISORDER_TAG) {
        return non_blank(name).map(Diagnosis::Condition);
    }
    if let Some(name) = text.strip_suffix(FINDING_TAG) {
        return non_blank(name).map(Diagnosis::Finding);
    }
    None
}

fn non_blank(name: &str) -> Option<&str> {
    let name = name.trim();
    (!name.is_empty()).then_some(name)
}

fn is_active_and_confirmed(condition: &ConditionWire) -> bool {
    let active = condition
        .clinical_status
        .as_ref()
        .and_then(CodeableConceptWire::first_code)
        == Some(ACTIVE_STATUS);
    let confirmed = condition
        .verification_status
        .as_ref()
        .and_then(CodeableConceptWire::first_code)
        == Some(CONFIRMED_STATUS);
    active && confirmed
}

fn parse_birth_date(raw: &str) -> FhirResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| FhirError::InvalidBirthDate(format!("{raw}: {e}")))
}

fn wire_to_domain(wire: BundleWire) -> FhirResult<BundlePatient> {
    let mut patient: Option<PatientWire> = None;
    let mut conditions = BTreeSet::new();
    let mut findings = BTreeSet::new();
    let mut medications = BTreeSet::new();

    for resource in wire.entry.into_iter().filter_map(|e| e.resource) {
        match resource {
            ResourceWire::Patient(p) => {
                if patient.is_none() {
                    patient = Some(p);
                }
            }
            ResourceWire::Condition(c) => {
                if !is_active_and_confirmed(&c) {
                    continue;
                }
                match c.code.as_ref().and_then(CodeableConceptWire::text).and_then(classify_diagnosis) {
                    Some(Diagnosis::Condition(name)) => {
                        conditions.insert(name.to_string());
                    }
                    Some(Diagnosis::Finding(name)) => {
                        findings.insert(name.to_string());
                    }
                    None => {}
                }
            }
            ResourceWire::Medication(m) => {
                if let Some(name) = m.code.as_ref().and_then(CodeableConceptWire::text) {
                    medications.insert(name.to_string());
                }
            }
            ResourceWire::MedicationRequest(r) => {
                if let Some(name) = r
                    .medication_codeable_concept
                    .as_ref()
                    .and_then(CodeableConceptWire::text)
                {
                    medications.insert(name.to_string());
                }
            }
            ResourceWire::Other => {}
        }
    }

    let patient = patient.ok_or(FhirError::MissingField("Patient"))?;

    let id = patient
        .id
        .as_deref()
        .and_then(|id| NonEmptyText::new(id).ok())
        .ok_or(FhirError::MissingField("Patient.id"))?;

    let sex = patient
        .gender
        .as_deref()
        .ok_or(FhirError::MissingField("Patient.gender"))?
        .parse::<Sex>()
        .map_err(|e| FhirError::InvalidInput(e.to_string()))?;

    let birth_date = parse_birth_date(
        patient
            .birth_date
            .as_deref()
            .ok_or(FhirError::MissingField("Patient.birthDate"))?,
    )?;

    tracing::debug!(
        patient_id = %id,
        conditions = conditions.len(),
        findings = findings.len(),
        medications = medications.len(),
        "extracted patient attributes from bundle"
    );

    Ok(BundlePatient {
        id,
        sex,
        birth_date,
        conditions,
        findings,
        medications,
    })
}
