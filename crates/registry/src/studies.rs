//! ClinicalTrials.gov v2 `studies` response decoding.

use crate::error::RegistryResult;
use serde::Deserialize;
use trialmatch_core::TrialRecord;
use trialmatch_types::{NonEmptyText, SexEligibility};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StudiesPage {
    #[serde(default)]
    studies: Vec<StudyWire>,
    #[serde(default)]
    total_count: Option<u64>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StudyWire {
    #[serde(default)]
    protocol_section: ProtocolSectionWire,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProtocolSectionWire {
    #[serde(default)]
    identification_module: IdentificationWire,
    #[serde(default)]
    eligibility_module: EligibilityWire,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentificationWire {
    nct_id: Option<String>,
    brief_title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EligibilityWire {
    sex: Option<String>,
    minimum_age: Option<String>,
    maximum_age: Option<String>,
    eligibility_criteria: Option<String>,
}

/// Decodes one page of the `studies` endpoint into trial records, in registry order.
///
/// Studies without an NCT id or with an unrecognised sex requirement are skipped.
/// A missing sex requirement means all sexes are accepted.
pub fn decode_studies(body: &str) -> RegistryResult<Vec<TrialRecord>> {
    let page: StudiesPage = serde_json::from_str(body)?;
    tracing::debug!(
        studies = page.studies.len(),
        total = page.total_count,
        more = page.next_page_token.is_some(),
        "decoded registry page"
    );

    Ok(page.studies.into_iter().filter_map(into_record).collect())
}

fn into_record(study: StudyWire) -> Option<TrialRecord> {
    let ProtocolSectionWire {
        identification_module: ident,
        eligibility_module: elig,
    } = study.protocol_section;

    let Some(trial_id) = ident.nct_id.and_then(|id| NonEmptyText::new(id).ok()) else {
        tracing::warn!("registry study without an NCT id skipped");
        return None;
    };

    let sex = match elig.sex.as_deref() {
        None => SexEligibility::All,
        Some(raw) => match raw.parse::<SexEligibility>() {
            Ok(sex) => sex,
            Err(e) => {
                tracing::warn!(trial_id = %trial_id, error = %e, "unrecognised sex requirement; study skipped");
                return None;
            }
        },
    };

    Some(TrialRecord {
        trial_id,
        title: ident.brief_title.unwrap_or_default(),
        sex,
        minimum_age: elig.minimum_age,
        maximum_age: elig.maximum_age,
        eligibility_criteria: elig.eligibility_criteria.unwrap_or_default(),
    })
}
